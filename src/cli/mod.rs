//! Command-line surface of pinboard: argument parsing, the one-shot
//! subcommands and the interactive session.

mod app;
mod args;
mod session;

pub use app::*;
pub use args::*;
pub use session::*;
