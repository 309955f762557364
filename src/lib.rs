//! Pinboard application library
//!
//! This library provides a board of sticky notes: an id-addressed note
//! collection with undo history, selection and edit-mode state, debounced
//! persistence to a YAML file and a small extension surface for keybindings.

mod api;
mod board;
mod canvas;
mod cli;
mod config;
mod errors;
mod helper;
mod keymap;
mod note;
mod save_scheduler;
mod selection;
mod storage;
mod types;
mod undo;
mod viewport;

// Re-export key components
pub use api::*;
pub use board::*;
pub use canvas::*;
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use helper::*;
pub use keymap::*;
pub use note::*;
pub use save_scheduler::*;
pub use selection::*;
pub use storage::*;
pub use types::*;
pub use undo::*;
pub use viewport::*;
