use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI arguments and command structure
#[derive(Parser)]
#[clap(
    version,
    about = "Sticky notes on an infinite board, stored in a YAML file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Require the configuration file to exist and to name the palette and canvas background
    #[clap(long)]
    pub strict_config: bool,

    /// Path to the init file run when a board is opened
    #[clap(long, value_parser)]
    pub init_file: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the pinboard application
    #[clap(subcommand)]
    pub command: Commands,
}
