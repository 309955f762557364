use std::process;

use clap::Parser;
use log::{error, info};

use pinboard::{App, Cli, Config, Result};

pub fn initialize_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    info!("Application starting up");
    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
    info!("Application shutting down");
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let config = if cli.strict_config {
        Config::load_strict(&config_path)?
    } else {
        Config::load(&config_path)?
    };
    let init_file = cli.init_file.unwrap_or_else(Config::init_file_path);

    let app = App::new(config, init_file, cli.verbose);
    app.run(cli.command).await
}
