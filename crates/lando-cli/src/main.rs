//! Lando CLI
//!
//! A thin front end over the configuration, plugin and component core.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let debug = logging::debug_enabled(
        cli.debug,
        std::env::var("LANDO_DEBUG").ok().as_deref(),
        std::env::var("DEBUG").ok().as_deref(),
    );
    logging::init(debug).map_err(|e| CliError::Logging(e.to_string()))?;
    tracing::debug!(command = ?cli.command, "Starting");

    let bootstrap = context::bootstrap(&cli)?;
    match &cli.command {
        Commands::Config { path, store } => {
            commands::run_config(&bootstrap, path.as_deref(), store.as_deref())
        }
        Commands::Plugins => commands::run_plugins(&bootstrap),
        Commands::Registry => commands::run_registry(&bootstrap),
        Commands::Component { id } => commands::run_component(&bootstrap, id),
    }
}
