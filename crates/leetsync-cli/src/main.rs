//! leetsync CLI
//!
//! Mirrors accepted LeetCode submissions into a git repository.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;
use leetsync_core::Config;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config = Config::load(cli.config.as_deref(), cli.overrides())?;

    match cli.command {
        Commands::Sync { dry_run } => commands::run_sync(&config, dry_run),
        Commands::Marker => commands::run_marker(&config),
    }
}
