//! Stonks CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use stonks_config::load_config;
use stonks_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    // Flags override the config file
    let log_level = cli
        .log_level
        .map(|level| level.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let json_logs = cli.json_logs || config.logging.format == "json";
    let _guard = setup_logging(&log_level, json_logs, config.logging.file.as_deref());

    match cli.command {
        Commands::Get(args) => cli::commands::get::run(args, &config).await,
        Commands::Sources => cli::commands::sources::run(&config),
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config, &config),
    }
}
