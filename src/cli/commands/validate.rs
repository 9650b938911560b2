//! Validate configuration command.

use anyhow::{Context, Result};
use std::path::Path;
use stonks_config::AppConfig;
use stonks_data::SourceRegistry;

pub fn run(config_path: &Path, config: &AppConfig) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Err(e.into());
    }

    let sources = SourceRegistry::builtin()
        .build(&config.plugin_selection(), &config.sources)
        .context("Invalid plugin selection")?;

    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {}", config.logging.level);
    match config.cache_path() {
        Some(path) => println!("Cache: {}", path.display()),
        None => println!("Cache: disabled"),
    }
    let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
    println!("Active sources: {}", names.join(", "));
    println!();
    println!("{}", config.to_toml()?);

    Ok(())
}
