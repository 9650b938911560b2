//! List sources command.

use anyhow::Result;
use stonks_config::AppConfig;
use stonks_data::SourceRegistry;

pub fn run(config: &AppConfig) -> Result<()> {
    let registry = SourceRegistry::builtin();
    let selection = config.plugin_selection();

    println!("Available data sources:");
    println!();

    for info in registry.list() {
        let state = if selection.admits(&info.name) {
            "active"
        } else {
            "disabled"
        };
        println!("  {} ({})", info.name, state);
        println!("    {}", info.description);
        for key in &info.keys {
            println!("      - {}", key);
        }
        println!();
    }

    Ok(())
}
