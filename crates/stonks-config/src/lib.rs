//! Configuration management.

mod settings;

pub use settings::{AppConfig, AppSettings, CacheConfig, LoggingConfig, PluginMode, PluginsConfig};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Load configuration from an optional file and the environment.
///
/// Environment variables use the `STONKS` prefix and `__` between sections,
/// e.g. `STONKS__CACHE__PATH=/tmp/cache`.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(
            Environment::with_prefix("STONKS")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("plugins.names")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}
