//! Configuration structures.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use stonks_core::error::StonksError;
use stonks_core::types::PluginSelection;
use stonks_data::SourceSettings;

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub plugins: PluginsConfig,
    #[serde(default)]
    pub sources: SourceSettings,
}

impl AppConfig {
    /// Source selection described by the `plugins` section.
    pub fn plugin_selection(&self) -> PluginSelection {
        let names = self.plugins.names.clone();
        match self.plugins.mode {
            PluginMode::All => PluginSelection::All,
            PluginMode::Include => PluginSelection::Include(names),
            PluginMode::Exclude => PluginSelection::Exclude(names),
        }
    }

    /// Cache root, or `None` when caching is disabled.
    pub fn cache_path(&self) -> Option<PathBuf> {
        self.cache.enabled.then(|| self.cache.path.clone())
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> Result<(), StonksError> {
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(StonksError::Config(format!(
                "logging.format must be \"pretty\" or \"json\", got \"{}\"",
                self.logging.format
            )));
        }
        if self.cache.enabled && self.cache.path.as_os_str().is_empty() {
            return Err(StonksError::Config(
                "cache.path must be set when the cache is enabled".to_string(),
            ));
        }
        if self.plugins.mode == PluginMode::Include && self.plugins.names.is_empty() {
            return Err(StonksError::Config(
                "plugins.names must list at least one source in include mode".to_string(),
            ));
        }
        if self.sources.timeout_secs == 0 {
            return Err(StonksError::Config(
                "sources.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, StonksError> {
        toml::to_string_pretty(self).map_err(|e| StonksError::Serialization(e.to_string()))
    }
}

/// General app settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "stonks".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// On-disk cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Root directory; tables live at `path/EXCHANGE/SYMBOL[.EXT]`
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("cache"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginMode {
    #[default]
    All,
    Include,
    Exclude,
}

/// Which registered sources are active.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    pub mode: PluginMode,
    pub names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.plugin_selection(), PluginSelection::All);
        assert_eq!(config.cache_path(), Some(PathBuf::from("cache")));
    }

    #[test]
    fn test_plugin_selection() {
        let mut config = AppConfig::default();
        config.plugins = PluginsConfig {
            mode: PluginMode::Include,
            names: vec!["yahoo_finance".to_string()],
        };

        assert_eq!(
            config.plugin_selection(),
            PluginSelection::Include(vec!["yahoo_finance".to_string()])
        );
    }

    #[test]
    fn test_disabled_cache_has_no_path() {
        let mut config = AppConfig::default();
        config.cache.enabled = false;
        assert_eq!(config.cache_path(), None);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(config.validate(), Err(StonksError::Config(_))));

        let mut config = AppConfig::default();
        config.plugins.mode = PluginMode::Include;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.sources.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let text = config.to_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
