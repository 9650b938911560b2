//! Source registry for building the active source list.

use crate::sources::{GoogleTrendsSource, SourceSettings, YahooFinanceSource};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use stonks_core::error::{StonksError, StonksResult};
use stonks_core::traits::DataSource;
use stonks_core::types::{FieldKey, PluginSelection};
use tracing::debug;

/// Builds one source instance from shared settings.
pub type SourceFactory =
    Box<dyn Fn(&SourceSettings) -> StonksResult<Arc<dyn DataSource>> + Send + Sync>;

/// Information about a registered source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Registry name
    pub name: String,
    /// Source description
    pub description: String,
    /// Keys the source can supply
    pub keys: BTreeSet<FieldKey>,
}

struct Entry {
    info: SourceInfo,
    factory: SourceFactory,
}

/// Registry of available data sources, ordered by name.
pub struct SourceRegistry {
    sources: BTreeMap<String, Entry>,
}

impl SourceRegistry {
    /// Registry with every built-in source.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();

        registry.register(
            SourceInfo {
                name: GoogleTrendsSource::NAME.to_string(),
                description: "Relative search interest over 30 and 365 day windows".to_string(),
                keys: GoogleTrendsSource::domain(),
            },
            Box::new(google_trends),
        );

        registry.register(
            SourceInfo {
                name: YahooFinanceSource::NAME.to_string(),
                description: "Daily prices, volume, dividends and splits with day-over-day changes"
                    .to_string(),
                keys: YahooFinanceSource::domain(),
            },
            Box::new(yahoo_finance),
        );

        registry
    }

    /// Registry with no sources.
    pub fn empty() -> Self {
        Self {
            sources: BTreeMap::new(),
        }
    }

    /// Add or replace a source.
    pub fn register(&mut self, info: SourceInfo, factory: SourceFactory) {
        self.sources
            .insert(info.name.clone(), Entry { info, factory });
    }

    /// List all registered sources in name order.
    pub fn list(&self) -> Vec<&SourceInfo> {
        self.sources.values().map(|e| &e.info).collect()
    }

    /// Get source info by name.
    pub fn get(&self, name: &str) -> Option<&SourceInfo> {
        self.sources.get(name).map(|e| &e.info)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Get all source names in order.
    pub fn names(&self) -> Vec<&String> {
        self.sources.keys().collect()
    }

    /// Create a single source instance.
    pub fn create(
        &self,
        name: &str,
        settings: &SourceSettings,
    ) -> StonksResult<Arc<dyn DataSource>> {
        let entry = self
            .sources
            .get(name)
            .ok_or_else(|| StonksError::SourceNotFound(name.to_string()))?;
        (entry.factory)(settings)
    }

    /// Instantiate the sources admitted by `selection`, sorted by name.
    ///
    /// Every name the selection lists must be registered.
    pub fn build(
        &self,
        selection: &PluginSelection,
        settings: &SourceSettings,
    ) -> StonksResult<Vec<Arc<dyn DataSource>>> {
        if let Some(unknown) = selection.names().iter().find(|n| !self.exists(n)) {
            return Err(StonksError::SourceNotFound(unknown.clone()));
        }

        let sources: Vec<Arc<dyn DataSource>> = self
            .sources
            .iter()
            .filter(|(name, _)| selection.admits(name))
            .map(|(_, e)| (e.factory)(settings))
            .collect::<StonksResult<_>>()?;

        debug!(
            "Active sources: [{}]",
            sources
                .iter()
                .map(|s| s.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(sources)
    }
}

fn google_trends(settings: &SourceSettings) -> StonksResult<Arc<dyn DataSource>> {
    Ok(Arc::new(GoogleTrendsSource::new(settings)?))
}

fn yahoo_finance(settings: &SourceSettings) -> StonksResult<Arc<dyn DataSource>> {
    Ok(Arc::new(YahooFinanceSource::new(settings)?))
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
