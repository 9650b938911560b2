//! The aggregator.

use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use stonks_core::error::{FetchError, StonksResult};
use stonks_core::traits::{DataSource, FetchOutcome};
use stonks_core::types::{
    DateIndexedTable, KeySet, NestedTable, PluginSelection, RequestSpec, SymbolIdentity,
};
use stonks_data::{detect_gaps, JsonFileStore, SourceRegistry, SourceSettings, TableStore};
use tracing::{debug, error, info, warn};

use crate::report::{Aggregation, FetchReport, SourceOutcome, SourceStatus};

/// Aggregates data for one symbol at a time across the active sources.
///
/// Concurrent calls for the same identity race on the cached table and must
/// be serialized by the caller.
pub struct Stonks {
    sources: Vec<Arc<dyn DataSource>>,
    store: Option<Arc<dyn TableStore>>,
}

impl Stonks {
    /// Built-in sources with default settings, caching under `cache_path` when given.
    pub fn new(cache_path: Option<PathBuf>, selection: &PluginSelection) -> StonksResult<Self> {
        let store = cache_path.map(|path| Arc::new(JsonFileStore::new(path)) as Arc<dyn TableStore>);
        Self::from_registry(
            &SourceRegistry::builtin(),
            &SourceSettings::default(),
            selection,
            store,
        )
    }

    /// Sources built from `registry`; unknown names in `selection` are an error.
    pub fn from_registry(
        registry: &SourceRegistry,
        settings: &SourceSettings,
        selection: &PluginSelection,
        store: Option<Arc<dyn TableStore>>,
    ) -> StonksResult<Self> {
        let sources = registry.build(selection, settings)?;
        Ok(Self::from_sources(sources, store))
    }

    /// Use these sources as-is, ordered by name.
    pub fn from_sources(
        mut sources: Vec<Arc<dyn DataSource>>,
        store: Option<Arc<dyn TableStore>>,
    ) -> Self {
        sources.sort_by(|a, b| a.name().cmp(b.name()));
        Self { sources, store }
    }

    /// Active source names in merge order.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn caching_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Union of every active source's domain.
    pub fn known_keys(&self) -> KeySet {
        self.sources
            .iter()
            .flat_map(|s| s.available_keys().iter().cloned())
            .collect()
    }

    /// Fetch `keys` for `exchange:symbol[.extension]` over `[start, end]`.
    ///
    /// Returns the nested date-string keyed mapping. Source and cache failures
    /// are logged and do not fail the call; see [`Stonks::aggregate`] for the
    /// full report.
    pub async fn get(
        &self,
        keys: impl Into<KeySet>,
        start: NaiveDate,
        end: NaiveDate,
        exchange: &str,
        symbol: &str,
        extension: Option<&str>,
    ) -> StonksResult<NestedTable> {
        let identity = SymbolIdentity::new(exchange, symbol, extension);
        let request = RequestSpec::new(keys, start, end, identity)?;
        Ok(self.aggregate(&request).await?.into_nested())
    }

    /// Run one cache-aware fetch pass for `request`.
    pub async fn aggregate(&self, request: &RequestSpec) -> StonksResult<Aggregation> {
        // Requests built by hand skip the constructor checks
        let request = RequestSpec::new(
            request.keys.clone(),
            request.start,
            request.end,
            request.identity.clone(),
        )?;
        let identity = &request.identity;
        let mut report = FetchReport::default();

        info!(
            "Aggregating [{}] for {} from {} to {}",
            request.keys, identity, request.start, request.end
        );

        let wanted = if request.keys.is_all() {
            self.known_keys()
        } else {
            request.keys.clone()
        };

        let mut table = match &self.store {
            Some(store) => match store.load(identity) {
                Ok(table) => table,
                Err(e) => {
                    warn!("Ignoring unreadable cache for {}: {}", identity, e);
                    report.load_error = Some(e);
                    DateIndexedTable::new()
                }
            },
            None => DateIndexedTable::new(),
        };

        let gaps = if self.store.is_some() {
            detect_gaps(&table, request.start, request.end, &wanted)
        } else {
            wanted
        };

        let mut changed = false;
        if gaps.is_empty() {
            debug!("{} fully cached for [{}]", identity, request.keys);
        } else {
            debug!("Fetching [{}] for {}", gaps, identity);

            let results = self.fetch_all(&gaps, &request).await;
            for (source, result) in results {
                let status = match result {
                    Ok(FetchOutcome::NotApplicable) => SourceStatus::NotApplicable,
                    Ok(FetchOutcome::Table(fetched)) => {
                        let stats = table.merge_from(&fetched);
                        changed |= !stats.is_noop();
                        debug!(
                            "{} supplied {} rows, filled {} cells",
                            source,
                            fetched.len(),
                            stats.cells_filled
                        );
                        SourceStatus::Fetched {
                            rows: fetched.len(),
                            columns: fetched.columns().len(),
                        }
                    }
                    Err(e) => {
                        warn!("Source {} failed for {}: {}", source, identity, e);
                        SourceStatus::Failed(e)
                    }
                };
                report.outcomes.push(SourceOutcome { source, status });
            }
        }

        if changed {
            if let Some(store) = &self.store {
                if let Err(e) = store.save(identity, &table) {
                    error!(
                        "Failed to persist {} to {}: {}",
                        identity,
                        store.location(),
                        e
                    );
                    report.persist_error = Some(e);
                }
            }
        }

        let table = table.restrict(&request.keys, request.start, request.end);
        info!(
            "Returning {} rows for {} ({} sources fetched)",
            table.len(),
            identity,
            report.fetched()
        );

        Ok(Aggregation {
            table,
            gaps,
            report,
        })
    }

    /// Call every source once, in order, collecting every outcome.
    async fn fetch_all(
        &self,
        gaps: &KeySet,
        request: &RequestSpec,
    ) -> Vec<(String, Result<FetchOutcome, FetchError>)> {
        let mut results = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let result = source
                .fetch(gaps, request.start, request.end, &request.identity)
                .await;
            results.push((source.name().to_string(), result));
        }
        results
    }
}
