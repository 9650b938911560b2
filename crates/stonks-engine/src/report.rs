//! Aggregation results and per-source outcomes.

use stonks_core::error::{CacheError, FetchError};
use stonks_core::types::{DateIndexedTable, KeySet, NestedTable};

/// What one source did during a fetch pass.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceStatus {
    /// None of the gap keys belong to the source.
    NotApplicable,
    /// The source returned a table of this size.
    Fetched { rows: usize, columns: usize },
    /// The source failed; its contribution is empty.
    Failed(FetchError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceOutcome {
    pub source: String,
    pub status: SourceStatus,
}

/// Everything that happened besides the returned data.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// One entry per active source, in source order. Empty when nothing was fetched.
    pub outcomes: Vec<SourceOutcome>,
    /// Cache load failure; the cache was treated as empty.
    pub load_error: Option<CacheError>,
    /// Cache save failure; the returned data is still complete.
    pub persist_error: Option<CacheError>,
}

impl FetchReport {
    /// Number of sources that returned data.
    pub fn fetched(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, SourceStatus::Fetched { .. }))
            .count()
    }

    /// Sources that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &FetchError)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            SourceStatus::Failed(e) => Some((o.source.as_str(), e)),
            _ => None,
        })
    }

    /// True when no source failed and the cache behaved.
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
            && self.load_error.is_none()
            && self.persist_error.is_none()
    }
}

/// Response of one aggregation.
#[derive(Debug)]
pub struct Aggregation {
    /// Working table trimmed to the requested keys and range
    pub table: DateIndexedTable,
    /// Keys that were fetched this call
    pub gaps: KeySet,
    pub report: FetchReport,
}

impl Aggregation {
    pub fn into_nested(self) -> NestedTable {
        self.table.to_nested()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let report = FetchReport {
            outcomes: vec![
                SourceOutcome {
                    source: "a".to_string(),
                    status: SourceStatus::Failed(FetchError::Network("refused".to_string())),
                },
                SourceOutcome {
                    source: "b".to_string(),
                    status: SourceStatus::Fetched { rows: 3, columns: 1 },
                },
                SourceOutcome {
                    source: "c".to_string(),
                    status: SourceStatus::NotApplicable,
                },
            ],
            ..FetchReport::default()
        };

        assert_eq!(report.fetched(), 1);
        let failures: Vec<_> = report.failures().map(|(name, _)| name).collect();
        assert_eq!(failures, vec!["a"]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_empty_report_is_clean() {
        assert!(FetchReport::default().is_clean());
    }
}
