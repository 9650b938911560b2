//! Data source trait definitions.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::error::FetchError;
use crate::types::{DateIndexedTable, FieldKey, KeySet, SymbolIdentity};

/// Result of a successful fetch call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// None of the requested keys belong to the source.
    NotApplicable,
    /// Whatever the source could supply; may hold fewer keys or dates than asked.
    Table(DateIndexedTable),
}

impl FetchOutcome {
    pub fn is_applicable(&self) -> bool {
        !matches!(self, FetchOutcome::NotApplicable)
    }

    pub fn into_table(self) -> Option<DateIndexedTable> {
        match self {
            FetchOutcome::NotApplicable => None,
            FetchOutcome::Table(table) => Some(table),
        }
    }
}

/// Trait for provider adapters.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Registry name of the source, used for ordering and selection.
    fn name(&self) -> &str;

    /// Every key this source can supply.
    fn available_keys(&self) -> &BTreeSet<FieldKey>;

    /// Requested keys that fall inside this source's domain.
    fn applicable_keys(&self, keys: &KeySet) -> KeySet {
        keys.intersection(self.available_keys())
    }

    /// Fetch `keys` for the inclusive range `[start, end]`.
    ///
    /// # Arguments
    /// * `keys` - Keys wanted by the aggregator
    /// * `start` - First date, inclusive
    /// * `end` - Last date, inclusive
    /// * `identity` - Exchange, symbol and extension
    ///
    /// # Returns
    /// `NotApplicable` without any I/O when no key is in the source's domain,
    /// otherwise a sparse table. Dates the provider has no data for are
    /// omitted.
    async fn fetch(
        &self,
        keys: &KeySet,
        start: NaiveDate,
        end: NaiveDate,
        identity: &SymbolIdentity,
    ) -> Result<FetchOutcome, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PriceOnly {
        keys: BTreeSet<FieldKey>,
    }

    #[async_trait]
    impl DataSource for PriceOnly {
        fn name(&self) -> &str {
            "price_only"
        }

        fn available_keys(&self) -> &BTreeSet<FieldKey> {
            &self.keys
        }

        async fn fetch(
            &self,
            keys: &KeySet,
            start: NaiveDate,
            _end: NaiveDate,
            _identity: &SymbolIdentity,
        ) -> Result<FetchOutcome, FetchError> {
            let wanted = self.applicable_keys(keys);
            if wanted.is_empty() {
                return Ok(FetchOutcome::NotApplicable);
            }
            let mut table = DateIndexedTable::new();
            for key in &wanted {
                table.set(start, key.clone(), 1.0);
            }
            Ok(FetchOutcome::Table(table))
        }
    }

    fn source() -> PriceOnly {
        PriceOnly {
            keys: ["Open", "Close"].iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_out_of_domain_is_not_applicable() {
        let day = NaiveDate::from_ymd_opt(2023, 1, 3).unwrap();
        let id = SymbolIdentity::new("NYSE", "IBM", None);
        let outcome = source()
            .fetch(&KeySet::from("Volume"), day, day, &id)
            .await
            .unwrap();
        assert!(!outcome.is_applicable());
        assert_eq!(outcome.into_table(), None);
    }

    #[tokio::test]
    async fn test_partial_domain_returns_supported_keys() {
        let day = NaiveDate::from_ymd_opt(2023, 1, 3).unwrap();
        let id = SymbolIdentity::new("NYSE", "IBM", None);
        let table = source()
            .fetch(&KeySet::from(["Close", "Volume"]), day, day, &id)
            .await
            .unwrap()
            .into_table()
            .unwrap();
        assert!(table.has_column("Close"));
        assert!(!table.has_column("Volume"));
    }
}
