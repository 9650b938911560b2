//! Aggregation requests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{KeySet, SymbolIdentity};
use crate::error::StonksError;

/// One `get` request: keys over an inclusive date range for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// Requested keys; empty means all columns
    pub keys: KeySet,
    /// First date, inclusive
    pub start: NaiveDate,
    /// Last date, inclusive
    pub end: NaiveDate,
    /// Symbol the request is for
    pub identity: SymbolIdentity,
}

impl RequestSpec {
    /// Create a validated request.
    ///
    /// Fails when `start > end` or the identity cannot name a cache entry.
    pub fn new(
        keys: impl Into<KeySet>,
        start: NaiveDate,
        end: NaiveDate,
        identity: SymbolIdentity,
    ) -> Result<Self, StonksError> {
        if start > end {
            return Err(StonksError::Validation(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        identity.validate()?;

        Ok(Self {
            keys: keys.into(),
            start,
            end,
            identity,
        })
    }

    /// Every calendar date in the range, in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Number of calendar days in the range.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, day).unwrap()
    }

    fn brk() -> SymbolIdentity {
        SymbolIdentity::new("NYSE", "BRK", Some("A"))
    }

    #[test]
    fn test_rejects_inverted_range() {
        let err = RequestSpec::new("Close", d(5), d(3), brk()).unwrap_err();
        assert!(matches!(err, StonksError::Validation(_)));
    }

    #[test]
    fn test_single_day_range() {
        let request = RequestSpec::new("Close", d(3), d(3), brk()).unwrap();
        assert_eq!(request.dates().collect::<Vec<_>>(), vec![d(3)]);
        assert_eq!(request.num_days(), 1);
    }

    #[test]
    fn test_dates_inclusive() {
        let request = RequestSpec::new(vec!["Close"], d(3), d(5), brk()).unwrap();
        assert_eq!(request.dates().collect::<Vec<_>>(), vec![d(3), d(4), d(5)]);
    }

    #[test]
    fn test_rejects_invalid_identity() {
        let bad = SymbolIdentity::new("NYSE", "", None);
        assert!(RequestSpec::new("Close", d(3), d(5), bad).is_err());
    }
}
