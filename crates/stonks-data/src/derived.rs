//! Derived "Change" keys.
//!
//! `"<BASE> Change"` on day D is `BASE[D] / BASE[D-1]`, where D-1 is exactly
//! one calendar day earlier. There is no business-day fallback: a Monday
//! change is omitted when the provider has no Sunday row.

use chrono::{Duration, NaiveDate};
use stonks_core::types::{DateIndexedTable, FieldKey, KeySet};

/// Suffix marking a derived change key.
pub const CHANGE_SUFFIX: &str = " Change";

/// Base key of a change key, e.g. "Close" for "Close Change".
pub fn base_key(key: &str) -> Option<&str> {
    key.strip_suffix(CHANGE_SUFFIX).filter(|base| !base.is_empty())
}

/// Change key for a base key, e.g. "Close Change" for "Close".
pub fn change_key(base: &str) -> FieldKey {
    format!("{}{}", base, CHANGE_SUFFIX)
}

/// `keys` plus every base key one of its change keys depends on.
pub fn with_base_keys(keys: &KeySet) -> KeySet {
    let mut expanded = keys.clone();
    for key in keys {
        if let Some(base) = base_key(key) {
            expanded.insert(base);
        }
    }
    expanded
}

/// Compute `change_keys` for every date in `[start, end]`.
///
/// A cell is written only when the base value exists for both D and D-1 and
/// the previous value is non-zero. The change column is added even when no
/// cell could be computed.
pub fn append_changes(
    table: &mut DateIndexedTable,
    change_keys: &KeySet,
    start: NaiveDate,
    end: NaiveDate,
) {
    for key in change_keys {
        let Some(base) = base_key(key) else {
            continue;
        };
        table.add_column(key.clone());

        let mut computed = Vec::new();
        for date in start.iter_days().take_while(|d| *d <= end) {
            let Some(prev_date) = date.checked_sub_signed(Duration::days(1)) else {
                continue;
            };
            let (Some(value), Some(prev)) = (table.get(date, base), table.get(prev_date, base))
            else {
                continue;
            };
            if prev != 0.0 {
                computed.push((date, value / prev));
            }
        }

        for (date, ratio) in computed {
            table.set(date, key.clone(), ratio);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, month, day).unwrap()
    }

    #[test]
    fn test_base_key() {
        assert_eq!(base_key("Close Change"), Some("Close"));
        assert_eq!(base_key("Stock Splits"), None);
        assert_eq!(base_key(" Change"), None);
        assert_eq!(change_key("Volume"), "Volume Change");
    }

    #[test]
    fn test_with_base_keys() {
        let keys = with_base_keys(&KeySet::from(["Close Change", "Open"]));
        assert_eq!(keys, KeySet::from(["Close", "Close Change", "Open"]));
    }

    #[test]
    fn test_change_is_ratio_to_previous_day() {
        let mut t = DateIndexedTable::new();
        t.set(d(1, 3), "Close", 100.0);
        t.set(d(1, 4), "Close", 110.0);

        append_changes(&mut t, &KeySet::from("Close Change"), d(1, 4), d(1, 4));

        let change = t.get(d(1, 4), "Close Change").unwrap();
        assert!((change - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_monday_change_omitted_across_weekend() {
        // 2023-01-06 is a Friday, 2023-01-09 a Monday
        let mut t = DateIndexedTable::new();
        t.set(d(1, 6), "Close", 100.0);
        t.set(d(1, 9), "Close", 105.0);
        t.set(d(1, 10), "Close", 84.0);

        append_changes(&mut t, &KeySet::from("Close Change"), d(1, 9), d(1, 10));

        assert_eq!(t.get(d(1, 9), "Close Change"), None);
        let tuesday = t.get(d(1, 10), "Close Change").unwrap();
        assert!((tuesday - 0.8).abs() < 1e-12);
        assert!(t.has_column("Close Change"));
    }

    #[test]
    fn test_change_starts_at_range_start() {
        let mut t = DateIndexedTable::new();
        t.set(d(1, 2), "Open", 1.0);
        t.set(d(1, 3), "Open", 2.0);
        t.set(d(1, 4), "Open", 4.0);

        append_changes(&mut t, &KeySet::from("Open Change"), d(1, 4), d(1, 4));

        assert_eq!(t.get(d(1, 3), "Open Change"), None);
        assert_eq!(t.get(d(1, 4), "Open Change"), Some(2.0));
    }

    #[test]
    fn test_zero_previous_value_omitted() {
        let mut t = DateIndexedTable::new();
        t.set(d(1, 3), "Volume", 0.0);
        t.set(d(1, 4), "Volume", 10.0);

        append_changes(&mut t, &KeySet::from("Volume Change"), d(1, 4), d(1, 4));

        assert_eq!(t.get(d(1, 4), "Volume Change"), None);
    }
}
