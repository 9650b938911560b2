//! Date-indexed tables and the first-non-null-wins merge.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{FieldKey, KeySet};

/// Externally visible table shape: ISO date string -> key -> value or null.
pub type NestedTable = BTreeMap<String, BTreeMap<FieldKey, Option<f64>>>;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A sparse table of numeric cells indexed by calendar date.
///
/// Every row shares the same column set; a cell missing from a row is null.
/// Non-finite values are never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NestedTable", into = "NestedTable")]
pub struct DateIndexedTable {
    columns: BTreeSet<FieldKey>,
    rows: BTreeMap<NaiveDate, BTreeMap<FieldKey, f64>>,
}

/// What a merge changed in the base table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub rows_added: usize,
    pub columns_added: usize,
    pub cells_filled: usize,
}

impl MergeStats {
    /// True when the merge left the base table untouched.
    pub fn is_noop(&self) -> bool {
        self.rows_added == 0 && self.columns_added == 0 && self.cells_filled == 0
    }
}

impl DateIndexedTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of dates in the index.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &BTreeSet<FieldKey> {
        &self.columns
    }

    pub fn has_column(&self, key: &str) -> bool {
        self.columns.contains(key)
    }

    /// Dates in calendar order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.keys().copied()
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.rows.contains_key(&date)
    }

    /// Get a cell, `None` when null.
    pub fn get(&self, date: NaiveDate, key: &str) -> Option<f64> {
        self.rows.get(&date).and_then(|row| row.get(key)).copied()
    }

    /// Add a column without populating any cell.
    pub fn add_column(&mut self, key: impl Into<FieldKey>) -> bool {
        self.columns.insert(key.into())
    }

    /// Add a date to the index without populating any cell.
    pub fn add_date(&mut self, date: NaiveDate) -> bool {
        if self.rows.contains_key(&date) {
            return false;
        }
        self.rows.insert(date, BTreeMap::new());
        true
    }

    /// Set a cell. A non-finite value is stored as null.
    pub fn set(&mut self, date: NaiveDate, key: impl Into<FieldKey>, value: f64) {
        let key = key.into();
        self.columns.insert(key.clone());
        let row = self.rows.entry(date).or_default();
        if value.is_finite() {
            row.insert(key, value);
        } else {
            row.remove(&key);
        }
    }

    /// Whether `key` has a null cell on any indexed date in `[start, end]`.
    ///
    /// An inverted range holds no dates and so no nulls.
    pub fn has_null_in_range(&self, key: &str, start: NaiveDate, end: NaiveDate) -> bool {
        if start > end {
            return false;
        }
        self.rows
            .range(start..=end)
            .any(|(_, row)| !row.contains_key(key))
    }

    /// Merge `incoming` into `self`, filling only cells that are null here.
    ///
    /// Populated cells are never overwritten. Every incoming date joins the
    /// index and the column set becomes the union of both tables.
    pub fn merge_from(&mut self, incoming: &DateIndexedTable) -> MergeStats {
        let mut stats = MergeStats::default();

        for key in &incoming.columns {
            if self.columns.insert(key.clone()) {
                stats.columns_added += 1;
            }
        }

        for (date, incoming_row) in &incoming.rows {
            let row = self.rows.entry(*date).or_insert_with(|| {
                stats.rows_added += 1;
                BTreeMap::new()
            });
            for (key, value) in incoming_row {
                if !row.contains_key(key) {
                    row.insert(key.clone(), *value);
                    stats.cells_filled += 1;
                }
            }
        }

        stats
    }

    /// Restrict to `[start, end]` and to `keys` (all columns when `keys` is empty).
    ///
    /// Requested keys missing from the table come back as all-null columns.
    /// An inverted range yields no rows.
    pub fn restrict(&self, keys: &KeySet, start: NaiveDate, end: NaiveDate) -> DateIndexedTable {
        let columns: BTreeSet<FieldKey> = if keys.is_all() {
            self.columns.clone()
        } else {
            keys.as_set().clone()
        };
        if start > end {
            return DateIndexedTable {
                columns,
                rows: BTreeMap::new(),
            };
        }

        let rows = self
            .rows
            .range(start..=end)
            .map(|(date, row)| {
                let cells = row
                    .iter()
                    .filter(|(key, _)| columns.contains(*key))
                    .map(|(key, value)| (key.clone(), *value))
                    .collect();
                (*date, cells)
            })
            .collect();

        DateIndexedTable { columns, rows }
    }

    /// Convert to the nested response shape, writing every column on every row.
    pub fn to_nested(&self) -> NestedTable {
        self.rows
            .iter()
            .map(|(date, row)| {
                let cells = self
                    .columns
                    .iter()
                    .map(|key| (key.clone(), row.get(key).copied()))
                    .collect();
                (date.format(DATE_FORMAT).to_string(), cells)
            })
            .collect()
    }
}

/// Merge `incoming` into `base` and return the result.
pub fn merge(mut base: DateIndexedTable, incoming: &DateIndexedTable) -> DateIndexedTable {
    base.merge_from(incoming);
    base
}

impl From<DateIndexedTable> for NestedTable {
    fn from(table: DateIndexedTable) -> Self {
        table.to_nested()
    }
}

impl TryFrom<NestedTable> for DateIndexedTable {
    type Error = chrono::ParseError;

    fn try_from(nested: NestedTable) -> Result<Self, Self::Error> {
        let mut table = DateIndexedTable::new();
        for (date, cells) in nested {
            let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)?;
            table.add_date(date);
            for (key, value) in cells {
                match value {
                    Some(value) => table.set(date, key, value),
                    None => {
                        table.add_column(key);
                    }
                }
            }
        }
        Ok(table)
    }
}
