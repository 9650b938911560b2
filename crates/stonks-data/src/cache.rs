//! Per-symbol table persistence and gap detection.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use stonks_core::error::CacheError;
use stonks_core::types::{DateIndexedTable, KeySet, SymbolIdentity};
use tracing::debug;

/// Load/store of one accumulated table per symbol identity.
pub trait TableStore: Send + Sync {
    /// Load the stored table, or an empty table if nothing was stored yet.
    fn load(&self, identity: &SymbolIdentity) -> Result<DateIndexedTable, CacheError>;

    /// Persist the full table, replacing whatever was stored before.
    fn save(&self, identity: &SymbolIdentity, table: &DateIndexedTable) -> Result<(), CacheError>;

    /// Human readable location, for logs.
    fn location(&self) -> String;
}

/// Keys needing a fetch for `[start, end]` given what `table` already holds.
///
/// Any date of the range missing from the index forces the full `keys` set.
/// Otherwise the result is every column (restricted to `keys` unless `keys`
/// is empty) with at least one null in the range. A requested key that is
/// not a column at all counts as entirely null. An inverted range has no
/// gaps.
pub fn detect_gaps(
    table: &DateIndexedTable,
    start: NaiveDate,
    end: NaiveDate,
    keys: &KeySet,
) -> KeySet {
    if start > end {
        return KeySet::new();
    }

    let all_dates_present = start
        .iter_days()
        .take_while(|d| *d <= end)
        .all(|d| table.contains_date(d));

    if !all_dates_present {
        return keys.clone();
    }

    let null_columns = table
        .columns()
        .iter()
        .filter(|key| table.has_null_in_range(key, start, end));

    if keys.is_all() {
        return null_columns.cloned().collect();
    }

    keys.iter()
        .filter(|key| !table.has_column(key) || table.has_null_in_range(key, start, end))
        .cloned()
        .collect()
}

/// JSON files under a cache root, one per identity at `root/EXCHANGE/SYMBOL[.EXT]`.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `root`. Directories are created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `identity`.
    pub fn path_for(&self, identity: &SymbolIdentity) -> PathBuf {
        self.root.join(identity.relative_path())
    }

    fn to_pretty_json(table: &DateIndexedTable) -> Result<Vec<u8>, CacheError> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        table
            .serialize(&mut serializer)
            .map_err(|e| CacheError::Serialize(e.to_string()))?;
        Ok(buffer)
    }
}

impl TableStore for JsonFileStore {
    fn load(&self, identity: &SymbolIdentity) -> Result<DateIndexedTable, CacheError> {
        let path = self.path_for(identity);
        if !path.exists() {
            debug!("No cache file at {}", path.display());
            return Ok(DateIndexedTable::new());
        }

        let json = fs::read_to_string(&path).map_err(|e| CacheError::io(&path, e))?;
        let table: DateIndexedTable =
            serde_json::from_str(&json).map_err(|e| CacheError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?;

        debug!("Loaded {} cached rows from {}", table.len(), path.display());
        Ok(table)
    }

    fn save(&self, identity: &SymbolIdentity, table: &DateIndexedTable) -> Result<(), CacheError> {
        let path = self.path_for(identity);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
        }

        let json = Self::to_pretty_json(table)?;

        // Write beside the target and rename so readers never see a partial file
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json).map_err(|e| CacheError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| CacheError::io(&path, e))?;

        debug!("Saved {} rows to {}", table.len(), path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

/// Simple in-memory table store.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<SymbolIdentity, DateIndexedTable>>,
}

impl MemoryStore {
    /// Create an empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identities stored.
    pub fn len(&self) -> usize {
        self.tables.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear every stored table.
    pub fn clear(&self) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.clear();
        }
    }
}

impl TableStore for MemoryStore {
    fn load(&self, identity: &SymbolIdentity) -> Result<DateIndexedTable, CacheError> {
        let tables = self
            .tables
            .lock()
            .map_err(|e| CacheError::Serialize(e.to_string()))?;
        Ok(tables.get(identity).cloned().unwrap_or_default())
    }

    fn save(&self, identity: &SymbolIdentity, table: &DateIndexedTable) -> Result<(), CacheError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|e| CacheError::Serialize(e.to_string()))?;
        tables.insert(identity.clone(), table.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
