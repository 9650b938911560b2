//! Field keys and key sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Name of a data column, e.g. "Open" or "Monthly Relative Interest".
pub type FieldKey = String;

/// An ordered set of field keys.
///
/// An empty set means "all columns" wherever a request is concerned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeySet(BTreeSet<FieldKey>);

impl KeySet {
    /// Create an empty key set.
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// The "all columns" selection.
    pub fn all() -> Self {
        Self::new()
    }

    /// Whether this set selects every column.
    pub fn is_all(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn insert(&mut self, key: impl Into<FieldKey>) -> bool {
        self.0.insert(key.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldKey> {
        self.0.iter()
    }

    /// Keys present in both `self` and `other`.
    pub fn intersection(&self, other: &BTreeSet<FieldKey>) -> KeySet {
        Self(self.0.intersection(other).cloned().collect())
    }

    /// Keys present in either `self` or `other`.
    pub fn union(&self, other: &KeySet) -> KeySet {
        Self(self.0.union(&other.0).cloned().collect())
    }

    pub fn as_set(&self) -> &BTreeSet<FieldKey> {
        &self.0
    }

    pub fn into_inner(self) -> BTreeSet<FieldKey> {
        self.0
    }
}

impl fmt::Display for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return write!(f, "*");
        }
        let keys: Vec<&str> = self.0.iter().map(String::as_str).collect();
        write!(f, "{}", keys.join(", "))
    }
}

impl From<&str> for KeySet {
    fn from(key: &str) -> Self {
        Self(BTreeSet::from([key.to_string()]))
    }
}

impl From<String> for KeySet {
    fn from(key: String) -> Self {
        Self(BTreeSet::from([key]))
    }
}

impl From<Vec<String>> for KeySet {
    fn from(keys: Vec<String>) -> Self {
        Self(keys.into_iter().collect())
    }
}

impl From<Vec<&str>> for KeySet {
    fn from(keys: Vec<&str>) -> Self {
        keys.into_iter().collect()
    }
}

impl From<&[&str]> for KeySet {
    fn from(keys: &[&str]) -> Self {
        keys.iter().copied().collect()
    }
}

impl<const N: usize> From<[&str; N]> for KeySet {
    fn from(keys: [&str; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl From<BTreeSet<FieldKey>> for KeySet {
    fn from(keys: BTreeSet<FieldKey>) -> Self {
        Self(keys)
    }
}

impl<'a> FromIterator<&'a str> for KeySet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

impl FromIterator<FieldKey> for KeySet {
    fn from_iter<I: IntoIterator<Item = FieldKey>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a KeySet {
    type Item = &'a FieldKey;
    type IntoIter = std::collections::btree_set::Iter<'a, FieldKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_key_normalizes_to_singleton() {
        let keys = KeySet::from("Close");
        assert_eq!(keys.len(), 1);
        assert!(keys.contains("Close"));
        assert!(!keys.is_all());
    }

    #[test]
    fn test_duplicates_collapse() {
        let keys = KeySet::from(vec!["Open", "Close", "Open"]);
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_empty_means_all() {
        let keys = KeySet::from(Vec::<String>::new());
        assert!(keys.is_all());
        assert_eq!(keys.to_string(), "*");
    }

    #[test]
    fn test_intersection() {
        let domain: BTreeSet<FieldKey> = ["Open", "Close"].iter().map(|s| s.to_string()).collect();
        let keys = KeySet::from(["Close", "Volume"]);
        let hit = keys.intersection(&domain);
        assert_eq!(hit, KeySet::from("Close"));
        assert!(KeySet::from("Volume").intersection(&domain).is_empty());
    }
}
