//! Data source selection policy.

use serde::{Deserialize, Serialize};

/// Which registered sources an aggregator activates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "names", rename_all = "lowercase")]
pub enum PluginSelection {
    /// Every registered source
    #[default]
    All,
    /// Only the named sources
    Include(Vec<String>),
    /// Every source except the named ones
    Exclude(Vec<String>),
}

impl PluginSelection {
    /// Whether a source with this name is active under the policy.
    pub fn admits(&self, name: &str) -> bool {
        match self {
            PluginSelection::All => true,
            PluginSelection::Include(names) => names.iter().any(|n| n == name),
            PluginSelection::Exclude(names) => !names.iter().any(|n| n == name),
        }
    }

    /// Names the policy refers to explicitly.
    pub fn names(&self) -> &[String] {
        match self {
            PluginSelection::All => &[],
            PluginSelection::Include(names) | PluginSelection::Exclude(names) => names,
        }
    }
}
