//! Core data types for the aggregator.

mod identity;
mod keys;
mod request;
mod selection;
mod table;

pub use identity::SymbolIdentity;
pub use keys::{FieldKey, KeySet};
pub use request::RequestSpec;
pub use selection::PluginSelection;
pub use table::{merge, DateIndexedTable, MergeStats, NestedTable};
