//! Cache-aware aggregation across data sources.

mod report;
mod stonks;

pub use report::{Aggregation, FetchReport, SourceOutcome, SourceStatus};
pub use stonks::Stonks;
