//! Core traits for the aggregator.

mod data_source;

pub use data_source::{DataSource, FetchOutcome};
