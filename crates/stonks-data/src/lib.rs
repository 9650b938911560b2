//! Data sources and cache storage for the stonks aggregator.

pub mod cache;
pub mod derived;
pub mod registry;
pub mod sources;

pub use cache::{detect_gaps, JsonFileStore, MemoryStore, TableStore};
pub use registry::{SourceFactory, SourceInfo, SourceRegistry};
pub use sources::{GoogleTrendsSource, SourceSettings, YahooFinanceSource};
