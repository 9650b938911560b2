//! Error types for the stonks aggregator.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level aggregator error.
#[derive(Error, Debug)]
pub enum StonksError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Data source not found: {0}")]
    SourceNotFound(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure reported by a single data source for one fetch call.
///
/// A fetch failure never aborts an aggregation; the aggregator records it and
/// moves on to the next source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

/// Cache persistence errors.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed cache file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Cache serialization error: {0}")]
    Serialize(String),
}

impl CacheError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for aggregator operations.
pub type StonksResult<T> = Result<T, StonksError>;
