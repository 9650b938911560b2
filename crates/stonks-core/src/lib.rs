//! Core types and traits for the stonks data aggregator.
//!
//! This crate provides the foundational building blocks including:
//! - Field keys and key sets
//! - The date-indexed table and its first-non-null-wins merge
//! - Request and symbol identity types
//! - The `DataSource` trait implemented by every provider adapter

pub mod types;
pub mod traits;
pub mod error;

pub use error::{CacheError, FetchError, StonksError, StonksResult};
pub use types::*;
pub use traits::*;
