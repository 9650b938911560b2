//! CLI command implementations.

pub mod get;
pub mod sources;
pub mod validate;
