//! Logging setup for the stonks binary.

mod logging;

pub use logging::setup_logging;
pub use tracing_appender::non_blocking::WorkerGuard;
