//! Logging setup.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILE: &str = "stonks.log";

/// Setup logging with the given level, optionally mirrored to a daily rolling file.
///
/// `RUST_LOG` takes precedence over `level`. Keep the returned guard alive for
/// as long as file output should be flushed.
pub fn setup_logging(level: &str, json: bool, file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match file {
        Some(path) => {
            let (dir, prefix) = split_log_path(path);
            let appender = tracing_appender::rolling::daily(dir, prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(fmt::layer().pretty())
            .init();
    }

    guard
}

/// Directory and file-name prefix for the rolling appender.
fn split_log_path(path: &Path) -> (&Path, &str) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(DEFAULT_LOG_FILE);
    (dir, prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path() {
        assert_eq!(
            split_log_path(Path::new("logs/stonks.log")),
            (Path::new("logs"), "stonks.log")
        );
        assert_eq!(split_log_path(Path::new("app.log")), (Path::new("."), "app.log"));
        assert_eq!(split_log_path(Path::new("/")), (Path::new("."), DEFAULT_LOG_FILE));
    }
}
