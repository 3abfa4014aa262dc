//! Log subscriber setup.
//!
//! Library code only emits `tracing` events. The binary calls [`init`] once;
//! tests and embedders may install their own subscriber instead.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, registry};

use crate::error::LoggingError;

/// Where and how much to log.
#[derive(Clone, Debug, PartialEq)]
pub struct LogSettings {
    pub level: LevelFilter,
    /// Also append to this file, without ANSI colors.
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            file: None,
        }
    }
}

/// Parse `trace`, `debug`, `info`, `warn`/`warning`, `error` or `off`.
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    match name.trim().to_lowercase().as_str() {
        "trace" => Some(LevelFilter::TRACE),
        "debug" => Some(LevelFilter::DEBUG),
        "info" => Some(LevelFilter::INFO),
        "warn" | "warning" => Some(LevelFilter::WARN),
        "error" => Some(LevelFilter::ERROR),
        "off" => Some(LevelFilter::OFF),
        _ => None,
    }
}

fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::File {
            path: path.to_path_buf(),
            source,
        })
}

/// Build the subscriber: stderr, plus the log file when one is set.
pub fn subscriber(settings: &LogSettings) -> Result<impl Subscriber + Send + Sync, LoggingError> {
    let file_layer = match &settings.file {
        Some(path) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(path)?)),
        ),
        None => None,
    };

    Ok(registry()
        .with(settings.level)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(file_layer))
}

/// Install the subscriber as the global default.
pub fn init(settings: &LogSettings) -> Result<(), LoggingError> {
    subscriber(settings)?.try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Some(LevelFilter::DEBUG));
        assert_eq!(parse_level(" warning "), Some(LevelFilter::WARN));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn test_file_sink_receives_events() {
        let path = std::env::temp_dir().join(format!("horizon-log-{}.log", std::process::id()));
        let _ = fs::remove_file(&path);
        let settings = LogSettings {
            level: LevelFilter::INFO,
            file: Some(path.clone()),
        };
        let sub = subscriber(&settings).unwrap();
        tracing::subscriber::with_default(sub, || {
            tracing::info!("horizon reached");
            tracing::debug!("filtered out");
        });

        let contents = fs::read_to_string(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert!(contents.contains("horizon reached"));
        assert!(contents.contains("INFO"));
        assert!(!contents.contains("filtered out"));
    }

    #[test]
    fn test_unwritable_log_file_is_an_error() {
        let settings = LogSettings {
            level: LevelFilter::INFO,
            file: Some(PathBuf::from("/nonexistent-dir/horizon.log")),
        };
        assert!(matches!(subscriber(&settings), Err(LoggingError::File { .. })));
    }
}
