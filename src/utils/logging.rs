//! Structured logging setup.
//!
//! Installs a global `tracing-subscriber` formatter driven by [`LoggingConfig`].
//! `RUST_LOG`, when set, takes precedence over the configured level.

use crate::config::LoggingConfig;
use crate::error::{ProtocolError, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// Records go to stdout, the log file, or both. The first record carries
/// `app_name` so interleaved logs can be told apart.
///
/// # Errors
/// `ConfigError` if no output is enabled, the log file cannot be opened, or a
/// global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str().to_lowercase()));

    let file = match (&config.log_file_path, config.log_to_file) {
        (Some(path), true) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ProtocolError::ConfigError(format!("Failed to open log file: {e}")))?,
        ),
        (None, true) => {
            return Err(ProtocolError::ConfigError(
                "log_file_path is required when log_to_file is set".into(),
            ))
        }
        _ => None,
    };

    let writer = match (config.log_to_console, file) {
        (true, Some(file)) => BoxMakeWriter::new(std::io::stdout.and(Mutex::new(file))),
        (false, Some(file)) => BoxMakeWriter::new(Mutex::new(file)),
        (true, None) => BoxMakeWriter::new(std::io::stdout),
        (false, None) => {
            return Err(ProtocolError::ConfigError(
                "Logging needs at least one output (console or file)".into(),
            ))
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(writer);

    let installed = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| ProtocolError::ConfigError(format!("Failed to install subscriber: {e}")))?;

    info!(app = %config.app_name, level = %config.log_level, "Logging initialized");
    Ok(())
}
