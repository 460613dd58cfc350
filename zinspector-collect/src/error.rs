//! Collection error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command '{command}' exceeded its timeout")]
    Timeout { command: String },

    #[error("no output directory configured for command artifacts")]
    NoOutputDir,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors locating or processing the monitoring server's configuration.
///
/// Fatal to the collector that hit them, never to the whole run.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("running server process not found")]
    ServerNotFound,

    #[error("server config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("command error: {0}")]
    Command(#[from] CommandError),
}
