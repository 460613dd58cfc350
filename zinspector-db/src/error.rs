//! Database error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors in the connection config artifact.
///
/// These are fatal to the database batch only; the rest of a collection run
/// proceeds.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("no user config directory available")]
    NoConfigDir,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-task execution errors.
///
/// Every variant is retryable: the executor retries the whole task from
/// scratch up to its attempt ceiling, reconnecting first when the connection
/// is found dead.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("not connected and no stored connection config")]
    NotConnected,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
