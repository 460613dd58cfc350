//! # zinspector-db
//!
//! Database diagnostics batch: discovers SQL task scripts, executes them
//! against the monitoring server's PostgreSQL database and streams results
//! into CSV artifacts.
//!
//! This crate provides:
//! - The on-disk database connection config artifact (owner-only permissions)
//! - A directory scanner producing an ordered batch of [`SqlTask`]s
//! - A task executor with bounded retries, fixed backoff and a server-side
//!   statement timeout
//! - Partial-failure isolation: one task exhausting its retries never aborts
//!   the batch

pub mod collector;
pub mod config;
pub mod csv;
pub mod error;
pub mod executor;
pub mod scanner;
pub mod task;

pub use collector::DatabaseCollector;
pub use config::DbConfig;
pub use error::{ConfigError, TaskError};
pub use executor::{BatchSummary, RetryPolicy, TaskExecutor, TaskResult};
pub use scanner::scan_sql_directory;
pub use task::SqlTask;

use std::time::Duration;

/// Maximum attempts per task.
pub const DB_RETRY_ATTEMPTS: u32 = 3;

/// Fixed delay between attempts.
pub const DB_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Connect timeout for the database connection.
pub const DB_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Server-side statement timeout per query.
pub const DB_QUERY_TIMEOUT: Duration = Duration::from_secs(300);
