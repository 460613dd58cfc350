//! # zinspector-collect
//!
//! Collection orchestration for server diagnostics.
//!
//! This crate provides:
//! - A shell command runner with per-call timeouts and artifact persistence
//! - Output directory and archive management
//! - System collectors (trivial shell-outs: ps, free, vmstat, ...)
//! - Server collectors (diaginfo, trapper statistics, filtered config)
//! - The sequential orchestrator aggregating a run report
//!
//! Collectors run strictly one at a time; all resilience (retries, timeouts)
//! lives in the trapper client and the database executor.

pub mod command;
pub mod diagnostic;
pub mod error;
pub mod output;
pub mod report;
pub mod server;
pub mod system;

pub use command::{CommandOutput, CommandRunner};
pub use diagnostic::{Diagnostic, DiagnosticOptions};
pub use error::{CommandError, ConfigurationError};
pub use output::{ArtifactHeader, OutputManager};
pub use report::{ReportEntry, RunReport};
pub use server::{read_database_params, ServerCollectors, ServerPaths, TempConfig};
pub use system::SystemCollectors;

use std::time::Duration;

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "/tmp/zinspector";

/// Default timeout for shell-out collectors.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the trapper statistics exchange.
pub const STATS_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for the process listing used in server path discovery.
pub const PS_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for the diaginfo runtime control command.
pub const DIAGINFO_TIMEOUT: Duration = Duration::from_secs(60);

/// vmstat samples for 30 seconds, so its timeout is a little above that.
pub const VMSTAT_TIMEOUT: Duration = Duration::from_secs(35);

/// Command for system performance sampling.
pub const VMSTAT_COMMAND: &str = "vmstat 1 30";

/// Sensitive server config parameters excluded from the config artifact.
pub const SENSITIVE_CONFIG_PARAMS: &[&str] = &[
    "DBUser",
    "DBPassword",
    "DBName",
    "DBHost",
    "StatsAllowedIP",
    "VaultURL",
    "VaultToken",
];
