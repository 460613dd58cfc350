//! Sequential collection orchestrator.

use crate::command::CommandRunner;
use crate::output::OutputManager;
use crate::report::RunReport;
use crate::server::ServerCollectors;
use crate::system::SystemCollectors;
use crate::{DEFAULT_OUTPUT_DIR, STATS_TIMEOUT};
use std::path::PathBuf;
use std::time::Duration;
use zinspector_db::DatabaseCollector;

/// Options for one collection run.
#[derive(Debug, Clone)]
pub struct DiagnosticOptions {
    pub output_dir: PathBuf,
    pub stats_timeout: Duration,
    pub keep_temp_config: bool,
    pub database: bool,
    pub sql_dir: Option<PathBuf>,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            stats_timeout: STATS_TIMEOUT,
            keep_temp_config: false,
            database: false,
            sql_dir: None,
        }
    }
}

impl DiagnosticOptions {
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_stats_timeout(mut self, timeout: Duration) -> Self {
        self.stats_timeout = timeout;
        self
    }

    pub fn with_keep_temp_config(mut self, keep: bool) -> Self {
        self.keep_temp_config = keep;
        self
    }

    pub fn with_database(mut self, database: bool, sql_dir: Option<PathBuf>) -> Self {
        self.database = database;
        self.sql_dir = sql_dir;
        self
    }
}

/// Runs all collectors strictly one at a time and aggregates the report.
///
/// Only output directory setup is fatal; every collector failure is recorded
/// and the run continues. Resilience (timeouts, retries) lives inside the
/// individual collectors.
pub struct Diagnostic {
    options: DiagnosticOptions,
}

impl Diagnostic {
    pub fn new(options: DiagnosticOptions) -> Self {
        Self { options }
    }

    pub async fn run(&self) -> std::io::Result<RunReport> {
        tracing::info!("=== Starting diagnostic collection ===");

        let output = OutputManager::new(&self.options.output_dir);
        output.setup_output_directory()?;

        let runner = CommandRunner::new(&self.options.output_dir);
        let mut report = RunReport::new(&self.options.output_dir);

        report.record("Version", log_outcome("Version", output.write_version()));

        let mut server = ServerCollectors::new(
            &runner,
            &self.options.output_dir,
            self.options.stats_timeout,
            self.options.keep_temp_config,
        );
        for (name, success) in server.collect_all().await {
            report.record(name, success);
        }

        let system = SystemCollectors::new(&runner);
        for (name, success) in system.collect_all().await {
            report.record(name, success);
        }

        if self.options.database {
            self.run_database_batch(&mut report).await;
        }

        report.record(
            "Final",
            log_outcome("Final", output.write_completion_time()),
        );

        match output.create_archive(&self.options.output_dir) {
            Ok(path) => report.archive = Some(path),
            Err(e) => tracing::error!("Archive creation failed: {}", e),
        }

        tracing::info!(
            "=== Collection finished: {}/{} ===",
            report.successful(),
            report.total()
        );
        Ok(report)
    }

    async fn run_database_batch(&self, report: &mut RunReport) {
        let Some(sql_dir) = &self.options.sql_dir else {
            tracing::warn!("Database batch requested without a SQL directory, skipping");
            report.record("Database Batch", false);
            return;
        };

        let collector = match DatabaseCollector::new(&self.options.output_dir) {
            Ok(collector) => collector,
            Err(e) => {
                tracing::error!("Database batch setup failed: {}", e);
                report.record("Database Batch", false);
                return;
            }
        };

        match collector.collect(sql_dir).await {
            Ok(summary) => {
                report.record("Database Batch", summary.tasks_failed == 0);
                report.db_summary = Some(summary);
            }
            Err(e) => {
                tracing::error!("Database batch failed: {}", e);
                report.record("Database Batch", false);
            }
        }
    }
}

fn log_outcome(name: &str, result: std::io::Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("{} artifact failed: {}", name, e);
            false
        }
    }
}
