//! Database task executor.
//!
//! Owns the single live connection for the duration of a batch. Each task is
//! retried from scratch up to a fixed attempt ceiling with a fixed delay
//! between attempts; a dead connection is re-established from the stored
//! config before the retried attempt runs. One task exhausting its retries
//! never aborts the batch.

use crate::config::DbConfig;
use crate::csv::write_csv;
use crate::error::TaskError;
use crate::task::SqlTask;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

/// Retry and timeout policy for the batch.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts per task.
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Server-side statement timeout per query.
    pub query_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: crate::DB_RETRY_ATTEMPTS,
            delay: crate::DB_RETRY_DELAY,
            connect_timeout: crate::DB_CONNECT_TIMEOUT,
            query_timeout: crate::DB_QUERY_TIMEOUT,
        }
    }
}

/// Outcome of one task.
#[derive(Debug, Clone, Default)]
pub struct TaskResult {
    pub success: bool,
    /// Row count when the query returned a result set.
    pub rows: Option<usize>,
    /// Byte size of the produced artifact.
    pub artifact_bytes: u64,
    /// Path of the produced artifact, if any.
    pub artifact: Option<PathBuf>,
}

impl TaskResult {
    fn failed() -> Self {
        Self::default()
    }
}

/// Aggregate counters across a batch, built incrementally as tasks finish.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub tasks_total: usize,
    pub tasks_successful: usize,
    pub tasks_failed: usize,
    pub artifacts_created: usize,
    pub total_artifact_bytes: u64,
}

impl BatchSummary {
    pub fn record(&mut self, result: &TaskResult) {
        self.tasks_total += 1;
        if result.success {
            self.tasks_successful += 1;
        } else {
            self.tasks_failed += 1;
        }
        if result.artifact.is_some() {
            self.artifacts_created += 1;
            self.total_artifact_bytes += result.artifact_bytes;
        }
    }
}

/// Executes SQL tasks against a single exclusively-owned connection.
pub struct TaskExecutor {
    client: Option<Client>,
    /// Config of the last connect attempt, used for reconnects mid-batch.
    config: Option<DbConfig>,
    policy: RetryPolicy,
    output_dir: PathBuf,
    summary: BatchSummary,
}

impl TaskExecutor {
    /// Creates an executor writing artifacts into `output_dir`.
    pub fn new(output_dir: &Path, policy: RetryPolicy) -> std::io::Result<Self> {
        std::fs::create_dir_all(output_dir)?;
        Ok(Self {
            client: None,
            config: None,
            policy,
            output_dir: output_dir.to_path_buf(),
            summary: BatchSummary::default(),
        })
    }

    /// Connects using the given config; an optional schema is applied as the
    /// session search path.
    pub async fn connect(&mut self, config: &DbConfig) -> Result<(), TaskError> {
        // Stored up front so a reconnect can re-run the full connect step
        // even when this first attempt fails.
        self.config = Some(config.clone());

        let mut pg = tokio_postgres::Config::new();
        pg.host(&config.host)
            .dbname(&config.database)
            .user(&config.user)
            .password(&config.password)
            .connect_timeout(self.policy.connect_timeout);
        if let Some(port) = config.port {
            pg.port(port);
        }

        let (client, connection) = pg.connect(NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!("Database connection driver exited: {}", e);
            }
        });

        if let Some(schema) = &config.schema {
            client
                .simple_query(&format!("SET search_path TO {}", schema))
                .await?;
        }

        tracing::info!(
            "Connected to database {} on {}",
            config.database,
            config.host
        );
        self.client = Some(client);
        Ok(())
    }

    /// Executes one task, retrying per the policy. Updates the batch summary
    /// and returns the terminal outcome.
    pub async fn execute(&mut self, task: &SqlTask) -> TaskResult {
        tracing::info!("Executing task: {}", task.name);

        for attempt in 1..=self.policy.attempts {
            match self.try_execute(task).await {
                Ok(result) => {
                    self.summary.record(&result);
                    return result;
                }
                Err(e) => {
                    tracing::error!(
                        "Attempt {}/{} for task '{}' failed: {}",
                        attempt,
                        self.policy.attempts,
                        task.name,
                        e
                    );
                    if attempt < self.policy.attempts {
                        tracing::info!(
                            "Waiting {}s before retrying task '{}'",
                            self.policy.delay.as_secs(),
                            task.name
                        );
                        tokio::time::sleep(self.policy.delay).await;
                    }
                }
            }
        }

        tracing::error!(
            "Task '{}' failed after {} attempts",
            task.name,
            self.policy.attempts
        );
        let result = TaskResult::failed();
        self.summary.record(&result);
        result
    }

    /// One attempt: reconnect if needed, set the statement timeout, run the
    /// query, then write the artifact. The artifact is only written after
    /// the query fully succeeded.
    async fn try_execute(&mut self, task: &SqlTask) -> Result<TaskResult, TaskError> {
        self.ensure_connected().await?;
        let client = self.client.as_ref().ok_or(TaskError::NotConnected)?;

        client
            .simple_query(&format!(
                "SET statement_timeout = {}",
                self.policy.query_timeout.as_millis()
            ))
            .await?;

        let messages = client.simple_query(&task.sql).await?;

        let mut columns: Option<Vec<String>> = None;
        let mut rows: Vec<Vec<Option<String>>> = Vec::new();
        for message in messages {
            match message {
                SimpleQueryMessage::RowDescription(desc) => {
                    columns.get_or_insert_with(|| {
                        desc.iter().map(|c| c.name().to_string()).collect()
                    });
                }
                SimpleQueryMessage::Row(row) => {
                    if columns.is_none() {
                        columns =
                            Some(row.columns().iter().map(|c| c.name().to_string()).collect());
                    }
                    rows.push((0..row.len()).map(|i| row.get(i).map(str::to_string)).collect());
                }
                SimpleQueryMessage::CommandComplete(_) => {}
                _ => {}
            }
        }

        match columns {
            Some(columns) => {
                let path = self.output_dir.join(&task.csv_name);
                let bytes = write_csv(&path, &columns, &rows)?;
                tracing::info!(
                    "Task '{}' succeeded: {} rows, {} bytes",
                    task.name,
                    rows.len(),
                    bytes
                );
                Ok(TaskResult {
                    success: true,
                    rows: Some(rows.len()),
                    artifact_bytes: bytes,
                    artifact: Some(path),
                })
            }
            None => {
                // A statement with no result set (DDL and the like) is a
                // success without an artifact.
                tracing::warn!("Task '{}' returned no result set", task.name);
                Ok(TaskResult {
                    success: true,
                    rows: None,
                    artifact_bytes: 0,
                    artifact: None,
                })
            }
        }
    }

    /// Re-runs the full connect step from the stored config when the
    /// connection is absent or found closed. A reconnect failure is an
    /// ordinary retryable failure.
    async fn ensure_connected(&mut self) -> Result<(), TaskError> {
        let alive = self.client.as_ref().is_some_and(|c| !c.is_closed());
        if alive {
            return Ok(());
        }
        if self.client.is_some() {
            tracing::warn!("Database connection lost, reconnecting");
        }
        let config = self.config.clone().ok_or(TaskError::NotConnected)?;
        self.connect(&config).await
    }

    /// Connects with the given config and returns the server version string.
    ///
    /// The connection is left open so follow-up queries (such as
    /// [`database_version_info`](Self::database_version_info)) can run on it;
    /// the caller closes it when done.
    pub async fn test_connection(&mut self, config: &DbConfig) -> Result<String, TaskError> {
        self.connect(config).await?;
        let client = self.client.as_ref().ok_or(TaskError::NotConnected)?;

        let messages = client.simple_query("SELECT version()").await?;
        let version = messages
            .into_iter()
            .find_map(|m| match m {
                SimpleQueryMessage::Row(row) => row.get(0).map(str::to_string),
                _ => None,
            })
            .unwrap_or_default();

        Ok(version)
    }

    /// Reads the monitoring schema's own version status row, when present.
    pub async fn database_version_info(
        &self,
    ) -> Result<Option<serde_json::Value>, TaskError> {
        let client = self.client.as_ref().ok_or(TaskError::NotConnected)?;
        let messages = client
            .simple_query("SELECT dbversion_status FROM config")
            .await?;

        for message in messages {
            if let SimpleQueryMessage::Row(row) = message {
                if let Some(raw) = row.get(0) {
                    return Ok(serde_json::from_str(raw).ok());
                }
            }
        }
        Ok(None)
    }

    /// Aggregate counters for the batch so far.
    pub fn summary(&self) -> &BatchSummary {
        &self.summary
    }

    /// Releases the connection.
    pub fn close(&mut self) {
        if self.client.take().is_some() {
            tracing::info!("Database connection closed");
        }
    }
}
