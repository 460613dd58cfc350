//! Database batch collection: config load, scan, execute, summarize.

use crate::config::DbConfig;
use crate::error::ConfigError;
use crate::executor::{BatchSummary, RetryPolicy, TaskExecutor};
use crate::scanner::scan_sql_directory;
use std::path::{Path, PathBuf};

/// Glues the config artifact, the scanner and the executor into one batch
/// run. Configuration problems are fatal to the batch only; the caller's
/// collection run continues.
pub struct DatabaseCollector {
    output_dir: PathBuf,
    config_path: PathBuf,
    policy: RetryPolicy,
}

impl DatabaseCollector {
    pub fn new(output_dir: &Path) -> Result<Self, ConfigError> {
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            config_path: DbConfig::default_path()?,
            policy: RetryPolicy::default(),
        })
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs the batch for every task discovered in `sql_dir`.
    ///
    /// A missing or invalid config artifact is a [`ConfigError`]; an empty
    /// task directory yields an empty summary. A failed initial connection
    /// does not short-circuit the batch: the executor re-runs the connect
    /// step per attempt, so every discovered task is attempted and an
    /// unreachable database shows up as failed tasks in the counters.
    pub async fn collect(&self, sql_dir: &Path) -> Result<BatchSummary, ConfigError> {
        tracing::info!(
            "Loading database config from {}",
            self.config_path.display()
        );
        let config = DbConfig::load(&self.config_path)?;
        config.validate()?;

        let mut executor =
            TaskExecutor::new(&self.output_dir.join("database"), self.policy.clone())?;

        if let Err(e) = executor.connect(&config).await {
            // The config is stored; each task attempt re-runs the connect
            // step, so the tasks still get their full retry budget.
            tracing::warn!("Initial database connection failed: {}", e);
        }

        let tasks = scan_sql_directory(sql_dir);
        if tasks.is_empty() {
            tracing::warn!("No SQL tasks found in {}", sql_dir.display());
            executor.close();
            return Ok(executor.summary().clone());
        }

        tracing::info!("Starting batch of {} SQL tasks", tasks.len());
        for task in &tasks {
            executor.execute(task).await;
        }

        executor.close();
        let summary = executor.summary().clone();
        tracing::info!(
            "Batch finished: {}/{} tasks succeeded, {} artifacts, {} bytes",
            summary.tasks_successful,
            summary.tasks_total,
            summary.artifacts_created,
            summary.total_artifact_bytes
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_config_is_config_error() {
        let dir = TempDir::new().unwrap();
        let collector = DatabaseCollector::new(dir.path())
            .unwrap()
            .with_config_path(dir.path().join("absent.json"));

        let result = collector.collect(dir.path()).await;
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_config_is_config_error() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("database.json");
        DbConfig {
            host: "db".into(),
            database: "zabbix".into(),
            user: "monitor".into(),
            password: String::new(),
            schema: None,
            port: None,
        }
        .save(&config_path)
        .unwrap();

        let collector = DatabaseCollector::new(dir.path())
            .unwrap()
            .with_config_path(config_path);

        let result = collector.collect(dir.path()).await;
        assert!(matches!(
            result,
            Err(ConfigError::MissingParameter("DBPassword"))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_database_counts_failed_tasks() {
        // Nothing listens on the port once the listener is dropped, so the
        // initial connect and every per-task reconnect fail. The discovered
        // task must still be attempted and counted as failed, never
        // reported as an empty successful batch.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("database.json");
        DbConfig {
            host: "127.0.0.1".into(),
            database: "zabbix".into(),
            user: "monitor".into(),
            password: "secret".into(),
            schema: None,
            port: Some(port),
        }
        .save(&config_path)
        .unwrap();

        let sql_dir = dir.path().join("sql");
        std::fs::create_dir_all(&sql_dir).unwrap();
        std::fs::write(sql_dir.join("events.sql"), "SELECT * FROM events;").unwrap();

        let policy = RetryPolicy {
            attempts: 2,
            delay: Duration::from_millis(10),
            connect_timeout: Duration::from_secs(2),
            ..RetryPolicy::default()
        };
        let collector = DatabaseCollector::new(dir.path())
            .unwrap()
            .with_config_path(config_path)
            .with_policy(policy);

        let summary = collector.collect(&sql_dir).await.unwrap();
        assert_eq!(summary.tasks_total, 1);
        assert_eq!(summary.tasks_failed, 1);
        assert_eq!(summary.tasks_successful, 0);
        assert_eq!(summary.artifacts_created, 0);
    }
}
