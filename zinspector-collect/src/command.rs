//! External command execution with per-call timeouts.

use crate::error::CommandError;
use crate::DEFAULT_COMMAND_TIMEOUT;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Captured result of one command run.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs shell commands, captures their output and optionally persists it to
/// a named text artifact.
pub struct CommandRunner {
    output_dir: Option<PathBuf>,
}

impl CommandRunner {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: Some(output_dir.into()),
        }
    }

    /// A runner without artifact persistence (`run_to_artifact` will fail).
    pub fn detached() -> Self {
        Self { output_dir: None }
    }

    /// Runs a command through the shell, bounded by `timeout`.
    pub async fn run(
        &self,
        command: &str,
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        tracing::info!("Running: {}", command);

        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(timeout, child)
            .await
            .map_err(|_| {
                tracing::error!("Command '{}' exceeded its timeout", command);
                CommandError::Timeout {
                    command: command.to_string(),
                }
            })??;

        Ok(CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Runs a command and persists stdout/stderr to `<name>.txt` in the
    /// output directory with a standard artifact header.
    ///
    /// Returns the command's success flag and its stdout.
    pub async fn run_to_artifact(
        &self,
        command: &str,
        name: &str,
        timeout: Duration,
    ) -> Result<(bool, String), CommandError> {
        let output_dir = self.output_dir.as_ref().ok_or(CommandError::NoOutputDir)?;
        let output = self.run(command, timeout).await?;

        let path = output_dir.join(format!("{name}.txt"));
        let mut text = String::new();
        text.push_str(&format!("# Command: {command}\n"));
        text.push_str(&format!("# Executed at: {}\n", chrono::Local::now()));
        text.push_str(&format!(
            "# Exit code: {}\n\n",
            output
                .exit_code
                .map_or_else(|| "killed".to_string(), |c| c.to_string())
        ));
        text.push_str("=== STDOUT ===\n");
        text.push_str(&output.stdout);
        if !output.stderr.is_empty() {
            text.push_str("\n=== STDERR ===\n");
            text.push_str(&output.stderr);
        }
        std::fs::write(&path, text)?;

        tracing::info!("Output saved to {}", path.display());
        Ok((output.success, output.stdout))
    }

    /// Runs a command with the default timeout and persists the artifact.
    pub async fn run_default(
        &self,
        command: &str,
        name: &str,
    ) -> Result<(bool, String), CommandError> {
        self.run_to_artifact(command, name, DEFAULT_COMMAND_TIMEOUT)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_run_captures_output_and_exit_code() {
        let runner = CommandRunner::detached();
        let output = runner
            .run("echo hello; echo oops >&2; exit 3", Duration::from_secs(5))
            .await
            .unwrap();

        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_timeout_is_command_error() {
        let runner = CommandRunner::detached();
        let result = runner.run("sleep 5", Duration::from_millis(100)).await;
        assert!(matches!(result, Err(CommandError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_artifact_persisted_with_header() {
        let dir = TempDir::new().unwrap();
        let runner = CommandRunner::new(dir.path());

        let (success, stdout) = runner
            .run_to_artifact("echo artifact", "echo_test", Duration::from_secs(5))
            .await
            .unwrap();
        assert!(success);
        assert_eq!(stdout.trim(), "artifact");

        let content = std::fs::read_to_string(dir.path().join("echo_test.txt")).unwrap();
        assert!(content.starts_with("# Command: echo artifact\n"));
        assert!(content.contains("# Exit code: 0"));
        assert!(content.contains("=== STDOUT ===\nartifact"));
        assert!(!content.contains("STDERR"));
    }

    #[tokio::test]
    async fn test_detached_runner_rejects_artifacts() {
        let runner = CommandRunner::detached();
        let result = runner.run_default("echo x", "x").await;
        assert!(matches!(result, Err(CommandError::NoOutputDir)));
    }
}
