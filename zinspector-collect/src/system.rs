//! System-level collectors: trivial shell-outs persisted as text artifacts.

use crate::command::CommandRunner;
use crate::error::CommandError;
use crate::{DEFAULT_COMMAND_TIMEOUT, VMSTAT_COMMAND, VMSTAT_TIMEOUT};

/// Maps a command failure to a recorded `(false, empty)` outcome instead of
/// propagating it, so one broken collector never aborts the run.
pub fn guard(result: Result<(bool, String), CommandError>) -> (bool, String) {
    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Collector failed: {}", e);
            (false, String::new())
        }
    }
}

/// Collects system metrics through shell commands.
pub struct SystemCollectors<'a> {
    runner: &'a CommandRunner,
}

impl<'a> SystemCollectors<'a> {
    pub fn new(runner: &'a CommandRunner) -> Self {
        Self { runner }
    }

    pub async fn collect_processes(&self) -> (bool, String) {
        guard(
            self.runner
                .run_to_artifact(
                    "ps aux | grep zabbix_server",
                    "ps_aux",
                    DEFAULT_COMMAND_TIMEOUT,
                )
                .await,
        )
    }

    pub async fn collect_memory_info(&self) -> (bool, String) {
        guard(
            self.runner
                .run_to_artifact("free -b", "free", DEFAULT_COMMAND_TIMEOUT)
                .await,
        )
    }

    /// Samples system performance for 30 seconds.
    pub async fn collect_vmstat(&self) -> (bool, String) {
        guard(
            self.runner
                .run_to_artifact(VMSTAT_COMMAND, "vmstat", VMSTAT_TIMEOUT)
                .await,
        )
    }

    pub async fn collect_os_release(&self) -> (bool, String) {
        guard(
            self.runner
                .run_to_artifact("cat /etc/os-release", "os_release", DEFAULT_COMMAND_TIMEOUT)
                .await,
        )
    }

    pub async fn collect_uptime(&self) -> (bool, String) {
        guard(
            self.runner
                .run_to_artifact("uptime", "uptime", DEFAULT_COMMAND_TIMEOUT)
                .await,
        )
    }

    pub async fn collect_nproc(&self) -> (bool, String) {
        guard(
            self.runner
                .run_to_artifact("nproc", "nproc", DEFAULT_COMMAND_TIMEOUT)
                .await,
        )
    }

    pub async fn collect_cpu_info(&self) -> (bool, String) {
        guard(
            self.runner
                .run_to_artifact("cat /proc/cpuinfo", "cpuinfo", DEFAULT_COMMAND_TIMEOUT)
                .await,
        )
    }

    /// Runs every system collector in order and returns labeled outcomes.
    pub async fn collect_all(&self) -> Vec<(&'static str, bool)> {
        let mut outcomes = Vec::new();

        let (success, _) = self.collect_processes().await;
        outcomes.push(("PS AUX", success));
        let (success, _) = self.collect_memory_info().await;
        outcomes.push(("Free", success));
        let (success, _) = self.collect_vmstat().await;
        outcomes.push(("VMStat", success));
        let (success, _) = self.collect_os_release().await;
        outcomes.push(("OS Release", success));
        let (success, _) = self.collect_uptime().await;
        outcomes.push(("Uptime", success));
        let (success, _) = self.collect_nproc().await;
        outcomes.push(("Nproc", success));
        let (success, _) = self.collect_cpu_info().await;
        outcomes.push(("CPU Info", success));

        for (name, success) in &outcomes {
            tracing::info!(
                "System collector {}: {}",
                name,
                if *success { "ok" } else { "failed" }
            );
        }
        outcomes
    }
}
