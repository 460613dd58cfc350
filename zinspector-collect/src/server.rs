//! Server-side collection: process discovery, config handling and the
//! diaginfo / statistics / filtered-config collectors.

use crate::command::CommandRunner;
use crate::error::ConfigurationError;
use crate::output::ArtifactHeader;
use crate::{DIAGINFO_TIMEOUT, PS_TIMEOUT, SENSITIVE_CONFIG_PARAMS};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zinspector_client::{ClientConfig, TrapperClient};
use zinspector_protocol::DEFAULT_TRAPPER_PORT;

/// Binary and config path of the running server process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveredPaths {
    pub binary: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Discovers the running server's binary and config path from `ps` output
/// and caches the result for the rest of the run.
pub struct ServerPaths {
    cached: Option<DiscoveredPaths>,
}

impl ServerPaths {
    pub fn new() -> Self {
        Self { cached: None }
    }

    /// Drops the cached result, e.g. after the server was restarted with
    /// different arguments.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Returns the cached paths, running discovery once when needed.
    ///
    /// A server that is not running yields empty paths, not an error; the
    /// outcome (empty included) is cached.
    pub async fn discover(&mut self, runner: &CommandRunner) -> DiscoveredPaths {
        if let Some(paths) = &self.cached {
            return paths.clone();
        }

        let paths = match runner
            .run("ps aux | grep '[z]abbix_server'", PS_TIMEOUT)
            .await
        {
            Ok(output) if output.success => parse_ps_output(&output.stdout),
            Ok(_) => {
                tracing::warn!("Server process not found in ps output");
                DiscoveredPaths::default()
            }
            Err(e) => {
                tracing::error!("Process discovery failed: {}", e);
                DiscoveredPaths::default()
            }
        };

        if let Some(binary) = &paths.binary {
            tracing::info!("Found server binary: {}", binary.display());
            if let Some(config) = &paths.config {
                tracing::info!("Server config file: {}", config.display());
            }
        } else {
            tracing::warn!("Server process not found");
        }

        self.cached = Some(paths.clone());
        paths
    }
}

impl Default for ServerPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_ps_output(stdout: &str) -> DiscoveredPaths {
    for line in stdout.lines() {
        if !line.contains("zabbix_server") {
            continue;
        }
        return DiscoveredPaths {
            binary: first_capture(r"(\S*/zabbix_server)", line).map(PathBuf::from),
            config: first_capture(r"-c\s+(\S+)", line).map(PathBuf::from),
        };
    }
    DiscoveredPaths::default()
}

fn first_capture(pattern: &str, text: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    Some(re.captures(text)?.get(1)?.as_str().to_string())
}

/// Reads the trapper port (`ListenPort=`) from the server config, falling
/// back to the well-known default when the file or key is absent or the
/// value does not parse.
pub fn read_trapper_port(config_path: Option<&Path>) -> u16 {
    let Some(path) = config_path else {
        tracing::info!("No server config, using default port {}", DEFAULT_TRAPPER_PORT);
        return DEFAULT_TRAPPER_PORT;
    };

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(
                "Cannot read {}: {}, using default port {}",
                path.display(),
                e,
                DEFAULT_TRAPPER_PORT
            );
            return DEFAULT_TRAPPER_PORT;
        }
    };

    for line in content.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("ListenPort=") {
            match value.trim().parse() {
                Ok(port) => {
                    tracing::info!("Found trapper port: {}", port);
                    return port;
                }
                Err(e) => {
                    tracing::warn!(
                        "Unparseable ListenPort '{}': {}, using default {}",
                        value,
                        e,
                        DEFAULT_TRAPPER_PORT
                    );
                    return DEFAULT_TRAPPER_PORT;
                }
            }
        }
    }

    tracing::info!("ListenPort not set, using default {}", DEFAULT_TRAPPER_PORT);
    DEFAULT_TRAPPER_PORT
}

/// Reads the `DB*` parameters from the server config, used as prompt
/// defaults for interactive database setup.
pub fn read_database_params(config_path: &Path) -> Result<BTreeMap<String, String>, ConfigurationError> {
    if !config_path.exists() {
        return Err(ConfigurationError::ConfigNotFound(config_path.to_path_buf()));
    }

    let mut params = BTreeMap::new();
    for line in fs::read_to_string(config_path)?.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if key.starts_with("DB") {
                params.insert(key.to_string(), value.trim().to_string());
            }
        }
    }
    Ok(params)
}

/// Writes a copy of the server config with comments, blank lines and
/// sensitive parameters removed.
pub fn filter_config(config_path: &Path, output_file: &Path) -> Result<(), ConfigurationError> {
    if !config_path.exists() {
        return Err(ConfigurationError::ConfigNotFound(config_path.to_path_buf()));
    }

    let mut kept = Vec::new();
    for line in fs::read_to_string(config_path)?.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let sensitive = SENSITIVE_CONFIG_PARAMS
            .iter()
            .any(|param| line.starts_with(&format!("{param}=")));
        if !sensitive {
            kept.push(line.to_string());
        }
    }

    let mut text = ArtifactHeader::new()
        .description("Server configuration (filtered)")
        .source_file(config_path)
        .extra(format!(
            "Excluded sensitive parameters: {}",
            SENSITIVE_CONFIG_PARAMS.join(", ")
        ))
        .render();
    for line in &kept {
        text.push_str(line);
        text.push('\n');
    }
    fs::write(output_file, text)?;

    tracing::info!(
        "Filtered config written to {} ({} lines)",
        output_file.display(),
        kept.len()
    );
    Ok(())
}

/// Temporary copy of the server config with `Timeout=` overridden, used for
/// the diaginfo runtime-control run. Deleted on drop unless kept.
pub struct TempConfig {
    file: tempfile::NamedTempFile,
}

impl TempConfig {
    pub fn create(source: &Path, timeout_secs: u64) -> Result<Self, ConfigurationError> {
        if !source.exists() {
            return Err(ConfigurationError::ConfigNotFound(source.to_path_buf()));
        }

        let mut file = tempfile::Builder::new()
            .prefix("zinspector_")
            .suffix(".conf")
            .tempfile()?;

        writeln!(file, "# Temporary config for diaginfo")?;
        writeln!(file, "# Created: {}", chrono::Local::now())?;
        writeln!(file, "# Original: {}", source.display())?;
        writeln!(file)?;

        let mut timeout_found = false;
        for line in fs::read_to_string(source)?.lines() {
            if line.trim().starts_with("Timeout=") {
                writeln!(file, "# {line}")?;
                if !timeout_found {
                    writeln!(file, "Timeout={timeout_secs}")?;
                    timeout_found = true;
                }
            } else {
                writeln!(file, "{line}")?;
            }
        }
        if !timeout_found {
            writeln!(file, "\nTimeout={timeout_secs}")?;
        }
        file.flush()?;

        tracing::info!("Created temporary config: {}", file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Persists the temp file past this run and returns its path.
    pub fn keep(self) -> Result<PathBuf, ConfigurationError> {
        let (_, path) = self.file.keep().map_err(|e| ConfigurationError::Io(e.error))?;
        tracing::info!("Temporary config kept at {}", path.display());
        Ok(path)
    }
}

/// Collectors that talk to the monitoring server itself.
pub struct ServerCollectors<'a> {
    runner: &'a CommandRunner,
    output_dir: PathBuf,
    paths: ServerPaths,
    stats_timeout: Duration,
    keep_temp_config: bool,
}

impl<'a> ServerCollectors<'a> {
    pub fn new(
        runner: &'a CommandRunner,
        output_dir: impl Into<PathBuf>,
        stats_timeout: Duration,
        keep_temp_config: bool,
    ) -> Self {
        Self {
            runner,
            output_dir: output_dir.into(),
            paths: ServerPaths::new(),
            stats_timeout,
            keep_temp_config,
        }
    }

    /// Runs the server's diaginfo runtime-control command against a
    /// temporary config with a shortened `Timeout=`.
    pub async fn collect_diaginfo(&mut self) -> bool {
        let paths = self.paths.discover(self.runner).await;
        let (Some(binary), Some(config)) = (paths.binary, paths.config) else {
            tracing::error!("Cannot run diaginfo: server binary or config not found");
            return false;
        };

        let temp = match TempConfig::create(&config, 30) {
            Ok(temp) => temp,
            Err(e) => {
                tracing::error!("Failed to create temporary config: {}", e);
                return false;
            }
        };

        let command = format!(
            "{} -c {} -R diaginfo",
            binary.display(),
            temp.path().display()
        );
        let success = match self
            .runner
            .run_to_artifact(&command, "diaginfo", DIAGINFO_TIMEOUT)
            .await
        {
            Ok((success, _)) => success,
            Err(e) => {
                tracing::error!("diaginfo failed: {}", e);
                false
            }
        };

        if self.keep_temp_config {
            if let Err(e) = temp.keep() {
                tracing::warn!("Failed to keep temporary config: {}", e);
            }
        }

        success
    }

    /// Requests server statistics over the trapper protocol and records the
    /// outcome (response JSON or the failure text) into `zabbix_stats.txt`.
    ///
    /// Returns whether the statistics were actually retrieved; a failed
    /// exchange is still recorded and never aborts the run.
    pub async fn collect_stats(&mut self) -> bool {
        let paths = self.paths.discover(self.runner).await;
        let port = read_trapper_port(paths.config.as_deref());

        let config = ClientConfig::new("localhost", port).with_timeout(self.stats_timeout);
        let client = TrapperClient::new(config);

        let (retrieved, stats_text) = match client.request_stats().await {
            Ok(stats) => {
                let pretty = serde_json::to_string_pretty(&stats)
                    .unwrap_or_else(|_| stats.to_string());
                (true, format!("Server statistics response:\n{pretty}"))
            }
            Err(e) => {
                tracing::error!("Failed to retrieve server statistics: {}", e);
                (false, format!("Failed to retrieve server statistics: {e}"))
            }
        };

        let output_file = self.output_dir.join("zabbix_stats.txt");
        let mut text = ArtifactHeader::new()
            .description("Server statistics (trapper protocol)")
            .extra(format!(
                "Port: {}, Timeout: {}s",
                port,
                self.stats_timeout.as_secs()
            ))
            .render();
        text.push_str(&stats_text);

        if let Err(e) = fs::write(&output_file, text) {
            tracing::error!("Failed to save statistics artifact: {}", e);
            return false;
        }
        tracing::info!("Statistics saved to {}", output_file.display());
        retrieved
    }

    /// Writes the filtered server config to `zabbix_config.txt`.
    pub async fn collect_config(&mut self) -> bool {
        let paths = self.paths.discover(self.runner).await;
        let Some(config) = paths.config else {
            tracing::error!("Cannot collect config: server config path not found");
            return false;
        };

        match filter_config(&config, &self.output_dir.join("zabbix_config.txt")) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Config collection failed: {}", e);
                false
            }
        }
    }

    /// Runs every server collector in order and returns labeled outcomes.
    pub async fn collect_all(&mut self) -> Vec<(&'static str, bool)> {
        let outcomes = vec![
            ("Diaginfo", self.collect_diaginfo().await),
            ("Server Stats", self.collect_stats().await),
            ("Server Config", self.collect_config().await),
        ];
        for (name, success) in &outcomes {
            tracing::info!(
                "Server collector {}: {}",
                name,
                if *success { "ok" } else { "failed" }
            );
        }
        outcomes
    }
}
