//! Output directory, artifact headers and the final archive.

use std::fs;
use std::path::{Path, PathBuf};

/// Version string written into the version artifact.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Standard header prepended to text artifacts.
#[derive(Debug, Default)]
pub struct ArtifactHeader<'a> {
    description: Option<&'a str>,
    command: Option<&'a str>,
    source_file: Option<&'a Path>,
    extra: Option<String>,
}

impl<'a> ArtifactHeader<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, text: &'a str) -> Self {
        self.description = Some(text);
        self
    }

    pub fn command(mut self, text: &'a str) -> Self {
        self.command = Some(text);
        self
    }

    pub fn source_file(mut self, path: &'a Path) -> Self {
        self.source_file = Some(path);
        self
    }

    pub fn extra(mut self, text: impl Into<String>) -> Self {
        self.extra = Some(text.into());
        self
    }

    pub fn render(&self) -> String {
        let mut header = String::new();
        if let Some(description) = self.description {
            header.push_str(&format!("# {description}\n"));
        }
        if let Some(command) = self.command {
            header.push_str(&format!("# Command: {command}\n"));
        }
        header.push_str(&format!("# Executed at: {}\n", chrono::Local::now()));
        if let Some(source) = self.source_file {
            header.push_str(&format!("# Source file: {}\n", source.display()));
        }
        if let Some(extra) = &self.extra {
            header.push_str(&format!("# {extra}\n"));
        }
        header.push('\n');
        header
    }
}

/// Manages the output directory and its lifecycle artifacts.
pub struct OutputManager {
    output_dir: PathBuf,
}

impl OutputManager {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Creates the output directory, removing a previous run's directory
    /// first.
    pub fn setup_output_directory(&self) -> std::io::Result<()> {
        if self.output_dir.exists() {
            tracing::info!(
                "Removing existing output directory {}",
                self.output_dir.display()
            );
            fs::remove_dir_all(&self.output_dir)?;
        }
        fs::create_dir_all(&self.output_dir)?;
        tracing::info!("Created output directory {}", self.output_dir.display());
        Ok(())
    }

    /// Writes the collector version artifact (`version.txt`).
    pub fn write_version(&self) -> std::io::Result<()> {
        let path = self.output_dir.join("version.txt");
        let mut text = ArtifactHeader::new()
            .description("zinspector collector version")
            .render();
        text.push_str(VERSION);
        fs::write(&path, text)?;
        tracing::info!("Version written to {}", path.display());
        Ok(())
    }

    /// Writes the completion-time artifact (`final.txt`).
    pub fn write_completion_time(&self) -> std::io::Result<()> {
        let path = self.output_dir.join("final.txt");
        let mut text = ArtifactHeader::new()
            .description("Collection completion time")
            .render();
        text.push_str(&chrono::Local::now().to_rfc3339());
        fs::write(&path, text)?;
        tracing::info!("Completion time written to {}", path.display());
        Ok(())
    }

    /// Packs the run's text and CSV artifacts into `<hostname>.tar.gz`
    /// under `archive_dir` and returns the archive path.
    pub fn create_archive(&self, archive_dir: &Path) -> std::io::Result<PathBuf> {
        let host = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_default();
        let host = if host.is_empty() {
            "unknown".to_string()
        } else {
            host
        };

        let archive_path = archive_dir.join(format!("{host}.tar.gz"));
        if archive_path.exists() {
            fs::remove_file(&archive_path)?;
        }
        tracing::info!("Creating archive {}", archive_path.display());

        let file = fs::File::create(&archive_path)?;
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let prefix = self
            .output_dir
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("zinspector"));

        for path in collect_artifacts(&self.output_dir)? {
            let relative = path
                .strip_prefix(&self.output_dir)
                .map_err(|_| std::io::Error::other("artifact outside output directory"))?;
            builder.append_path_with_name(&path, prefix.join(relative))?;
            tracing::debug!("Added to archive: {}", path.display());
        }

        builder.into_inner()?.finish()?;
        tracing::info!("Archive created: {}", archive_path.display());
        Ok(archive_path)
    }
}

/// Recursively collects `.txt` and `.csv` artifacts, sorted for a stable
/// archive layout.
fn collect_artifacts(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut artifacts = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(current) = stack.pop() {
        for entry in fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext == "txt" || ext == "csv")
            {
                artifacts.push(path);
            }
        }
    }

    artifacts.sort();
    Ok(artifacts)
}
