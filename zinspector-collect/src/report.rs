//! Final run report printed after all collectors finish.

use colored::Colorize;
use std::path::{Path, PathBuf};
use zinspector_db::BatchSummary;

/// One collector's outcome.
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub name: String,
    pub success: bool,
}

/// Aggregated outcome of a collection run.
#[derive(Debug, Clone)]
pub struct RunReport {
    entries: Vec<ReportEntry>,
    pub db_summary: Option<BatchSummary>,
    pub archive: Option<PathBuf>,
    output_dir: PathBuf,
}

impl RunReport {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            entries: Vec::new(),
            db_summary: None,
            archive: None,
            output_dir: output_dir.into(),
        }
    }

    pub fn record(&mut self, name: impl Into<String>, success: bool) {
        self.entries.push(ReportEntry {
            name: name.into(),
            success,
        });
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn successful(&self) -> usize {
        self.entries.iter().filter(|e| e.success).count()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Prints the numbered checklist, database batch counters and archive
    /// location to stdout.
    pub fn print(&self) {
        println!("\n=== Run report ===");
        println!("Succeeded: {}/{}", self.successful(), self.total());

        println!("\nDetails:");
        for (i, entry) in self.entries.iter().enumerate() {
            let status = if entry.success {
                "✓".green()
            } else {
                "✗".red()
            };
            println!("{} {}. {}", status, i + 1, entry.name);
        }

        if let Some(summary) = &self.db_summary {
            println!(
                "\nDatabase batch: {}/{} tasks succeeded, {} artifacts ({} bytes)",
                summary.tasks_successful,
                summary.tasks_total,
                summary.artifacts_created,
                summary.total_artifact_bytes
            );
        }

        match &self.archive {
            Some(path) => println!("{} Archive created: {}", "✓".green(), path.display()),
            None => println!("{} Archive not created", "✗".red()),
        }

        println!("\nData collected in: {}", self.output_dir.display());
    }
}
