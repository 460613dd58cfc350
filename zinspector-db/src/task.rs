//! SQL task model.

use std::path::PathBuf;

/// Marker comment designating a task's display name.
pub const TASK_NAME_MARKER: &str = "-- Task Name:";

/// Fallback display name when no marker is present.
pub const DEFAULT_TASK_NAME: &str = "Unknown Task";

/// One unit of database work: a SQL script mapped to exactly one CSV
/// artifact. Created at scan time, read-only thereafter.
#[derive(Debug, Clone)]
pub struct SqlTask {
    /// Human-readable display name.
    pub name: String,
    /// Path of the source script.
    pub sql_path: PathBuf,
    /// File name of the CSV artifact (script stem + `.csv`).
    pub csv_name: String,
    /// Raw SQL text.
    pub sql: String,
}

impl SqlTask {
    /// Extracts the display name from the first `-- Task Name:` marker line,
    /// falling back to [`DEFAULT_TASK_NAME`] when absent or empty.
    pub fn parse_task_name(sql: &str) -> String {
        for line in sql.lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix(TASK_NAME_MARKER) {
                let name = rest.trim();
                if !name.is_empty() {
                    return name.to_string();
                }
            }
        }
        DEFAULT_TASK_NAME.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_task_name() {
        let sql = "-- Task Name: Nightly Audit\nSELECT 1;";
        assert_eq!(SqlTask::parse_task_name(sql), "Nightly Audit");
    }

    #[test]
    fn test_marker_anywhere_in_file() {
        let sql = "SELECT 1;\n  -- Task Name: Queue Depth  \nSELECT 2;";
        assert_eq!(SqlTask::parse_task_name(sql), "Queue Depth");
    }

    #[test]
    fn test_missing_marker_falls_back() {
        assert_eq!(SqlTask::parse_task_name("SELECT 1;"), DEFAULT_TASK_NAME);
    }

    #[test]
    fn test_empty_marker_falls_back() {
        assert_eq!(
            SqlTask::parse_task_name("-- Task Name:   \nSELECT 1;"),
            DEFAULT_TASK_NAME
        );
    }

    #[test]
    fn test_first_marker_wins() {
        let sql = "-- Task Name: First\n-- Task Name: Second\n";
        assert_eq!(SqlTask::parse_task_name(sql), "First");
    }
}
