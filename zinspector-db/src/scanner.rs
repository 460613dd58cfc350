//! SQL task discovery.

use crate::task::SqlTask;
use std::path::Path;

/// Scans a directory (non-recursive) for `.sql` scripts and builds the task
/// batch.
///
/// Empty or unreadable files are skipped with a warning; a bad file never
/// aborts the scan. Tasks are sorted by file name: `read_dir` order is not
/// guaranteed, and the sort makes execution order and report order
/// deterministic.
pub fn scan_sql_directory(dir: &Path) -> Vec<SqlTask> {
    let mut tasks = Vec::new();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("SQL directory {} not readable: {}", dir.display(), e);
            return tasks;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_sql = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"));
        if !is_sql {
            continue;
        }

        let sql = match std::fs::read_to_string(&path) {
            Ok(sql) => sql,
            Err(e) => {
                tracing::warn!("Skipping unreadable SQL file {}: {}", path.display(), e);
                continue;
            }
        };
        if sql.is_empty() {
            tracing::warn!("Skipping empty SQL file {}", path.display());
            continue;
        }

        let csv_name = match path.file_stem() {
            Some(stem) => format!("{}.csv", stem.to_string_lossy()),
            None => continue,
        };

        tasks.push(SqlTask {
            name: SqlTask::parse_task_name(&sql),
            sql_path: path,
            csv_name,
            sql,
        });
    }

    tasks.sort_by(|a, b| a.sql_path.cmp(&b.sql_path));
    tracing::info!("Found {} SQL tasks in {}", tasks.len(), dir.display());
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::DEFAULT_TASK_NAME;
    use tempfile::TempDir;

    #[test]
    fn test_scan_with_and_without_marker() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("audit.sql"),
            "-- Task Name: Nightly Audit\nSELECT * FROM events;",
        )
        .unwrap();
        std::fs::write(dir.path().join("bare.sql"), "SELECT 1;").unwrap();

        let tasks = scan_sql_directory(dir.path());
        assert_eq!(tasks.len(), 2);
        // Sorted by file name.
        assert_eq!(tasks[0].name, "Nightly Audit");
        assert_eq!(tasks[0].csv_name, "audit.csv");
        assert_eq!(tasks[1].name, DEFAULT_TASK_NAME);
        assert_eq!(tasks[1].csv_name, "bare.csv");
    }

    #[test]
    fn test_empty_file_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("empty.sql"), "").unwrap();
        std::fs::write(dir.path().join("real.sql"), "SELECT 1;").unwrap();

        let tasks = scan_sql_directory(dir.path());
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].csv_name, "real.csv");
    }

    #[test]
    fn test_non_sql_files_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not sql").unwrap();
        std::fs::write(dir.path().join("query.SQL"), "SELECT 1;").unwrap();

        let tasks = scan_sql_directory(dir.path());
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].csv_name, "query.csv");
    }

    #[test]
    fn test_missing_directory_yields_empty_batch() {
        let dir = TempDir::new().unwrap();
        let tasks = scan_sql_directory(&dir.path().join("nope"));
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_ordering_is_sorted_by_file_name() {
        let dir = TempDir::new().unwrap();
        for name in ["c.sql", "a.sql", "b.sql"] {
            std::fs::write(dir.path().join(name), "SELECT 1;").unwrap();
        }

        let tasks = scan_sql_directory(dir.path());
        let names: Vec<_> = tasks.iter().map(|t| t.csv_name.as_str()).collect();
        assert_eq!(names, ["a.csv", "b.csv", "c.csv"]);
    }
}
