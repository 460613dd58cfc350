//! CSV artifact writer.
//!
//! Comma-separated, double-quote quoting, header row of column names, one
//! row per result row. SQL NULL is rendered as an empty field. The pack
//! carries no CSV crate, so the quoting rules live here.

use std::io::Write;
use std::path::Path;

/// Quotes a field when it contains a comma, a quote or a line break;
/// embedded quotes are doubled.
fn format_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn format_row(fields: impl Iterator<Item = String>) -> String {
    let mut line = fields.collect::<Vec<_>>().join(",");
    line.push('\n');
    line
}

/// Writes a complete CSV artifact and returns its byte size.
///
/// `rows` holds stringified values; `None` is a SQL NULL.
pub fn write_csv(
    path: &Path,
    columns: &[String],
    rows: &[Vec<Option<String>>],
) -> std::io::Result<u64> {
    let mut file = std::fs::File::create(path)?;
    let mut written: u64 = 0;

    let header = format_row(columns.iter().map(|c| format_field(c)));
    file.write_all(header.as_bytes())?;
    written += header.len() as u64;

    for row in rows {
        let line = format_row(
            row.iter()
                .map(|v| v.as_deref().map(format_field).unwrap_or_default()),
        );
        file.write_all(line.as_bytes())?;
        written += line.len() as u64;
    }

    file.flush()?;
    Ok(written)
}
