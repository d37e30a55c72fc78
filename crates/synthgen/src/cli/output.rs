//! Output formatting for CLI commands

use chrono::{DateTime, Utc};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use synthgen::{CleanResult, GeneratedFile, GenerationBatch};

/// Format a file size in human-readable form
///
/// Examples:
/// - 500 -> "500 B"
/// - 1024 -> "1.0 KB"
/// - 1536000 -> "1.5 MB"
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

fn format_opt_ts(ts: Option<&DateTime<Utc>>) -> String {
    ts.map(format_ts).unwrap_or_else(|| "-".to_string())
}

/// Print a table with headers and rows
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }

    println!("{}", table);
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn file_rows(files: &[GeneratedFile]) -> Vec<Vec<String>> {
    files
        .iter()
        .map(|f| {
            vec![
                f.id.to_string(),
                f.batch_id.map(|b| b.to_string()).unwrap_or_else(|| "-".to_string()),
                f.file_name.clone(),
                format_size(f.file_size_bytes),
                format_ts(&f.started_at),
                format_opt_ts(f.finished_at.as_ref()),
            ]
        })
        .collect()
}

pub fn print_files(files: &[GeneratedFile]) {
    if files.is_empty() {
        println!("No files recorded.");
        return;
    }
    print_table(
        &["ID", "BATCH", "NAME", "SIZE", "STARTED", "FINISHED"],
        file_rows(files),
    );
}

pub fn print_batches(batches: &[GenerationBatch]) {
    if batches.is_empty() {
        println!("No generation batches recorded.");
        return;
    }
    let rows = batches
        .iter()
        .map(|b| {
            vec![
                b.id.to_string(),
                b.requested_count.to_string(),
                b.created_count
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                format_ts(&b.started_at),
                format_opt_ts(b.finished_at.as_ref()),
                b.duration_millis
                    .map(|ms| format!("{ms} ms"))
                    .unwrap_or_else(|| "unfinished".to_string()),
            ]
        })
        .collect();
    print_table(
        &["ID", "REQUESTED", "CREATED", "STARTED", "FINISHED", "DURATION"],
        rows,
    );
}

pub fn print_clean(result: &CleanResult) {
    println!(
        "Deleted {} metadata row(s) and {} file(s) on disk.",
        result.deleted_metadata_rows, result.deleted_disk_files
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536 * 1024), "1.5 MB");
    }

    #[test]
    fn test_file_rows_mark_missing_values() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let rows = file_rows(&[GeneratedFile {
            id: 1,
            batch_id: None,
            storage_path: "/s".to_string(),
            file_name: "manual-1.json".to_string(),
            started_at: ts,
            finished_at: None,
            file_size_bytes: 18,
        }]);
        assert_eq!(
            rows[0],
            vec!["1", "-", "manual-1.json", "18 B", "2025-01-02 03:04:05.000", "-"]
        );
    }
}
