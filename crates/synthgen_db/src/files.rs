//! Generated file operations

use crate::error::{DbError, Result};
use crate::types::GeneratedFile;
use crate::SynthgenDb;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::collections::HashSet;

const TABLE: &str = "generated_files";

const FILE_COLUMNS: &str =
    "id, batch_id, storage_path, file_name, started_at, finished_at, size_bytes";

impl SynthgenDb {
    /// Record a file in its started state and return its id.
    ///
    /// `batch_id` is `None` for files found on disk rather than generated.
    pub async fn file_insert_started(
        &self,
        storage_path: &str,
        file_name: &str,
        started_at: DateTime<Utc>,
        batch_id: Option<i64>,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO generated_files (storage_path, file_name, started_at, batch_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(storage_path)
        .bind(file_name)
        .bind(started_at.timestamp_millis())
        .bind(batch_id)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        if id <= 0 {
            return Err(DbError::MissingId { table: TABLE, got: id });
        }
        Ok(id)
    }

    /// Mark a file written, with the size measured on disk. Exactly one row must change.
    pub async fn file_update_finished(
        &self,
        id: i64,
        finished_at: DateTime<Utc>,
        size_bytes: u64,
    ) -> Result<()> {
        let size = i64::try_from(size_bytes).map_err(|_| {
            DbError::invalid_state(format!("File size {size_bytes} does not fit the store"))
        })?;

        let result = sqlx::query(
            "UPDATE generated_files SET finished_at = ?, size_bytes = ? WHERE id = ?",
        )
        .bind(finished_at.timestamp_millis())
        .bind(size)
        .bind(id)
        .execute(&self.pool)
        .await?;

        match result.rows_affected() {
            1 => Ok(()),
            affected => Err(DbError::UnexpectedRowCount {
                table: TABLE,
                id,
                affected,
            }),
        }
    }

    /// Get a file by ID
    pub async fn file_get(&self, id: i64) -> Result<Option<GeneratedFile>> {
        let row = sqlx::query(&format!(
            "SELECT {FILE_COLUMNS} FROM generated_files WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_file))
    }

    /// Most recently started files first; ties go to the higher id.
    pub async fn file_list_latest(&self, limit: u32) -> Result<Vec<GeneratedFile>> {
        let rows = sqlx::query(&format!(
            "SELECT {FILE_COLUMNS} FROM generated_files ORDER BY started_at DESC, id DESC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_file).collect())
    }

    /// Files written by one batch, in insertion order.
    pub async fn file_list_by_batch(&self, batch_id: i64) -> Result<Vec<GeneratedFile>> {
        let rows = sqlx::query(&format!(
            "SELECT {FILE_COLUMNS} FROM generated_files WHERE batch_id = ? ORDER BY id"
        ))
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_file).collect())
    }

    /// Names already recorded for exactly this storage path.
    pub async fn file_names_by_storage_path(&self, storage_path: &str) -> Result<HashSet<String>> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT file_name FROM generated_files WHERE storage_path = ?")
                .bind(storage_path)
                .fetch_all(&self.pool)
                .await?;

        Ok(names.into_iter().collect())
    }

    pub async fn file_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM generated_files")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn row_to_file(row: &sqlx::sqlite::SqliteRow) -> GeneratedFile {
    let finished_millis: Option<i64> = row.get("finished_at");
    let size: i64 = row.get("size_bytes");

    GeneratedFile {
        id: row.get("id"),
        batch_id: row.get("batch_id"),
        storage_path: row.get("storage_path"),
        file_name: row.get("file_name"),
        started_at: SynthgenDb::millis_to_datetime(row.get("started_at")),
        finished_at: finished_millis.map(SynthgenDb::millis_to_datetime),
        file_size_bytes: size.max(0) as u64,
    }
}
