//! Generation batch operations

use crate::error::{DbError, Result};
use crate::types::GenerationBatch;
use crate::SynthgenDb;
use chrono::{DateTime, Utc};
use sqlx::Row;

const TABLE: &str = "generation_batches";

impl SynthgenDb {
    /// Record the start of a batch and return its id.
    pub async fn batch_insert_started(
        &self,
        requested_count: i64,
        started_at: DateTime<Utc>,
    ) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO generation_batches (requested_count, started_at) VALUES (?, ?)",
        )
        .bind(requested_count)
        .bind(started_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        if id <= 0 {
            return Err(DbError::MissingId { table: TABLE, got: id });
        }
        Ok(id)
    }

    /// Mark a batch finished. Exactly one row must change.
    pub async fn batch_update_finished(
        &self,
        id: i64,
        finished_at: DateTime<Utc>,
        created_count: i64,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE generation_batches SET finished_at = ?, created_count = ? WHERE id = ?",
        )
        .bind(finished_at.timestamp_millis())
        .bind(created_count)
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

    /// Get a batch by ID
    pub async fn batch_get(&self, id: i64) -> Result<Option<GenerationBatch>> {
        let row = sqlx::query(
            "SELECT id, requested_count, created_count, started_at, finished_at FROM generation_batches WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_batch))
    }

    /// Newest batches first.
    pub async fn batch_list_latest(&self, limit: u32) -> Result<Vec<GenerationBatch>> {
        let rows = sqlx::query(
            r#"
            SELECT id, requested_count, created_count, started_at, finished_at
            FROM generation_batches
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_batch).collect())
    }

    pub async fn batch_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM generation_batches")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn row_to_batch(row: &sqlx::sqlite::SqliteRow) -> GenerationBatch {
    let started_millis: i64 = row.get("started_at");
    let finished_millis: Option<i64> = row.get("finished_at");

    GenerationBatch {
        id: row.get("id"),
        requested_count: row.get("requested_count"),
        created_count: row.get("created_count"),
        started_at: SynthgenDb::millis_to_datetime(started_millis),
        finished_at: finished_millis.map(SynthgenDb::millis_to_datetime),
        duration_millis: finished_millis.map(|finished| finished - started_millis),
    }
}
