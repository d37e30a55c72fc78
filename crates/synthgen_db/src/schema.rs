//! Table creation for the metadata store.
//!
//! All CREATE TABLE statements live here.

use crate::error::Result;
use crate::SynthgenDb;
use tracing::info;

impl SynthgenDb {
    /// Ensure all tables exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&self.pool)
            .await?;
        sqlx::query("PRAGMA synchronous=NORMAL")
            .execute(&self.pool)
            .await?;

        self.create_batch_tables().await?;
        self.create_file_tables().await?;

        info!("Database schema verified");
        Ok(())
    }

    /// One row per generate request.
    async fn create_batch_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS generation_batches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                requested_count INTEGER NOT NULL,
                created_count INTEGER,
                started_at INTEGER NOT NULL,
                finished_at INTEGER
            )"#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// One row per file, generated or discovered on disk.
    async fn create_file_tables(&self) -> Result<()> {
        // (storage_path, file_name) is unique by convention only; the reconciler
        // checks names before inserting.
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS generated_files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                batch_id INTEGER REFERENCES generation_batches(id),
                storage_path TEXT NOT NULL,
                file_name TEXT NOT NULL,
                started_at INTEGER NOT NULL,
                finished_at INTEGER,
                size_bytes INTEGER NOT NULL DEFAULT 0
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_files_location ON generated_files(storage_path, file_name)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_files_started ON generated_files(started_at DESC, id DESC)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_batch ON generated_files(batch_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
