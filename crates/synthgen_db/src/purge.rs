//! Whole-store deletion

use crate::error::Result;
use crate::SynthgenDb;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Rows removed by [`SynthgenDb::purge_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeCounts {
    pub files: u64,
    pub batches: u64,
}

impl SynthgenDb {
    /// Delete every file row, then every batch row, in one transaction.
    pub async fn purge_all(&self) -> Result<PurgeCounts> {
        let mut tx = self.pool.begin().await?;

        let files = sqlx::query("DELETE FROM generated_files")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let batches = sqlx::query("DELETE FROM generation_batches")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        info!(files, batches, "Metadata purged");
        Ok(PurgeCounts { files, batches })
    }
}
