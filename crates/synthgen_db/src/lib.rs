//! Metadata store for synthgen
//!
//! Durable records for generation batches and the files they produce. Every other
//! crate goes through [`SynthgenDb`]; nothing else talks to the pool directly.
//!
//! # Usage
//!
//! ```rust,ignore
//! use synthgen_db::{SynthgenDb, Result};
//!
//! let db = SynthgenDb::open("~/.synthgen/synthgen.sqlite3").await?;
//!
//! let batch_id = db.batch_insert_started(6, SynthgenDb::now()).await?;
//! let files = db.file_list_latest(200).await?;
//! ```

mod error;
mod schema;
mod types;

// Method implementations organized by table
mod batches;
mod files;
mod purge;

pub use error::{DbError, Result};
pub use purge::PurgeCounts;
pub use types::*;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

/// Handle to the metadata store.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct SynthgenDb {
    pool: SqlitePool,
}

impl SynthgenDb {
    /// Open or create a database at the given path.
    ///
    /// Creates all tables if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let url = format!("sqlite:{}?mode=rwc", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;

        info!(path = %path.display(), "Database opened");

        Ok(db)
    }

    /// Open an existing database (fails if not exists).
    pub async fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DbError::not_found(format!(
                "Database not found: {}",
                path.display()
            )));
        }

        let url = format!("sqlite:{}?mode=rw", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Round-trip a trivial query so a broken store is found at startup rather than
    /// on the first real request.
    pub async fn ping(&self) -> Result<()> {
        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        if one != 1 {
            return Err(DbError::invalid_state(format!(
                "Startup check returned {one} instead of 1"
            )));
        }
        Ok(())
    }

    /// Close the database connection.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

// Timestamp utilities
impl SynthgenDb {
    /// Current UTC time truncated to the millisecond precision the store keeps.
    pub fn now() -> DateTime<Utc> {
        Self::millis_to_datetime(Utc::now().timestamp_millis())
    }

    /// Convert milliseconds to DateTime.
    pub fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }

    /// Drop sub-millisecond precision so a value survives a store round trip unchanged.
    pub fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
        Self::millis_to_datetime(ts.timestamp_millis())
    }
}
