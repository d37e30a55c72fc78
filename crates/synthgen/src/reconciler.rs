//! Filesystem reconciler: backfills rows for files that appeared in the storage root
//! without going through the generator.
//!
//! Only the top level of the root is scanned. Existing rows are never touched; a
//! file is skipped as soon as its name is already recorded for the root's path.

use crate::error::{Result, SynthError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use synthgen_db::SynthgenDb;
use tracing::{debug, info, warn};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileStats {
    /// Regular files seen in the root
    pub scanned: u64,
    /// Rows added for previously unknown names
    pub inserted: u64,
    /// Files whose name was already recorded
    pub skipped: u64,
}

#[derive(Clone)]
pub struct Reconciler {
    db: SynthgenDb,
    storage_root: PathBuf,
}

impl Reconciler {
    pub fn new(db: SynthgenDb, storage_root: impl Into<PathBuf>) -> Self {
        Self {
            db,
            storage_root: storage_root.into(),
        }
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Record every unknown regular file directly under the storage root.
    ///
    /// A missing root is not an error; there is simply nothing to reconcile.
    pub async fn reconcile(&self) -> Result<ReconcileStats> {
        let root = &self.storage_root;
        let mut stats = ReconcileStats::default();

        if !root.exists() {
            debug!(root = %root.display(), "Storage root absent, nothing to reconcile");
            return Ok(stats);
        }

        let storage_path = root.to_string_lossy().into_owned();
        let known = self.db.file_names_by_storage_path(&storage_path).await?;

        let entries =
            fs::read_dir(root).map_err(|e| SynthError::file_io("list directory", root, e))?;

        for entry in entries {
            let entry = entry.map_err(|e| SynthError::file_io("list directory", root, e))?;
            let path = entry.path();

            // fs::metadata follows symlinks, so a link to a regular file counts. An
            // entry that cannot be stat'ed (dangling link, removed meanwhile) is not one.
            let meta = match fs::metadata(&path) {
                Ok(meta) if meta.is_file() => meta,
                Ok(_) => continue,
                Err(e) => {
                    if e.kind() == io::ErrorKind::NotFound {
                        debug!(path = %path.display(), "Entry vanished or dangles, skipping");
                    } else {
                        warn!(path = %path.display(), error = %e, "Cannot stat entry, skipping");
                    }
                    continue;
                }
            };
            stats.scanned += 1;

            let file_name = entry.file_name().to_string_lossy().into_owned();
            if known.contains(&file_name) {
                stats.skipped += 1;
                continue;
            }

            let modified_at = modification_time(&path, &meta);
            let size = meta.len();

            let id = self
                .db
                .file_insert_started(&storage_path, &file_name, modified_at, None)
                .await?;
            self.db.file_update_finished(id, modified_at, size).await?;
            stats.inserted += 1;

            debug!(id, file = %file_name, size, "Backfilled file found on disk");
        }

        info!(
            root = %storage_path,
            scanned = stats.scanned,
            inserted = stats.inserted,
            skipped = stats.skipped,
            "Storage root reconciled"
        );
        Ok(stats)
    }
}

/// Modification time in UTC at store precision, or now when the platform cannot say.
fn modification_time(path: &Path, meta: &fs::Metadata) -> DateTime<Utc> {
    match meta.modified() {
        Ok(mtime) => SynthgenDb::truncate_to_millis(DateTime::<Utc>::from(mtime)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Modification time unavailable, using now");
            SynthgenDb::now()
        }
    }
}
