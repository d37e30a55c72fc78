//! Cleanup coordinator: empties the storage root and purges all metadata.

use crate::error::{Result, SynthError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use synthgen_db::SynthgenDb;
use tracing::{debug, info};
use walkdir::WalkDir;

/// What a clean removed. The two counts are measured independently and need not match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanResult {
    pub deleted_metadata_rows: u64,
    pub deleted_disk_files: u64,
}

#[derive(Clone)]
pub struct Cleaner {
    db: SynthgenDb,
    storage_root: PathBuf,
}

impl Cleaner {
    pub fn new(db: SynthgenDb, storage_root: impl Into<PathBuf>) -> Self {
        Self {
            db,
            storage_root: storage_root.into(),
        }
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Delete everything under the root, recreate it empty, then drop all rows.
    ///
    /// The first failed deletion aborts; whatever was already removed stays removed.
    pub async fn clean_all(&self) -> Result<CleanResult> {
        let root = &self.storage_root;

        let deleted_disk_files = if root.exists() {
            remove_tree_contents(root)?
        } else {
            0
        };

        fs::create_dir_all(root).map_err(|e| SynthError::file_io("create directory", root, e))?;

        let purged = self.db.purge_all().await?;

        let result = CleanResult {
            deleted_metadata_rows: purged.files,
            deleted_disk_files,
        };
        info!(
            root = %root.display(),
            deleted_metadata_rows = result.deleted_metadata_rows,
            deleted_batches = purged.batches,
            deleted_disk_files = result.deleted_disk_files,
            "Storage cleaned"
        );
        Ok(result)
    }
}

/// Remove every entry below `root` (not `root` itself), deepest paths first.
/// Returns how many regular files were removed, symlinks to regular files included.
fn remove_tree_contents(root: &Path) -> Result<u64> {
    let mut entries = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .collect::<std::result::Result<Vec<_>, walkdir::Error>>()?;

    // Stable sort keeps walk order among siblings at the same depth.
    entries.sort_by(|a, b| b.depth().cmp(&a.depth()));

    let mut deleted_files = 0;
    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type();

        // A link to a regular file counts as one; only the link itself is removed.
        let counts_as_file = if file_type.is_symlink() {
            fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
        } else {
            file_type.is_file()
        };

        let removed = if file_type.is_dir() {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        };

        match removed {
            Ok(()) => {
                if counts_as_file {
                    deleted_files += 1;
                }
                debug!(path = %path.display(), "Deleted");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(SynthError::file_io("delete", path, e)),
        }
    }

    Ok(deleted_files)
}
