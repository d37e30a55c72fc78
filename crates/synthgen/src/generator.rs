//! Generation engine: writes a batch of files copied from seeds and records each one.
//!
//! A batch runs strictly in order. Its batch row is inserted first. Each file then
//! gets a started row, its bytes on disk, and a finished row with the measured
//! size. The batch row is finalized together with the last file. Nothing is rolled
//! back on failure: rows for completed files stay, and the batch row keeps a null
//! finish time.

use crate::error::{Result, SynthError};
use crate::seeds::{Seed, SeedCatalog, SeedKind};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use synthgen_db::{GeneratedFile, SynthgenDb};
use tracing::{debug, info};

/// Largest batch a single generate call accepts.
pub const MAX_COUNT: i64 = 1_000;

/// Check a requested count and convert it to a length.
pub fn validate_count(count: i64) -> Result<usize> {
    if !(1..=MAX_COUNT).contains(&count) {
        return Err(SynthError::invalid_argument(format!(
            "count must be between 1 and {MAX_COUNT}, got {count}"
        )));
    }
    Ok(count as usize)
}

/// Shuffled type assignment: `count / 2` XML, the rest (the odd one included) JSON.
pub fn plan_kinds<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<SeedKind> {
    let xml_count = count / 2;
    let json_count = count - xml_count;

    let mut kinds = Vec::with_capacity(count);
    kinds.extend(std::iter::repeat(SeedKind::Xml).take(xml_count));
    kinds.extend(std::iter::repeat(SeedKind::Json).take(json_count));
    kinds.shuffle(rng);
    kinds
}

/// `gen-<yyyyMMdd-HHmmssSSS>-<position>-<hex suffix>.<ext>`, position counted from 1.
pub fn file_name_for<R: Rng + ?Sized>(
    now: DateTime<Utc>,
    index: usize,
    kind: SeedKind,
    rng: &mut R,
) -> String {
    format!(
        "gen-{}-{}-{:x}.{}",
        now.format("%Y%m%d-%H%M%S%3f"),
        index + 1,
        rng.gen::<u64>(),
        kind.extension()
    )
}

/// Writes batches of seed copies into one storage root.
#[derive(Clone)]
pub struct Generator {
    db: SynthgenDb,
    catalog: Arc<SeedCatalog>,
    storage_root: PathBuf,
}

impl Generator {
    pub fn new(db: SynthgenDb, catalog: Arc<SeedCatalog>, storage_root: impl Into<PathBuf>) -> Self {
        Self {
            db,
            catalog,
            storage_root: storage_root.into(),
        }
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Generate `count` files and return their records in generation order.
    pub async fn generate<R: Rng + ?Sized + Send>(
        &self,
        count: i64,
        rng: &mut R,
    ) -> Result<Vec<GeneratedFile>> {
        let count = validate_count(count)?;
        self.catalog.ensure_ready()?;

        let kinds = plan_kinds(count, rng);

        fs::create_dir_all(&self.storage_root)
            .map_err(|e| SynthError::file_io("create directory", &self.storage_root, e))?;
        let storage_path = self.storage_root.to_string_lossy().into_owned();

        let batch_started_at = SynthgenDb::now();
        let batch_id = self
            .db
            .batch_insert_started(count as i64, batch_started_at)
            .await?;
        let clock = Instant::now();

        info!(
            batch_id,
            count,
            xml = count / 2,
            json = count - count / 2,
            storage = %storage_path,
            "Generation batch started"
        );

        let mut results = Vec::with_capacity(count);
        for (index, kind) in kinds.into_iter().enumerate() {
            let seed = self.catalog.pick(kind, rng)?;
            let file_name = file_name_for(SynthgenDb::now(), index, kind, rng);

            // The first file shares the batch's start instant.
            let started_at = if index == 0 {
                batch_started_at
            } else {
                SynthgenDb::now()
            };

            let id = self
                .db
                .file_insert_started(&storage_path, &file_name, started_at, Some(batch_id))
                .await?;

            let target = self.storage_root.join(&file_name);
            let size = write_seed(seed, &target)?;

            let finished_at = SynthgenDb::now();
            self.db.file_update_finished(id, finished_at, size).await?;

            debug!(batch_id, id, file = %file_name, seed = seed.name(), size, "File generated");

            if index + 1 == count {
                self.db
                    .batch_update_finished(batch_id, finished_at, count as i64)
                    .await?;
            }

            results.push(GeneratedFile {
                id,
                batch_id: Some(batch_id),
                storage_path: storage_path.clone(),
                file_name,
                started_at,
                finished_at: Some(finished_at),
                file_size_bytes: size,
            });
        }

        info!(
            batch_id,
            count,
            elapsed_ms = clock.elapsed().as_millis() as u64,
            "Generation batch finished"
        );

        Ok(results)
    }
}

/// Stream the seed into `target`, replacing any existing file, and return the size on disk.
fn write_seed(seed: &Seed, target: &Path) -> Result<u64> {
    let mut reader = seed
        .open()
        .map_err(|e| SynthError::file_io("open seed", seed.name(), e))?;
    let mut file =
        File::create(target).map_err(|e| SynthError::file_io("create file", target, e))?;
    io::copy(&mut reader, &mut file).map_err(|e| SynthError::file_io("write file", target, e))?;
    drop(file);

    fs::metadata(target)
        .map(|meta| meta.len())
        .map_err(|e| SynthError::file_io("read size of", target, e))
}
