//! The operations offered to outer surfaces (CLI, HTTP): generate, list, reconcile, clean.
//!
//! `SynthService` owns nothing the components don't already own; it validates
//! caller input, hands each batch its own RNG, and wires the pieces to one
//! storage root.

use crate::cleanup::{CleanResult, Cleaner};
use crate::config::SynthgenConfig;
use crate::error::{Result, SynthError};
use crate::generator::Generator;
use crate::reconciler::{ReconcileStats, Reconciler};
use crate::seeds::{BundledSeeds, DirectorySeeds, SeedCatalog};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use synthgen_db::{GeneratedFile, GenerationBatch, SynthgenDb};

/// Upper bound for `list_files` and `reconcile_and_list_files`.
pub const MAX_FILE_LIMIT: i64 = 5_000;
/// Upper bound for `list_batches`.
pub const MAX_BATCH_LIMIT: i64 = 1_000;

pub const DEFAULT_FILE_LIMIT: i64 = 200;
pub const DEFAULT_BATCH_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct SynthService {
    db: SynthgenDb,
    generator: Generator,
    reconciler: Reconciler,
    cleaner: Cleaner,
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl SynthService {
    /// Wire the components. `rng_seed` makes every batch reproducible.
    pub fn new(
        db: SynthgenDb,
        catalog: SeedCatalog,
        storage_root: impl Into<PathBuf>,
        rng_seed: Option<u64>,
    ) -> Self {
        let storage_root = storage_root.into();
        let catalog = Arc::new(catalog);
        let rng = match rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Self {
            generator: Generator::new(db.clone(), catalog, storage_root.clone()),
            reconciler: Reconciler::new(db.clone(), storage_root.clone()),
            cleaner: Cleaner::new(db.clone(), storage_root),
            db,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// Open the store, check it answers, load seeds and resolve the storage root.
    pub async fn from_config(config: &SynthgenConfig) -> Result<Self> {
        let db = SynthgenDb::open(&config.database.path).await?;
        db.ping().await?;

        let catalog = match &config.seeds.dir {
            Some(dir) => SeedCatalog::load(&DirectorySeeds::new(dir))?,
            None => SeedCatalog::load(&BundledSeeds)?,
        };

        Ok(Self::new(db, catalog, config.storage_root()?, config.rng_seed))
    }

    pub fn db(&self) -> &SynthgenDb {
        &self.db
    }

    pub fn storage_root(&self) -> &Path {
        self.generator.storage_root()
    }

    /// Generate `count` files (1..=1000) and return them in generation order.
    pub async fn generate(&self, count: i64) -> Result<Vec<GeneratedFile>> {
        let mut rng = self.batch_rng()?;
        self.generator.generate(count, &mut rng).await
    }

    /// Latest files, newest start first (limit 1..=5000).
    pub async fn list_files(&self, limit: i64) -> Result<Vec<GeneratedFile>> {
        let limit = check_limit(limit, MAX_FILE_LIMIT)?;
        Ok(self.db.file_list_latest(limit).await?)
    }

    /// Latest batches, newest first (limit 1..=1000).
    pub async fn list_batches(&self, limit: i64) -> Result<Vec<GenerationBatch>> {
        let limit = check_limit(limit, MAX_BATCH_LIMIT)?;
        Ok(self.db.batch_list_latest(limit).await?)
    }

    pub async fn reconcile(&self) -> Result<ReconcileStats> {
        self.reconciler.reconcile().await
    }

    /// Reconcile the storage root, then list as `list_files` does.
    pub async fn reconcile_and_list_files(&self, limit: i64) -> Result<Vec<GeneratedFile>> {
        let limit = check_limit(limit, MAX_FILE_LIMIT)?;
        self.reconciler.reconcile().await?;
        Ok(self.db.file_list_latest(limit).await?)
    }

    pub async fn clean_all(&self) -> Result<CleanResult> {
        self.cleaner.clean_all().await
    }

    /// Child generator for one batch, split off the shared master.
    fn batch_rng(&self) -> Result<ChaCha8Rng> {
        let mut master = self
            .rng
            .lock()
            .map_err(|_| SynthError::Config("random source lock poisoned".to_string()))?;
        ChaCha8Rng::from_rng(&mut *master)
            .map_err(|e| SynthError::Config(format!("failed to derive batch rng: {e}")))
    }
}

fn check_limit(limit: i64, max: i64) -> Result<u32> {
    if !(1..=max).contains(&limit) {
        return Err(SynthError::invalid_argument(format!(
            "limit must be between 1 and {max}, got {limit}"
        )));
    }
    Ok(limit as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_limit() {
        assert_eq!(check_limit(1, MAX_FILE_LIMIT).unwrap(), 1);
        assert_eq!(check_limit(5_000, MAX_FILE_LIMIT).unwrap(), 5_000);
        assert!(check_limit(0, MAX_FILE_LIMIT).is_err());
        assert!(check_limit(5_001, MAX_FILE_LIMIT).is_err());
        assert!(check_limit(1_001, MAX_BATCH_LIMIT).is_err());
        assert!(check_limit(-5, MAX_BATCH_LIMIT)
            .unwrap_err()
            .is_client_error());
    }

    #[test]
    fn test_defaults_within_bounds() {
        assert!(check_limit(DEFAULT_FILE_LIMIT, MAX_FILE_LIMIT).is_ok());
        assert!(check_limit(DEFAULT_BATCH_LIMIT, MAX_BATCH_LIMIT).is_ok());
    }
}
