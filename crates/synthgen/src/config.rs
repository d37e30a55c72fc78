//! Configuration for synthgen

use crate::error::{Result, SynthError};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use synthgen_logging::Rotation;

/// Subdirectory of the storage location that the engine owns.
pub const GENERATED_DIR: &str = "generated";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthgenConfig {
    /// Fixed seed for the random source; entropy when absent
    #[serde(default)]
    pub rng_seed: Option<u64>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub seeds: SeedConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory; files live in `<location>/generated`
    #[serde(default = "default_storage_location")]
    pub location: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Directory holding `xml/` and `json/` seed folders. Bundled seeds when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log directory; `<synthgen home>/logs` when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Archived log files kept next to the live one
    #[serde(default = "default_keep_files")]
    pub keep_files: usize,

    #[serde(default = "default_max_file_mb")]
    pub max_file_mb: u64,
}

fn default_keep_files() -> usize {
    Rotation::default().keep
}

fn default_max_file_mb() -> u64 {
    Rotation::default().max_bytes / (1024 * 1024)
}

fn default_storage_location() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_database_path() -> PathBuf {
    synthgen_logging::synthgen_home().join("synthgen.sqlite3")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            location: default_storage_location(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            keep_files: default_keep_files(),
            max_file_mb: default_max_file_mb(),
        }
    }
}

impl LoggingConfig {
    pub fn rotation(&self) -> Rotation {
        Rotation {
            keep: self.keep_files,
            max_bytes: self.max_file_mb.saturating_mul(1024 * 1024),
        }
    }
}

impl SynthgenConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SynthError::file_io("read config", path, e))?;
        toml::from_str(&content).map_err(|e| SynthError::Config(e.to_string()))
    }

    /// Defaults, then the optional file, then environment overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `SYNTHGEN_*` overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(location) = lookup("SYNTHGEN_STORAGE_LOCATION") {
            self.storage.location = PathBuf::from(location);
        }
        if let Some(path) = lookup("SYNTHGEN_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("SYNTHGEN_SEEDS_DIR") {
            self.seeds.dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = lookup("SYNTHGEN_LOG_DIR") {
            self.logging.dir = Some(PathBuf::from(dir));
        }
        if let Some(seed) = lookup("SYNTHGEN_RNG_SEED") {
            let parsed = seed
                .parse()
                .map_err(|_| SynthError::Config(format!("SYNTHGEN_RNG_SEED is not a u64: {seed}")))?;
            self.rng_seed = Some(parsed);
        }
        Ok(())
    }

    /// Absolute, normalized `<location>/generated`.
    pub fn storage_root(&self) -> Result<PathBuf> {
        resolve_storage_root(&self.storage.location)
    }
}

/// Turn a configured base directory into the absolute generated-files root.
pub fn resolve_storage_root(location: &Path) -> Result<PathBuf> {
    let base = if location.is_absolute() {
        location.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| SynthError::file_io("resolve current directory for", location, e))?
            .join(location)
    };
    Ok(normalize_lexically(&base.join(GENERATED_DIR)))
}

/// Remove `.` and resolve `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
