//! Error types for the generation engine

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Engine error type
#[derive(Error, Debug)]
pub enum SynthError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No seed files available: {0}")]
    NoSeeds(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Failed to {action} {}: {source}", path.display())]
    FileIo {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Seed pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("Metadata store error: {0}")]
    Database(#[from] synthgen_db::DbError),
}

/// Broad failure classes an outer surface translates into status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input from the caller; nothing was changed
    InvalidRequest,
    /// Missing seeds or unusable configuration
    Configuration,
    /// Disk read/write/stat/delete failure
    Io,
    /// The metadata store misbehaved
    StoreConsistency,
}

impl SynthError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn file_io(action: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::FileIo {
            action,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SynthError::InvalidArgument(_) => ErrorKind::InvalidRequest,
            SynthError::NoSeeds(_) | SynthError::Config(_) | SynthError::Glob(_) => {
                ErrorKind::Configuration
            }
            SynthError::FileIo { .. } | SynthError::Walk(_) => ErrorKind::Io,
            SynthError::Database(synthgen_db::DbError::Io(_)) => ErrorKind::Io,
            SynthError::Database(_) => ErrorKind::StoreConsistency,
        }
    }

    /// True when the caller, not the system, is at fault.
    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::InvalidRequest
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SynthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert!(SynthError::invalid_argument("count").is_client_error());
        assert_eq!(
            SynthError::NoSeeds("xml".into()).kind(),
            ErrorKind::Configuration
        );
        let err = SynthError::file_io(
            "write",
            "/tmp/x",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.to_string(), "Failed to write /tmp/x: denied");

        let db = SynthError::from(synthgen_db::DbError::UnexpectedRowCount {
            table: "generated_files",
            id: 1,
            affected: 0,
        });
        assert_eq!(db.kind(), ErrorKind::StoreConsistency);
    }
}
