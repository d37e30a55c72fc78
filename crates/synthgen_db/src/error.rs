//! Error types for the metadata store.

use thiserror::Error;

/// Database operation result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error (connection, query, etc.)
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// IO error (file system operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// An insert did not hand back a usable generated id
    #[error("Insert into {table} did not return a generated id (got {got})")]
    MissingId { table: &'static str, got: i64 },

    /// An update-by-id touched zero or several rows
    #[error("Expected to update 1 row for {table} id={id}, but updated {affected}")]
    UnexpectedRowCount {
        table: &'static str,
        id: i64,
        affected: u64,
    },

    /// Invalid state transition
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl DbError {
    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// True for errors that mean the store returned something the caller cannot trust
    /// (missing ids, update counts other than one).
    pub fn is_consistency(&self) -> bool {
        matches!(
            self,
            Self::MissingId { .. } | Self::UnexpectedRowCount { .. } | Self::InvalidState(_)
        )
    }
}
