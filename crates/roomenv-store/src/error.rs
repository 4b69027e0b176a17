//! Error types for roomenv-store.

use std::path::PathBuf;

/// Result type for roomenv-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in roomenv-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Requested range would produce more buckets than allowed.
    #[error("too much data requested: {requested} samples > {max}")]
    TooManyRows { requested: i64, max: u32 },

    /// Differential reference room has no series.
    #[error("reference room not found: {0}")]
    ReferenceNotFound(String),
}
