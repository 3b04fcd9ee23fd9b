//! Storage traits and error types
//!
//! This module defines the encoder interface shared by the file-based
//! formats and the errors a save can fail with.

use crate::extract::Record;
use std::io::Write;
use thiserror::Error;

/// Errors that can occur while saving or loading records
///
/// Unlike per-URL failures these abort the whole call and are returned to
/// the caller.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to replace destination: {0}")]
    Persist(#[from] tempfile::PersistError),
}

impl StorageError {
    /// Returns true for filesystem and permission failures
    pub fn is_io(&self) -> bool {
        match self {
            Self::Io(_) | Self::Persist(_) => true,
            Self::Csv(e) => e.is_io_error(),
            Self::Json(e) => e.is_io(),
            _ => false,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Serializes a batch of records into a byte stream
///
/// Implemented by the file-based formats. The writer handles backups and
/// atomic replacement, so encoders only ever see a fresh temporary file.
pub trait RecordEncoder {
    /// Writes every record to `out`
    ///
    /// # Arguments
    ///
    /// * `records` - Records in the order they should appear
    /// * `out` - Destination stream
    fn encode(&self, records: &[Record], out: &mut dyn Write) -> StorageResult<()>;
}
