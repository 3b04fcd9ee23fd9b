//! Storage module for persisting scraped records
//!
//! This module handles writing record batches to their destination, including:
//! - Format selection from a tag (`json`, `csv`, `tsv`, `sql`, `document`)
//! - Flattening heterogeneous records for delimited output
//! - Timestamped backups of an existing destination file
//! - Atomic replacement of file outputs
//! - SQLite upserts for the database formats
//! - Reading saved files back

mod backup;
mod delimited;
mod flatten;
mod format;
mod json;
mod schema;
mod sqlite;
mod traits;

pub use backup::{backup_existing, write_atomically};
pub use delimited::{load_delimited, DelimitedEncoder};
pub use flatten::flatten_record;
pub use format::StorageFormat;
pub use json::{load_json, JsonEncoder};
pub use sqlite::SqliteSink;
pub use traits::{RecordEncoder, StorageError, StorageResult};

use crate::config::StorageConfig;
use crate::extract::Record;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of a successful save
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    /// Where the records went
    pub destination: PathBuf,

    /// Format that was written
    pub format: StorageFormat,

    /// Number of records stored
    pub records_written: usize,

    /// Copy of the previous destination, if one was made
    pub backup_path: Option<PathBuf>,
}

/// Writes record batches to files or databases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageWriter {
    backup: bool,
}

impl StorageWriter {
    /// Creates a writer
    ///
    /// # Arguments
    ///
    /// * `backup` - Copy an existing destination file aside before replacing it
    pub fn new(backup: bool) -> Self {
        Self { backup }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.backup)
    }

    pub fn backup_enabled(&self) -> bool {
        self.backup
    }

    /// Saves records in the format named by `format`
    ///
    /// # Arguments
    ///
    /// * `records` - Records to save; field sets may differ between records
    /// * `destination` - File path (database file for `sql`/`document`)
    /// * `format` - Format tag or alias
    ///
    /// # Returns
    ///
    /// * `Ok(WriteReport)` - What was written and where
    /// * `Err(StorageError::UnsupportedFormat)` - Unknown tag; nothing is touched
    /// * `Err(StorageError)` - Filesystem or database failure
    pub fn save(
        &self,
        records: &[Record],
        destination: impl AsRef<Path>,
        format: &str,
    ) -> StorageResult<WriteReport> {
        let format: StorageFormat = format.parse()?;
        self.save_as(records, destination, format)
    }

    /// Saves records in an already parsed format
    pub fn save_as(
        &self,
        records: &[Record],
        destination: impl AsRef<Path>,
        format: StorageFormat,
    ) -> StorageResult<WriteReport> {
        let destination = destination.as_ref();

        // Database formats merge in place, so only whole files are backed up
        let (records_written, backup_path) = if format.is_file_based() {
            match format.delimiter() {
                Some(delimiter) => {
                    self.save_file(records, destination, &DelimitedEncoder::new(delimiter))?
                }
                None => self.save_file(records, destination, &JsonEncoder)?,
            }
        } else if format == StorageFormat::Document {
            (SqliteSink::open(destination)?.upsert_documents(records)?, None)
        } else {
            (SqliteSink::open(destination)?.upsert_rows(records)?, None)
        };

        tracing::info!(
            records = records_written,
            destination = %destination.display(),
            format = %format,
            "Saved records"
        );

        Ok(WriteReport {
            destination: destination.to_path_buf(),
            format,
            records_written,
            backup_path,
        })
    }

    /// Backs up (when enabled) and then atomically replaces a file output
    fn save_file(
        &self,
        records: &[Record],
        destination: &Path,
        encoder: &dyn RecordEncoder,
    ) -> StorageResult<(usize, Option<PathBuf>)> {
        let backup_path = if self.backup {
            backup_existing(destination)?
        } else {
            None
        };

        write_atomically(destination, |out| encoder.encode(records, out))?;
        Ok((records.len(), backup_path))
    }
}

impl Default for StorageWriter {
    fn default() -> Self {
        Self::new(true)
    }
}
