//! CSV and TSV output
//!
//! Records may carry different field sets, so the header is built from all
//! of them: `source_url`, `fetched_at`, then every other flattened key in
//! sorted order. A record without a column gets an empty cell.

use crate::extract::Record;
use crate::storage::flatten::flatten_record;
use crate::storage::traits::{RecordEncoder, StorageResult};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;

const LEADING_COLUMNS: [&str; 2] = ["source_url", "fetched_at"];

/// Delimited text encoder
#[derive(Debug, Clone, Copy)]
pub struct DelimitedEncoder {
    delimiter: u8,
}

impl DelimitedEncoder {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn csv() -> Self {
        Self::new(b',')
    }

    pub fn tsv() -> Self {
        Self::new(b'\t')
    }
}

impl RecordEncoder for DelimitedEncoder {
    fn encode(&self, records: &[Record], out: &mut dyn Write) -> StorageResult<()> {
        let rows: Vec<BTreeMap<String, String>> = records.iter().map(flatten_record).collect();
        let header = header_for(&rows);

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(out);

        writer.write_record(&header)?;
        for row in &rows {
            writer.write_record(
                header
                    .iter()
                    .map(|column| row.get(column).map(String::as_str).unwrap_or("")),
            )?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Union of all keys, with the traceability columns first
fn header_for(rows: &[BTreeMap<String, String>]) -> Vec<String> {
    let others: BTreeSet<&String> = rows
        .iter()
        .flat_map(|row| row.keys())
        .filter(|key| !LEADING_COLUMNS.contains(&key.as_str()))
        .collect();

    LEADING_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(others.into_iter().cloned())
        .collect()
}

/// Reads a delimited file back as one map per row, keyed by header
pub fn load_delimited(path: &Path, delimiter: u8) -> StorageResult<Vec<BTreeMap<String, String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}
