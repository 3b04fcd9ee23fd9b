//! SQLite record sinks
//!
//! Both database formats merge into the destination database: saving a
//! record whose `source_url` is already stored replaces that row.

use crate::extract::Record;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::StorageResult;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite-backed record store
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Upserts records into the `scraped_data` table
    ///
    /// The `title` and `status_code` fields are lifted into their own
    /// columns when present; all fields are kept as JSON in `content`.
    pub fn upsert_rows(&mut self, records: &[Record]) -> StorageResult<usize> {
        let stored_at = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO scraped_data (source_url, fetched_at, title, status_code, content, stored_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(source_url) DO UPDATE SET
                    fetched_at = excluded.fetched_at,
                    title = excluded.title,
                    status_code = excluded.status_code,
                    content = excluded.content,
                    stored_at = excluded.stored_at",
            )?;
            for record in records {
                let title = record.get("title").and_then(|v| v.as_str());
                let status_code = record.get("status_code").and_then(|v| v.as_i64());
                let content = serde_json::to_string(&record.fields)?;
                stmt.execute(params![
                    record.source_url,
                    record.fetched_at.to_rfc3339(),
                    title,
                    status_code,
                    content,
                    stored_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Upserts records as JSON documents into the `documents` collection
    pub fn upsert_documents(&mut self, records: &[Record]) -> StorageResult<usize> {
        let stored_at = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO documents (source_url, document, stored_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(source_url) DO UPDATE SET
                    document = excluded.document,
                    stored_at = excluded.stored_at",
            )?;
            for record in records {
                let document = serde_json::to_string(record)?;
                stmt.execute(params![record.source_url, document, stored_at])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Loads every stored document, ordered by URL
    pub fn load_documents(&self) -> StorageResult<Vec<Record>> {
        let mut stmt = self
            .conn
            .prepare("SELECT document FROM documents ORDER BY source_url")?;
        let documents = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        documents
            .iter()
            .map(|doc| serde_json::from_str(doc).map_err(Into::into))
            .collect()
    }

    /// Number of rows in the `scraped_data` table
    pub fn count_rows(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM scraped_data", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
