//! Database schema definitions
//!
//! This module contains the SQL schema used by the `sql` and `document`
//! storage formats.

/// SQL schema for the record database
pub const SCHEMA_SQL: &str = r#"
-- One row per scraped page, keyed by the requested URL
CREATE TABLE IF NOT EXISTS scraped_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_url TEXT NOT NULL UNIQUE,
    fetched_at TEXT NOT NULL,
    title TEXT,
    status_code INTEGER,
    content TEXT NOT NULL,
    stored_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_scraped_data_fetched ON scraped_data(fetched_at);

-- Document collection: each record stored whole as JSON
CREATE TABLE IF NOT EXISTS documents (
    source_url TEXT PRIMARY KEY,
    document TEXT NOT NULL,
    stored_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
