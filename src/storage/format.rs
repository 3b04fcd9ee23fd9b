use crate::storage::StorageError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Output format selected by a format tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageFormat {
    /// Pretty-printed JSON array of flat record objects
    Json,
    /// Comma-separated, header is the union of all keys
    Csv,
    /// Tab-separated with the CSV schema (tag `tabular` is an alias)
    Tsv,
    /// SQLite `scraped_data` table, one row per record (alias `sqlite`)
    Sql,
    /// SQLite `documents` collection of JSON documents (aliases `mongodb`, `mongo`)
    Document,
}

impl StorageFormat {
    /// Canonical tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Sql => "sql",
            Self::Document => "document",
        }
    }

    /// Returns true for formats written as a whole file
    pub fn is_file_based(&self) -> bool {
        matches!(self, Self::Json | Self::Csv | Self::Tsv)
    }

    /// Field delimiter for the delimited formats
    pub fn delimiter(&self) -> Option<u8> {
        match self {
            Self::Csv => Some(b','),
            Self::Tsv => Some(b'\t'),
            _ => None,
        }
    }
}

impl FromStr for StorageFormat {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "tsv" | "tabular" => Ok(Self::Tsv),
            "sql" | "sqlite" => Ok(Self::Sql),
            "document" | "mongodb" | "mongo" => Ok(Self::Document),
            _ => Err(StorageError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
