//! Turning fetched pages into records
//!
//! An [`Extractor`] maps one successful [`FetchResult`] to a [`Record`]. The
//! default variant pulls generic page metadata; a custom variant runs a
//! caller-supplied function. Either way a failure is reported as
//! [`ErrorKind::Extraction`] for that URL only.

mod html;
mod text;

pub use html::extract_default;
pub use text::{clean_text, extract_email_addresses, parse_price};

use crate::fetcher::{ErrorKind, FetchResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Extractor-defined fields of a record
pub type Fields = Map<String, Value>;

/// Keys every record carries outside of its extracted fields
pub const RESERVED_KEYS: &[&str] = &["source_url", "fetched_at"];

/// Structured data extracted from one page
///
/// Serializes as a single flat object: `source_url`, `fetched_at`, then the
/// extracted fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// The URL that was requested
    pub source_url: String,

    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,

    /// Extracted values
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    /// Creates a record; reserved keys are dropped from `fields`
    pub fn new(source_url: impl Into<String>, fetched_at: DateTime<Utc>, mut fields: Fields) -> Self {
        for key in RESERVED_KEYS {
            fields.remove(*key);
        }
        Self {
            source_url: source_url.into(),
            fetched_at,
            fields,
        }
    }

    /// Looks up an extracted field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Signature of a caller-supplied extraction function
pub type ExtractFn = dyn Fn(&FetchResult) -> anyhow::Result<Fields> + Send + Sync;

/// How records are produced from pages
#[derive(Clone, Default)]
pub enum Extractor {
    /// Generic page metadata, see [`extract_default`]
    #[default]
    Default,

    /// Caller-supplied function
    Custom(Arc<ExtractFn>),
}

impl Extractor {
    /// Wraps a closure as a custom extractor
    ///
    /// # Examples
    ///
    /// ```
    /// use trawler::extract::{Extractor, Fields};
    /// use serde_json::json;
    ///
    /// let extractor = Extractor::custom(|page| {
    ///     let mut fields = Fields::new();
    ///     fields.insert("length".to_string(), json!(page.body.len()));
    ///     Ok(fields)
    /// });
    /// ```
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&FetchResult) -> anyhow::Result<Fields> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Extracts a record from a fetched page
    ///
    /// # Returns
    ///
    /// * `Ok(Record)` - Fields extracted from the page
    /// * `Err(ErrorKind)` - The fetch itself failed, or the custom function
    ///   returned an error or panicked (`ErrorKind::Extraction`)
    pub fn extract(&self, result: &FetchResult) -> Result<Record, ErrorKind> {
        if let Some(error) = &result.error {
            return Err(error.clone());
        }

        let fields = match self {
            Self::Default => extract_default(result),
            Self::Custom(f) => match catch_unwind(AssertUnwindSafe(|| f(result))) {
                Ok(Ok(fields)) => fields,
                Ok(Err(e)) => {
                    return Err(ErrorKind::Extraction {
                        message: format!("{:#}", e),
                    })
                }
                Err(panic) => {
                    return Err(ErrorKind::Extraction {
                        message: format!("extractor panicked: {}", panic_message(panic.as_ref())),
                    })
                }
            },
        };

        Ok(Record::new(result.url.clone(), result.fetched_at, fields))
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Extractor::Default"),
            Self::Custom(_) => f.write_str("Extractor::Custom(..)"),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
