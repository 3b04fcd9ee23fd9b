//! Trawler: a polite, fault-tolerant bulk URL scraper
//!
//! This crate fetches batches of URLs with rate limiting, retries and
//! exponential back-off, turns each page into a structured [`Record`] through
//! a pluggable extractor, and persists batches to JSON, CSV/TSV or SQLite. Finished sessions can be
//! summarized into markdown reports and JSON metrics.
//!
//! ```no_run
//! use trawler::{Scraper, ScraperConfig};
//!
//! # async fn example() -> trawler::Result<()> {
//! let scraper = Scraper::new(ScraperConfig::default())?;
//! let session = scraper
//!     .scrape_multiple_urls(&["https://example.com/", "https://example.org/"])
//!     .await;
//! println!("{} ok, {} failed", session.urls_succeeded, session.urls_failed);
//! scraper.save_data(&session.records, "pages.json", "json")?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod extract;
pub mod fetcher;
pub mod limiter;
pub mod output;
pub mod scraper;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Trawler operations
///
/// Per-URL failures never surface here; they are recorded as
/// [`fetcher::ErrorKind`] values inside a [`Session`].
#[derive(Debug, Error)]
pub enum TrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid proxy URL: {0}")]
    InvalidProxy(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

/// Result type alias for Trawler operations
pub type Result<T> = std::result::Result<T, TrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::ScraperConfig;
pub use extract::{Extractor, Fields, Record};
pub use fetcher::{ErrorKind, FetchResult, Fetcher, Request};
pub use limiter::RateLimiter;
pub use output::{MetricsObserver, ScrapingMetrics, SessionSummary};
pub use self::scraper::{AsyncScraper, ScrapeEvent, ScrapeObserver, Scraper, Session, SessionState};
pub use storage::{StorageFormat, StorageWriter, WriteReport};
