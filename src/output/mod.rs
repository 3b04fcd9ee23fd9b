//! Reporting on finished and running scrapes
//!
//! This module handles:
//! - Summarizing a [`Session`](crate::Session) into report-friendly counts
//! - Collecting live metrics and alerts through a [`MetricsObserver`]
//! - Rendering markdown reports and exporting metrics as JSON

mod markdown;
mod metrics;
mod summary;

pub use markdown::{format_markdown_report, write_markdown_report};
pub use metrics::{MetricsObserver, ScrapingMetrics};
pub use summary::{FailedUrl, SessionSummary};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
