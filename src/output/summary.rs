use crate::scraper::{Session, SessionState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Failed URL with a readable reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUrl {
    pub url: String,
    pub kind: String,
    pub message: String,
}

/// Report-friendly digest of a finished session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    // Run metadata
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
    pub state: SessionState,

    // Counts
    pub urls_total: usize,
    pub urls_succeeded: usize,
    pub urls_failed: usize,
    pub records: usize,

    // Error summary (kind -> count)
    pub errors_by_kind: BTreeMap<String, u64>,

    // Failures in input order
    pub failed_urls: Vec<FailedUrl>,
}

impl SessionSummary {
    /// Builds a summary from a session
    pub fn from_session(session: &Session) -> Self {
        let mut errors_by_kind = BTreeMap::new();
        let mut failed_urls = Vec::with_capacity(session.errors.len());
        for (url, kind) in &session.errors {
            *errors_by_kind.entry(kind.name().to_string()).or_insert(0) += 1;
            failed_urls.push(FailedUrl {
                url: url.clone(),
                kind: kind.name().to_string(),
                message: kind.to_string(),
            });
        }

        Self {
            started_at: session.started_at,
            finished_at: session.finished_at,
            duration_seconds: session
                .duration()
                .map(|d| d.num_milliseconds() as f64 / 1000.0),
            state: session.state,
            urls_total: session.urls_total,
            urls_succeeded: session.urls_succeeded,
            urls_failed: session.urls_failed,
            records: session.records.len(),
            errors_by_kind,
            failed_urls,
        }
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.urls_total == 0 {
            return 0.0;
        }
        (self.urls_succeeded as f64 / self.urls_total as f64) * 100.0
    }

    /// Returns the error rate as a percentage
    pub fn error_rate(&self) -> f64 {
        if self.urls_total == 0 {
            return 0.0;
        }
        (self.urls_failed as f64 / self.urls_total as f64) * 100.0
    }
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self::from_session(session)
    }
}
