use crate::extract::Record;
use crate::fetcher::ErrorKind;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle of one batch invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Running,
    /// Every URL produced a record
    Completed,
    /// At least one URL failed; there is no all-failed state
    PartiallyFailed,
}

/// Accumulated result of one multi-URL scrape
///
/// Once finished, `urls_succeeded + urls_failed == urls_total`, and
/// `records` holds exactly one record per succeeded URL, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub urls_total: usize,
    pub urls_succeeded: usize,
    pub urls_failed: usize,
    pub records: Vec<Record>,
    /// Failed URLs with their reason, in input order
    pub errors: Vec<(String, ErrorKind)>,
    pub state: SessionState,
}

impl Session {
    /// Creates an idle session
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            urls_total: 0,
            urls_succeeded: 0,
            urls_failed: 0,
            records: Vec::new(),
            errors: Vec::new(),
            state: SessionState::Idle,
        }
    }

    /// Moves to `Running` for a batch of `urls_total` URLs
    pub fn begin(urls_total: usize) -> Self {
        Self {
            urls_total,
            state: SessionState::Running,
            ..Self::new()
        }
    }

    pub fn record_success(&mut self, record: Record) {
        self.urls_succeeded += 1;
        self.records.push(record);
    }

    pub fn record_failure(&mut self, url: impl Into<String>, kind: ErrorKind) {
        self.urls_failed += 1;
        self.errors.push((url.into(), kind));
    }

    /// Applies one URL's outcome
    pub fn record_outcome(&mut self, url: &str, outcome: Result<Record, ErrorKind>) {
        match outcome {
            Ok(record) => self.record_success(record),
            Err(kind) => self.record_failure(url, kind),
        }
    }

    /// Moves to the terminal state
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
        self.state = if self.urls_failed > 0 {
            SessionState::PartiallyFailed
        } else {
            SessionState::Completed
        };
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            SessionState::Completed | SessionState::PartiallyFailed
        )
    }

    /// Wall-clock duration of the batch, if finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|finished| finished - self.started_at)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
