//! Structured scrape events and their observers
//!
//! The scraper never formats log lines itself. It reports what happened to a
//! [`ScrapeObserver`]; [`TracingObserver`] turns events into `tracing`
//! events with structured fields.

use crate::fetcher::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

/// Something that happened while scraping
///
/// Every URL gets one `FetchStarted` followed by exactly one of
/// `FetchSucceeded` or `FetchFailed`.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeEvent {
    /// A URL was admitted by the rate limiter
    FetchStarted { url: String },

    /// A transient failure will be retried after `delay`
    RetryScheduled {
        url: String,
        attempt: u32,
        delay: Duration,
        kind: ErrorKind,
    },

    /// The URL was fetched and a record extracted
    FetchSucceeded {
        url: String,
        status: u16,
        attempts: u32,
        elapsed: Duration,
        bytes: usize,
    },

    /// The URL produced no record
    FetchFailed {
        url: String,
        kind: ErrorKind,
        status: Option<u16>,
        attempts: u32,
        elapsed: Duration,
    },

    /// A multi-URL batch finished
    BatchCompleted { succeeded: usize, failed: usize },
}

/// Receives scrape events
///
/// Called from inside the scraping loop, so implementations should be quick
/// and must not block.
pub trait ScrapeObserver: Send + Sync {
    fn on_event(&self, event: &ScrapeEvent);
}

impl<T: ScrapeObserver + ?Sized> ScrapeObserver for Arc<T> {
    fn on_event(&self, event: &ScrapeEvent) {
        (**self).on_event(event)
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ScrapeObserver for NoopObserver {
    fn on_event(&self, _event: &ScrapeEvent) {}
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ScrapeObserver for TracingObserver {
    fn on_event(&self, event: &ScrapeEvent) {
        match event {
            ScrapeEvent::FetchStarted { url } => {
                tracing::debug!(url = %url, "Fetch started");
            }
            ScrapeEvent::RetryScheduled {
                url,
                attempt,
                delay,
                kind,
            } => {
                tracing::warn!(
                    url = %url,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    kind = kind.name(),
                    error = %kind,
                    "Retrying after transient failure"
                );
            }
            ScrapeEvent::FetchSucceeded {
                url,
                status,
                attempts,
                elapsed,
                bytes,
            } => {
                tracing::info!(
                    url = %url,
                    status,
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    bytes,
                    "Fetch succeeded"
                );
            }
            ScrapeEvent::FetchFailed {
                url,
                kind,
                status,
                attempts,
                ..
            } => {
                tracing::warn!(
                    url = %url,
                    kind = kind.name(),
                    status = ?status,
                    attempts,
                    error = %kind,
                    "Fetch failed"
                );
            }
            ScrapeEvent::BatchCompleted { succeeded, failed } => {
                tracing::info!(succeeded, failed, "Batch completed");
            }
        }
    }
}

/// Sends every event to several observers, in order
#[derive(Clone, Default)]
pub struct Fanout {
    observers: Vec<Arc<dyn ScrapeObserver>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn ScrapeObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn push(&mut self, observer: Arc<dyn ScrapeObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl ScrapeObserver for Fanout {
    fn on_event(&self, event: &ScrapeEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}
