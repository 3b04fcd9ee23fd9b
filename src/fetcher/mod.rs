//! HTTP fetcher implementation
//!
//! This module handles all network retrieval for the scraper, including:
//! - Building requests with user agent and custom headers
//! - Single-attempt transports (`reqwest` by default)
//! - Retry logic with exponential back-off for transient failures
//! - Error classification into [`ErrorKind`]
//!
//! Fetch failures are returned inside the [`FetchResult`], never raised, so a
//! batch can continue past a bad URL.

mod error;
mod retry;
mod transport;
mod user_agent;

pub use error::ErrorKind;
pub use retry::BackoffPolicy;
pub use transport::{build_http_client, HttpTransport, Response, Transport};
pub use user_agent::{UserAgentSource, BROWSER_USER_AGENTS, DEFAULT_USER_AGENT};

use crate::scraper::{NoopObserver, ScrapeEvent, ScrapeObserver};
use crate::url::parse_absolute;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A GET request for one URL
///
/// Immutable once handed to the fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Absolute URL to fetch
    pub url: String,
    /// Headers added to the transport defaults
    pub headers: BTreeMap<String, String>,
    /// Per-attempt timeout
    pub timeout: Duration,
}

impl Request {
    /// Creates a GET request with no extra headers
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            timeout,
        }
    }

    /// Adds or replaces a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Outcome of fetching one URL, including every retry
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The requested URL
    pub url: String,
    /// URL after redirects, when a response arrived
    pub final_url: Option<String>,
    /// Last observed HTTP status
    pub status_code: Option<u16>,
    /// Content-Type of the last response
    pub content_type: Option<String>,
    /// Body of the last response
    pub body: String,
    /// Wall-clock time across all attempts and back-off waits
    pub elapsed: Duration,
    /// Attempts made, at least 1
    pub attempt_count: u32,
    /// When the fetch began
    pub fetched_at: DateTime<Utc>,
    /// Set when the fetch did not succeed
    pub error: Option<ErrorKind>,
}

impl FetchResult {
    /// Returns true if a successful response was received
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    fn failed(url: &str, error: ErrorKind, attempt_count: u32, fetched_at: DateTime<Utc>) -> Self {
        Self {
            url: url.to_string(),
            final_url: None,
            status_code: None,
            content_type: None,
            body: String::new(),
            elapsed: Duration::ZERO,
            attempt_count,
            fetched_at,
            error: Some(error),
        }
    }
}

/// Retrying fetcher over a single-attempt [`Transport`]
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Malformed URL / DNS failure | Immediate → `Resolution` |
/// | HTTP 4xx except 429 | Immediate → `Client` |
/// | HTTP 5xx, 429 | Retry with back-off |
/// | Timeout, connection reset | Retry with back-off |
/// | Retries used up | `RetryExhausted` with the last failure |
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    max_retries: u32,
    backoff: BackoffPolicy,
}

impl Fetcher {
    /// Creates a fetcher
    ///
    /// # Arguments
    ///
    /// * `transport` - Performs individual attempts
    /// * `max_retries` - Extra attempts allowed after the first
    /// * `backoff` - Wait schedule between attempts
    pub fn new(transport: Arc<dyn Transport>, max_retries: u32, backoff: BackoffPolicy) -> Self {
        Self {
            transport,
            max_retries,
            backoff,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Fetches a request, retrying transient failures
    pub async fn fetch(&self, request: &Request) -> FetchResult {
        self.fetch_observed(request, &NoopObserver).await
    }

    /// Same as [`fetch`](Self::fetch), reporting scheduled retries to `observer`
    pub async fn fetch_observed(
        &self,
        request: &Request,
        observer: &dyn ScrapeObserver,
    ) -> FetchResult {
        let fetched_at = Utc::now();
        let started = Instant::now();

        if let Err(e) = parse_absolute(&request.url) {
            return FetchResult::failed(
                &request.url,
                ErrorKind::Resolution {
                    message: e.to_string(),
                },
                1,
                fetched_at,
            );
        }

        let mut attempt = 1;
        loop {
            let mut last_response = None;
            let failure = match self.transport.send(request).await {
                Ok(response) => match ErrorKind::from_status(response.status) {
                    None => {
                        return FetchResult {
                            url: request.url.clone(),
                            final_url: Some(response.final_url),
                            status_code: Some(response.status),
                            content_type: response.content_type,
                            body: response.body,
                            elapsed: started.elapsed(),
                            attempt_count: attempt,
                            fetched_at,
                            error: None,
                        };
                    }
                    Some(kind) => {
                        last_response = Some(response);
                        kind
                    }
                },
                Err(kind) => kind,
            };

            let terminal = if !failure.is_retryable() {
                Some(failure)
            } else if attempt > self.max_retries {
                Some(ErrorKind::RetryExhausted {
                    attempts: attempt,
                    last: Box::new(failure),
                })
            } else {
                let delay = self.backoff.delay_for(attempt);
                observer.on_event(&ScrapeEvent::RetryScheduled {
                    url: request.url.clone(),
                    attempt,
                    delay,
                    kind: failure,
                });
                tokio::time::sleep(delay).await;
                attempt += 1;
                None
            };

            if let Some(error) = terminal {
                let mut result = FetchResult::failed(&request.url, error, attempt, fetched_at);
                result.elapsed = started.elapsed();
                if let Some(response) = last_response {
                    result.final_url = Some(response.final_url);
                    result.status_code = Some(response.status);
                    result.content_type = response.content_type;
                    result.body = response.body;
                }
                return result;
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for unit tests

    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Replays queued outcomes per URL; the last outcome repeats forever
    #[derive(Default)]
    pub struct ScriptedTransport {
        scripts: Mutex<HashMap<String, VecDeque<Result<u16, ErrorKind>>>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn script(self, url: &str, outcomes: Vec<Result<u16, ErrorKind>>) -> Self {
            self.scripts
                .lock()
                .unwrap()
                .insert(url.to_string(), outcomes.into());
            self
        }

        pub fn call_count(&self, url: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
        }
    }

    #[async_trait::async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &Request) -> Result<Response, ErrorKind> {
            self.calls.lock().unwrap().push(request.url.clone());
            let outcome = {
                let mut scripts = self.scripts.lock().unwrap();
                let queue = scripts.entry(request.url.clone()).or_default();
                if queue.len() > 1 {
                    queue.pop_front().unwrap()
                } else {
                    queue.front().cloned().unwrap_or(Ok(200))
                }
            };
            outcome.map(|status| Response {
                status,
                final_url: request.url.clone(),
                content_type: Some("text/html".to_string()),
                body: format!(
                    "<html><head><title>{}</title></head><body>page</body></html>",
                    request.url
                ),
            })
        }
    }
}
