//! Per-URL processing shared by both scrapers
//!
//! fetch (with retries) → extract → report, with every outcome turned into
//! a `Result<Record, ErrorKind>` so a batch can carry on.

use crate::config::ScraperConfig;
use crate::extract::{Extractor, Record};
use crate::fetcher::{ErrorKind, Fetcher, Request, Transport, UserAgentSource};
use crate::scraper::observer::{ScrapeEvent, ScrapeObserver, TracingObserver};
use crate::scraper::stats::{ScraperStats, StatsCounter};
use reqwest::header::USER_AGENT;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub(crate) struct Pipeline {
    fetcher: Fetcher,
    extractor: Extractor,
    user_agents: UserAgentSource,
    headers: BTreeMap<String, String>,
    timeout: Duration,
    observer: Arc<dyn ScrapeObserver>,
    stats: StatsCounter,
}

impl Pipeline {
    pub fn new(config: &ScraperConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            fetcher: Fetcher::new(transport, config.max_retries(), config.backoff_policy()),
            extractor: Extractor::Default,
            user_agents: config.user_agent_source(),
            headers: config.http.headers.clone(),
            timeout: config.timeout(),
            observer: Arc::new(TracingObserver),
            stats: StatsCounter::default(),
        }
    }

    pub fn set_extractor(&mut self, extractor: Extractor) {
        self.extractor = extractor;
    }

    pub fn set_observer(&mut self, observer: Arc<dyn ScrapeObserver>) {
        self.observer = observer;
    }

    pub fn observer(&self) -> &dyn ScrapeObserver {
        self.observer.as_ref()
    }

    pub fn stats(&self) -> ScraperStats {
        self.stats.snapshot()
    }

    /// Builds the GET request for `url` with identity and custom headers
    ///
    /// A User-Agent among the custom headers takes precedence over the
    /// configured agent source.
    pub fn request_for(&self, url: &str) -> Request {
        let mut request = Request::get(url, self.timeout);
        let mut has_agent = false;
        for (name, value) in &self.headers {
            has_agent |= name.eq_ignore_ascii_case(USER_AGENT.as_str());
            request = request.with_header(name.as_str(), value.as_str());
        }
        if has_agent {
            request
        } else {
            request.with_header(USER_AGENT.as_str(), self.user_agents.next_agent())
        }
    }

    /// Fetches and extracts one URL
    ///
    /// The caller must already hold a rate-limiter permit.
    pub async fn process(&self, url: &str) -> Result<Record, ErrorKind> {
        self.observer.on_event(&ScrapeEvent::FetchStarted {
            url: url.to_string(),
        });

        let request = self.request_for(url);
        let result = self
            .fetcher
            .fetch_observed(&request, self.observer.as_ref())
            .await;
        let outcome = self.extractor.extract(&result);

        self.stats.record(result.attempt_count, outcome.is_ok());
        let event = match &outcome {
            Ok(_) => ScrapeEvent::FetchSucceeded {
                url: url.to_string(),
                status: result.status_code.unwrap_or_default(),
                attempts: result.attempt_count,
                elapsed: result.elapsed,
                bytes: result.body.len(),
            },
            Err(kind) => ScrapeEvent::FetchFailed {
                url: url.to_string(),
                kind: kind.clone(),
                status: result.status_code,
                attempts: result.attempt_count,
                elapsed: result.elapsed,
            },
        };
        self.observer.on_event(&event);

        outcome
    }
}
