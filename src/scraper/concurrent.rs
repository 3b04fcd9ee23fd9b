//! Concurrent scraping
//!
//! Up to `max_concurrent` fetches run at once inside the calling task. A
//! single loop collects finished results into slots indexed by input
//! position, so the session comes out in input order regardless of which
//! fetch finishes first.

use crate::config::{validate, ScraperConfig};
use crate::extract::{Extractor, Fields, Record};
use crate::fetcher::{ErrorKind, FetchResult, HttpTransport, Transport};
use crate::limiter::RateLimiter;
use crate::scraper::observer::{ScrapeEvent, ScrapeObserver};
use crate::scraper::pipeline::Pipeline;
use crate::scraper::session::Session;
use crate::scraper::stats::ScraperStats;
use crate::storage::{StorageResult, StorageWriter, WriteReport};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Concurrent scraper with bounded in-flight fetches
pub struct AsyncScraper {
    config: ScraperConfig,
    pipeline: Pipeline,
    limiter: RateLimiter,
    writer: StorageWriter,
}

impl AsyncScraper {
    /// Creates a scraper using the `reqwest` transport
    ///
    /// # Returns
    ///
    /// * `Ok(AsyncScraper)` - Ready to scrape
    /// * `Err(TrawlError::Config)` - The configuration is invalid
    /// * `Err(TrawlError::Reqwest)` - The HTTP client could not be built
    pub fn new(config: ScraperConfig) -> crate::Result<Self> {
        validate(&config)?;
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Creates a scraper over a custom transport
    pub fn with_transport(
        config: ScraperConfig,
        transport: Arc<dyn Transport>,
    ) -> crate::Result<Self> {
        validate(&config)?;
        Ok(Self {
            pipeline: Pipeline::new(&config, transport),
            limiter: RateLimiter::concurrent(
                config.max_concurrent(),
                config.delay(),
                config.requests.jitter,
            ),
            writer: StorageWriter::from_config(&config.storage),
            config,
        })
    }

    /// Replaces the observer receiving scrape events
    pub fn with_observer(mut self, observer: Arc<dyn ScrapeObserver>) -> Self {
        self.pipeline.set_observer(observer);
        self
    }

    pub fn set_extractor(&mut self, extractor: Extractor) {
        self.pipeline.set_extractor(extractor);
    }

    /// Uses `f` instead of the default extraction for every page
    pub fn set_custom_extractor<F>(&mut self, f: F)
    where
        F: Fn(&FetchResult) -> anyhow::Result<Fields> + Send + Sync + 'static,
    {
        self.set_extractor(Extractor::custom(f));
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Scrapes a single URL
    pub async fn scrape_url(&self, url: &str) -> Result<Record, ErrorKind> {
        let _permit = self.limiter.acquire().await;
        self.pipeline.process(url).await
    }

    /// Scrapes URLs concurrently; records keep input order
    pub async fn scrape_multiple_async<S: AsRef<str>>(&self, urls: &[S]) -> Session {
        self.scrape_multiple_until(urls, std::future::pending()).await
    }

    /// Scrapes URLs concurrently until `shutdown` resolves
    ///
    /// When `shutdown` fires, fetches still in flight are abandoned. Records
    /// already completed are kept, and every unfinished URL is recorded as
    /// [`ErrorKind::Cancelled`].
    pub async fn scrape_multiple_until<S, F>(&self, urls: &[S], shutdown: F) -> Session
    where
        S: AsRef<str>,
        F: Future<Output = ()>,
    {
        let mut session = Session::begin(urls.len());
        tracing::info!(
            urls = urls.len(),
            max_concurrent = self.limiter.capacity(),
            "Starting concurrent batch"
        );

        let mut slots: Vec<Option<Result<Record, ErrorKind>>> = urls.iter().map(|_| None).collect();
        {
            let results = stream::iter(urls.iter().enumerate())
                .map(|(index, url)| async move {
                    let _permit = self.limiter.acquire().await;
                    (index, self.pipeline.process(url.as_ref()).await)
                })
                .buffer_unordered(self.limiter.capacity());
            tokio::pin!(results);
            tokio::pin!(shutdown);

            loop {
                tokio::select! {
                    next = results.next() => match next {
                        Some((index, outcome)) => slots[index] = Some(outcome),
                        None => break,
                    },
                    _ = &mut shutdown => {
                        let pending = slots.iter().filter(|s| s.is_none()).count();
                        tracing::warn!(pending, "Batch cancelled, abandoning unfinished URLs");
                        break;
                    }
                }
            }
        }

        for (url, slot) in urls.iter().zip(slots) {
            let url = url.as_ref();
            match slot {
                Some(outcome) => session.record_outcome(url, outcome),
                None => session.record_failure(url, ErrorKind::Cancelled),
            }
        }

        session.finish();
        self.pipeline.observer().on_event(&ScrapeEvent::BatchCompleted {
            succeeded: session.urls_succeeded,
            failed: session.urls_failed,
        });
        session
    }

    /// Saves records in the format named by `format`
    pub fn save_data(
        &self,
        records: &[Record],
        destination: impl AsRef<Path>,
        format: &str,
    ) -> StorageResult<WriteReport> {
        self.writer.save(records, destination, format)
    }

    /// Saves records in the configured default format
    pub fn save_records(
        &self,
        records: &[Record],
        destination: impl AsRef<Path>,
    ) -> StorageResult<WriteReport> {
        self.writer
            .save(records, destination, &self.config.storage.default_format)
    }

    /// Counters over every URL this scraper has processed
    pub fn stats(&self) -> ScraperStats {
        self.pipeline.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{Request, Response};
    use crate::scraper::{Scraper, SessionState};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Succeeds after a delay derived from the URL, so later URLs can finish first
    struct SlowTransport {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl SlowTransport {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Transport for SlowTransport {
        async fn send(&self, request: &Request) -> Result<Response, ErrorKind> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let n: u64 = request
                .url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(40 - (n % 8) * 5)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if n % 5 == 4 {
                return Ok(Response {
                    status: 404,
                    final_url: request.url.clone(),
                    content_type: None,
                    body: String::new(),
                });
            }
            Ok(Response {
                status: 200,
                final_url: request.url.clone(),
                content_type: Some("text/html".to_string()),
                body: format!("<title>page {}</title><p>{}</p>", n, "word ".repeat(n as usize)),
            })
        }
    }

    fn config() -> ScraperConfig {
        ScraperConfig::default()
            .with_delay(Duration::ZERO)
            .with_max_retries(0)
            .with_max_concurrent(4)
    }

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://pages.test/{}", i)).collect()
    }

    #[tokio::test]
    async fn test_matches_sequential_output() {
        let urls = urls(12);

        let sequential = Scraper::with_transport(config(), Arc::new(SlowTransport::new())).unwrap();
        let concurrent =
            AsyncScraper::with_transport(config(), Arc::new(SlowTransport::new())).unwrap();

        let a = sequential.scrape_multiple_urls(&urls).await;
        let b = concurrent.scrape_multiple_async(&urls).await;

        assert_eq!(a.urls_total, b.urls_total);
        assert_eq!(a.urls_succeeded, b.urls_succeeded);
        assert_eq!(a.urls_failed, b.urls_failed);
        let fields_a: Vec<_> = a.records.iter().map(|r| (&r.source_url, &r.fields)).collect();
        let fields_b: Vec<_> = b.records.iter().map(|r| (&r.source_url, &r.fields)).collect();
        assert_eq!(fields_a, fields_b);
        let errors_a: Vec<_> = a.errors.iter().map(|(u, k)| (u, k)).collect();
        let errors_b: Vec<_> = b.errors.iter().map(|(u, k)| (u, k)).collect();
        assert_eq!(errors_a, errors_b);
    }

    #[tokio::test]
    async fn test_bounded_concurrency() {
        let transport = Arc::new(SlowTransport::new());
        let scraper = AsyncScraper::with_transport(config(), transport.clone()).unwrap();

        let session = scraper.scrape_multiple_async(&urls(16)).await;

        assert_eq!(session.urls_total, 16);
        assert!(transport.peak.load(Ordering::SeqCst) <= 4);
        assert!(transport.peak.load(Ordering::SeqCst) > 1);
        assert_eq!(scraper.limiter.available(), 4);
    }

    #[tokio::test]
    async fn test_cancellation_keeps_completed_records() {
        let scraper = AsyncScraper::with_transport(
            config().with_max_concurrent(1),
            Arc::new(SlowTransport::new()),
        )
        .unwrap();
        let urls = urls(10);

        // Each fetch takes at most 40ms; only the first few can finish
        let session = scraper
            .scrape_multiple_until(&urls, tokio::time::sleep(Duration::from_millis(90)))
            .await;

        assert_eq!(session.urls_total, 10);
        assert_eq!(session.urls_succeeded + session.urls_failed, 10);
        assert!(session.urls_succeeded >= 1);
        assert!(session
            .errors
            .iter()
            .any(|(_, kind)| *kind == ErrorKind::Cancelled));
        assert_eq!(session.state, SessionState::PartiallyFailed);

        // Completed records come from the front of the input
        for (record, url) in session.records.iter().zip(&urls) {
            assert_eq!(&record.source_url, url);
        }
    }
}
