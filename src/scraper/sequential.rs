use crate::config::{validate, ScraperConfig};
use crate::extract::{Extractor, Fields, Record};
use crate::fetcher::{ErrorKind, FetchResult, HttpTransport, Transport};
use crate::limiter::RateLimiter;
use crate::scraper::observer::{ScrapeEvent, ScrapeObserver};
use crate::scraper::pipeline::Pipeline;
use crate::scraper::session::Session;
use crate::scraper::stats::ScraperStats;
use crate::storage::{StorageResult, StorageWriter, WriteReport};
use std::path::Path;
use std::sync::Arc;

/// Sequential scraper: one request in flight, `delay` apart
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use trawler::{Scraper, ScraperConfig};
///
/// # async fn example() -> trawler::Result<()> {
/// let config = ScraperConfig::default().with_delay(Duration::from_secs(2));
/// let scraper = Scraper::new(config)?;
/// match scraper.scrape_url("https://example.com/").await {
///     Ok(record) => println!("title: {:?}", record.get("title")),
///     Err(kind) => println!("failed: {}", kind),
/// }
/// # Ok(())
/// # }
/// ```
pub struct Scraper {
    config: ScraperConfig,
    pipeline: Pipeline,
    limiter: RateLimiter,
    writer: StorageWriter,
}

impl Scraper {
    /// Creates a scraper using the `reqwest` transport
    ///
    /// # Returns
    ///
    /// * `Ok(Scraper)` - Ready to scrape
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
            limiter: RateLimiter::sequential(config.delay(), config.requests.jitter),
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
    ///
    /// An error or panic in `f` fails only the page being extracted.
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
    ///
    /// # Returns
    ///
    /// * `Ok(Record)` - The extracted record
    /// * `Err(ErrorKind)` - Why the URL failed; no record is produced
    pub async fn scrape_url(&self, url: &str) -> Result<Record, ErrorKind> {
        let _permit = self.limiter.acquire().await;
        self.pipeline.process(url).await
    }

    /// Scrapes URLs one at a time, in input order
    ///
    /// Per-URL failures are recorded in the session and never stop the batch.
    pub async fn scrape_multiple_urls<S: AsRef<str>>(&self, urls: &[S]) -> Session {
        let mut session = Session::begin(urls.len());
        tracing::info!(urls = urls.len(), "Starting sequential batch");

        for url in urls {
            let url = url.as_ref();
            let outcome = self.scrape_url(url).await;
            session.record_outcome(url, outcome);
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
