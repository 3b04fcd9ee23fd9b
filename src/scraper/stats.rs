use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifetime counters of one scraper instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScraperStats {
    /// HTTP attempts made, retries included
    pub requests_made: u64,
    pub urls_succeeded: u64,
    pub urls_failed: u64,
    /// Attempts beyond the first, summed over all URLs
    pub retries: u64,
}

impl ScraperStats {
    /// URLs finished so far
    pub fn urls_processed(&self) -> u64 {
        self.urls_succeeded + self.urls_failed
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let processed = self.urls_processed();
        if processed == 0 {
            return 0.0;
        }
        (self.urls_succeeded as f64 / processed as f64) * 100.0
    }
}

/// Shared counters behind [`ScraperStats`]
#[derive(Debug, Default)]
pub(crate) struct StatsCounter {
    requests_made: AtomicU64,
    urls_succeeded: AtomicU64,
    urls_failed: AtomicU64,
    retries: AtomicU64,
}

impl StatsCounter {
    pub fn record(&self, attempts: u32, succeeded: bool) {
        let attempts = u64::from(attempts);
        self.requests_made.fetch_add(attempts, Ordering::Relaxed);
        self.retries
            .fetch_add(attempts.saturating_sub(1), Ordering::Relaxed);
        if succeeded {
            self.urls_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.urls_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> ScraperStats {
        ScraperStats {
            requests_made: self.requests_made.load(Ordering::Relaxed),
            urls_succeeded: self.urls_succeeded.load(Ordering::Relaxed),
            urls_failed: self.urls_failed.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
        }
    }
}
