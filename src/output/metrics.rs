//! Live scraping metrics
//!
//! [`MetricsObserver`] listens to scrape events and keeps running totals:
//! - Success and failure counts, errors by kind
//! - HTTP status code histogram
//! - Requests per domain
//! - Bytes downloaded and average response time
//! - Alerts for high error rates and slow responses

use crate::output::OutputResult;
use crate::scraper::{ScrapeEvent, ScrapeObserver};
use crate::url::extract_domain;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Requests needed before the error-rate alert is considered
const MIN_REQUESTS_FOR_ERROR_ALERT: u64 = 10;

/// Aggregated metrics for a scraping run
#[derive(Debug, Clone, Serialize)]
pub struct ScrapingMetrics {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total_urls: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub total_bytes_downloaded: u64,
    pub total_response_time_secs: f64,
    pub average_response_time_secs: f64,
    pub requests_per_second: f64,
    pub errors_by_type: BTreeMap<String, u64>,
    pub status_codes: BTreeMap<u16, u64>,
    pub domain_stats: BTreeMap<String, u64>,
    pub alerts: Vec<String>,
}

impl ScrapingMetrics {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            total_urls: 0,
            successful_requests: 0,
            failed_requests: 0,
            total_bytes_downloaded: 0,
            total_response_time_secs: 0.0,
            average_response_time_secs: 0.0,
            requests_per_second: 0.0,
            errors_by_type: BTreeMap::new(),
            status_codes: BTreeMap::new(),
            domain_stats: BTreeMap::new(),
            alerts: Vec::new(),
        }
    }

    /// URLs that reached a terminal outcome
    pub fn completed_requests(&self) -> u64 {
        self.successful_requests + self.failed_requests
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.completed_requests();
        if total == 0 {
            return 0.0;
        }
        (self.successful_requests as f64 / total as f64) * 100.0
    }

    /// Returns the error rate as a percentage
    pub fn error_rate(&self) -> f64 {
        let total = self.completed_requests();
        if total == 0 {
            return 0.0;
        }
        (self.failed_requests as f64 / total as f64) * 100.0
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }

    /// Writes the metrics as a pretty JSON report
    ///
    /// The report adds `success_rate` and `duration_seconds` to the fields.
    pub fn export_json(&self, path: &Path) -> OutputResult<()> {
        let mut report = serde_json::to_value(self)?;
        if let Some(map) = report.as_object_mut() {
            map.insert("success_rate".to_string(), self.success_rate().into());
            map.insert(
                "duration_seconds".to_string(),
                (self.duration().num_milliseconds() as f64 / 1000.0).into(),
            );
        }

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &report)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    fn record_outcome(&mut self, url: &str, status: Option<u16>, elapsed: Duration) {
        if let Some(status) = status {
            *self.status_codes.entry(status).or_insert(0) += 1;
        }
        if let Some(domain) = extract_domain(url) {
            *self.domain_stats.entry(domain).or_insert(0) += 1;
        }
        self.total_response_time_secs += elapsed.as_secs_f64();
        self.average_response_time_secs =
            self.total_response_time_secs / self.completed_requests() as f64;
    }

    fn refresh_rate(&mut self) {
        let seconds = self.duration().num_milliseconds() as f64 / 1000.0;
        if seconds > 0.0 {
            self.requests_per_second = self.completed_requests() as f64 / seconds;
        }
    }

    fn raise(&mut self, alert: String) {
        if !self.alerts.contains(&alert) {
            tracing::warn!(alert = %alert, "Scraping alert");
            self.alerts.push(alert);
        }
    }
}

/// Observer that aggregates [`ScrapingMetrics`]
pub struct MetricsObserver {
    metrics: Mutex<ScrapingMetrics>,
    error_rate_threshold: f64,
    slow_response_threshold: Duration,
}

impl MetricsObserver {
    /// Creates an observer alerting above 20% errors or 10s average response
    pub fn new() -> Self {
        Self::with_thresholds(20.0, Duration::from_secs(10))
    }

    /// Creates an observer with custom alert thresholds
    ///
    /// # Arguments
    ///
    /// * `error_rate_threshold` - Error percentage above which to alert
    /// * `slow_response_threshold` - Average response time above which to alert
    pub fn with_thresholds(error_rate_threshold: f64, slow_response_threshold: Duration) -> Self {
        Self {
            metrics: Mutex::new(ScrapingMetrics::new()),
            error_rate_threshold,
            slow_response_threshold,
        }
    }

    /// Current metrics, with the request rate brought up to date
    pub fn snapshot(&self) -> ScrapingMetrics {
        let mut metrics = self.lock().clone();
        metrics.refresh_rate();
        metrics
    }

    /// Writes the current metrics as a JSON report
    pub fn export_json(&self, path: &Path) -> OutputResult<()> {
        self.snapshot().export_json(path)
    }

    fn lock(&self) -> MutexGuard<'_, ScrapingMetrics> {
        // A panicking observer cannot leave the counters half-updated
        match self.metrics.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_alerts(&self, metrics: &mut ScrapingMetrics) {
        if metrics.completed_requests() >= MIN_REQUESTS_FOR_ERROR_ALERT {
            let error_rate = metrics.error_rate();
            if error_rate > self.error_rate_threshold {
                metrics.raise(format!(
                    "High error rate: {:.1}% (threshold: {:.1}%)",
                    error_rate, self.error_rate_threshold
                ));
            }
        }

        if metrics.average_response_time_secs > self.slow_response_threshold.as_secs_f64() {
            metrics.raise(format!(
                "Slow response times: {:.2}s average",
                metrics.average_response_time_secs
            ));
        }
    }
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrapeObserver for MetricsObserver {
    fn on_event(&self, event: &ScrapeEvent) {
        let mut metrics = self.lock();
        match event {
            ScrapeEvent::FetchStarted { .. } => {
                metrics.total_urls += 1;
            }
            ScrapeEvent::RetryScheduled { .. } => {}
            ScrapeEvent::FetchSucceeded {
                url,
                status,
                elapsed,
                bytes,
                ..
            } => {
                metrics.successful_requests += 1;
                metrics.total_bytes_downloaded += *bytes as u64;
                metrics.record_outcome(url, Some(*status), *elapsed);
                self.check_alerts(&mut metrics);
            }
            ScrapeEvent::FetchFailed {
                url,
                kind,
                status,
                elapsed,
                ..
            } => {
                metrics.failed_requests += 1;
                *metrics
                    .errors_by_type
                    .entry(kind.name().to_string())
                    .or_insert(0) += 1;
                metrics.record_outcome(url, *status, *elapsed);
                self.check_alerts(&mut metrics);
            }
            ScrapeEvent::BatchCompleted { .. } => {
                metrics.finished_at = Some(Utc::now());
                metrics.refresh_rate();
            }
        }
    }
}
