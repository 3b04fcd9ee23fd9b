//! Scrape orchestration
//!
//! This module ties the pieces together for one or many URLs:
//! - Rate-limiter admission before every fetch
//! - Fetching with retries, then extraction into a [`Record`](crate::Record)
//! - Per-URL failure bookkeeping in a [`Session`]
//! - Structured events for an injected [`ScrapeObserver`]
//!
//! [`Scraper`] handles URLs one at a time; [`AsyncScraper`] runs up to
//! `max_concurrent` at once. Given the same inputs both produce the same
//! session contents.

mod concurrent;
mod observer;
mod pipeline;
mod sequential;
mod session;
mod stats;

pub use concurrent::AsyncScraper;
pub use observer::{Fanout, NoopObserver, ScrapeEvent, ScrapeObserver, TracingObserver};
pub use sequential::Scraper;
pub use session::{Session, SessionState};
pub use stats::ScraperStats;
