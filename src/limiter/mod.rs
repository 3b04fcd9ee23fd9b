//! Request pacing for a single scraper instance
//!
//! The limiter combines two gates:
//! - A FIFO semaphore bounding how many fetches are in flight
//! - A minimum gap between consecutive admissions
//!
//! Sequential scrapers use one slot, so the gap is the delay between
//! requests. Concurrent scrapers use `max_concurrent` slots and the same gap
//! spaces out admissions. A limiter is owned by one scraper; instances never
//! share pacing state.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// A held slot; the slot is released when this is dropped
///
/// Dropping happens on every exit path of the fetch that owns it,
/// including failures and cancellation.
#[derive(Debug)]
pub struct Permit {
    _slot: Option<OwnedSemaphorePermit>,
}

/// Rate limiter with scoped slot acquisition
#[derive(Debug)]
pub struct RateLimiter {
    /// Concurrency slots, handed out in FIFO order
    slots: Arc<Semaphore>,

    /// Capacity of `slots`
    capacity: usize,

    /// Minimum time between consecutive admissions
    delay: Duration,

    /// Add a random wait of up to `delay / 2` on top of `delay`
    jitter: bool,

    /// When the previous `acquire` returned
    last_admission: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter for sequential scraping: one slot, `delay` apart
    pub fn sequential(delay: Duration, jitter: bool) -> Self {
        Self::concurrent(1, delay, jitter)
    }

    /// Creates a limiter allowing up to `max_concurrent` fetches in flight
    ///
    /// # Arguments
    ///
    /// * `max_concurrent` - Slot count; values below 1 are raised to 1
    /// * `delay` - Minimum gap between admissions
    /// * `jitter` - Randomly lengthen each gap by up to half of `delay`
    pub fn concurrent(max_concurrent: usize, delay: Duration, jitter: bool) -> Self {
        let capacity = max_concurrent.max(1);
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
            delay,
            jitter,
            last_admission: Mutex::new(None),
        }
    }

    /// Maximum number of concurrently held permits
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently free
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits for a free slot and for the pacing gap, then admits the caller
    ///
    /// Waiters are admitted in the order they called `acquire`.
    pub async fn acquire(&self) -> Permit {
        // Never closed; a closed semaphore would yield an empty permit
        let slot = self.slots.clone().acquire_owned().await.ok();

        let mut last = self.last_admission.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.gap();
            if ready_at > Instant::now() {
                tracing::trace!(
                    wait_ms = (ready_at - Instant::now()).as_millis() as u64,
                    "Rate limit wait"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());

        Permit { _slot: slot }
    }

    /// Gap to enforce before the next admission
    fn gap(&self) -> Duration {
        if !self.jitter || self.delay.is_zero() {
            return self.delay;
        }
        let half = (self.delay / 2).as_millis() as u64;
        let extra = rand::rng().random_range(0..=half);
        self.delay + Duration::from_millis(extra)
    }
}
