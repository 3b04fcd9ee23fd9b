use std::time::Duration;

/// Exponential back-off schedule for retryable failures
///
/// The wait before retry `n` (n starting at 1) is `base * 2^(n-1)`,
/// capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    max: Duration,
}

impl BackoffPolicy {
    /// Creates a policy; `max` is raised to `base` if it is smaller
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
        }
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Delay to wait after failed attempt number `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << exponent)
            .map_or(self.max, |delay| delay.min(self.max))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doubles_from_base() {
        let policy = BackoffPolicy::new(Duration::from_millis(100), Duration::from_secs(10));
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for(4), Duration::from_millis(800));
    }

    #[test]
    fn test_strictly_increasing_until_cap() {
        let policy = BackoffPolicy::new(Duration::from_millis(50), Duration::from_millis(1000));
        let delays: Vec<_> = (1..=10).map(|n| policy.delay_for(n)).collect();

        for pair in delays.windows(2) {
            if pair[0] < policy.max() {
                assert!(pair[1] > pair[0], "{:?} should exceed {:?}", pair[1], pair[0]);
            } else {
                assert_eq!(pair[1], policy.max());
            }
        }
        assert_eq!(*delays.last().unwrap(), Duration::from_millis(1000));
    }

    #[test]
    fn test_huge_attempt_does_not_overflow() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn test_max_below_base_is_raised() {
        let policy = BackoffPolicy::new(Duration::from_secs(2), Duration::from_secs(1));
        assert_eq!(policy.max(), Duration::from_secs(2));
        assert_eq!(policy.delay_for(5), Duration::from_secs(2));
    }
}
