//! Randomized pacing for outbound scraping requests.
//!
//! Every search attempt waits a uniformly random delay drawn from a
//! [`DelayRange`] before it is sent, so request timing never settles into a
//! fixed rhythm the upstream can fingerprint.

use std::time::Duration;

use rand::Rng;

/// Inclusive range of delays, in milliseconds, that [`DelayRange::wait`]
/// samples from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min_ms: u64,
    max_ms: u64,
}

impl DelayRange {
    /// Creates a range from two bounds. The bounds are reordered when given
    /// backwards.
    #[must_use]
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    /// A range that never sleeps. Useful in tests.
    #[must_use]
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    #[must_use]
    pub fn min_ms(&self) -> u64 {
        self.min_ms
    }

    #[must_use]
    pub fn max_ms(&self) -> u64 {
        self.max_ms
    }

    /// Draws one delay from the range.
    #[must_use]
    pub fn sample(&self) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        let ms = rand::rng().random_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    /// Sleeps for a freshly sampled delay and returns how long it slept.
    pub async fn wait(&self) -> Duration {
        let delay = self.sample();
        if !delay.is_zero() {
            tracing::debug!(delay_ms = delay.as_millis(), "pacing before request");
            tokio::time::sleep(delay).await;
        }
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_reorders_backwards_bounds() {
        let range = DelayRange::new(10_000, 5_000);
        assert_eq!(range.min_ms(), 5_000);
        assert_eq!(range.max_ms(), 10_000);
    }

    #[test]
    fn sample_stays_within_bounds() {
        let range = DelayRange::new(5, 25);
        for _ in 0..200 {
            let ms = range.sample().as_millis();
            assert!((5..=25).contains(&ms), "sampled {ms}ms outside 5..=25");
        }
    }

    #[test]
    fn degenerate_range_is_constant() {
        let range = DelayRange::new(7, 7);
        assert_eq!(range.sample(), Duration::from_millis(7));
    }

    #[tokio::test]
    async fn none_does_not_sleep() {
        let slept = DelayRange::none().wait().await;
        assert!(slept.is_zero());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_sleeps_for_the_sampled_delay() {
        let start = tokio::time::Instant::now();
        let slept = DelayRange::new(5_000, 10_000).wait().await;
        assert!(slept >= Duration::from_millis(5_000));
        assert!(start.elapsed() >= slept);
    }
}
