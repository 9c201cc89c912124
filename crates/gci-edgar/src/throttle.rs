//! Ordered rate limiting for requests to the regulatory host.

use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Default spacing: 100 ms between requests, i.e. at most 10 per second.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Rate limiter enforcing a minimum interval between successive requests.
///
/// Lives behind a `tokio::sync::Mutex`; tokio's mutex hands the lock to
/// waiters in FIFO order, so a burst of queued requests drains in
/// submission order with the configured spacing rather than dropping or
/// reordering.
#[derive(Debug)]
pub struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    /// Create a limiter with the given minimum interval.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    /// Waits until at least the minimum interval has passed since the
    /// previous request, then records the new request time.
    pub async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_enforces_spacing() {
        let mut limiter = RateLimiter::new(Duration::from_millis(100));
        let start = Instant::now();

        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;

        // Two full intervals must separate the three requests.
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_when_idle() {
        let mut limiter = RateLimiter::new(Duration::from_millis(100));
        tokio::time::advance(Duration::from_millis(500)).await;

        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
