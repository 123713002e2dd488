//! Fixed-interval pacing between upstream lookups.

use std::time::Duration;

/// Crude client-side rate limiter: one permit per fixed interval, no burst.
///
/// Kept separate from the correlator so the pacing policy can be tuned or
/// swapped without touching the join logic. The interval comes from
/// `rate_limit_ms` in config; zero disables pacing (used by tests).
#[derive(Debug, Clone)]
pub struct RateGate {
    interval: Duration,
}

impl RateGate {
    /// Create a gate with the given interval between permits.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Create a gate from a millisecond interval.
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Wait out one full interval before the next upstream lookup.
    pub async fn pause(&self) {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }

    /// The configured interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}
