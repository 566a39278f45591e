//! Jittered poll backoff
//!
//! Poll sleeps grow by a random factor in `[1, 2]` per attempt, so many
//! extractors polling the same account drift apart instead of polling in
//! lockstep.

use rand::Rng;
use std::time::Duration;

/// Randomized exponential backoff between `min` and `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    min: Duration,
    max: Duration,
}

impl BackoffPolicy {
    /// Create a policy; `max` is raised to `min` if smaller
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    /// Smallest interval (returned on the first call)
    pub fn min(&self) -> Duration {
        self.min
    }

    /// Largest interval ever returned
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Next sleep given the previous one (`Duration::ZERO` before the first poll)
    pub fn next_interval(&self, previous: Duration) -> Duration {
        if previous.is_zero() {
            return self.min.min(self.max);
        }

        let low = previous.max(self.min).as_millis() as u64;
        let high = low.saturating_mul(2);
        let drawn = rand::thread_rng().gen_range(low..=high);
        Duration::from_millis(drawn).min(self.max)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(
            super::types::DEFAULT_MIN_POLL_INTERVAL,
            super::types::DEFAULT_MAX_POLL_INTERVAL,
        )
    }
}
