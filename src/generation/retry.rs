use serde::{Deserialize, Serialize};
use std::iter::Take;
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

/// Caller-chosen retry behaviour for provider calls.
///
/// The default is a single attempt. Only transient failures (timeout,
/// rate limit, network) are retried; authentication and malformed responses
/// fail immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first call
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// One attempt, no retry
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }

    pub const fn attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            ..Self::none()
        }
    }

    #[must_use]
    pub const fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub const fn is_enabled(&self) -> bool {
        self.max_attempts > 1
    }

    /// Delays between attempts: initial, 2x, 4x, ... capped at `max_backoff`
    pub fn delays(&self) -> Take<ExponentialBackoff> {
        let initial_ms = u64::try_from(self.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        // from_millis(2) doubles per step; the factor scales the first delay to `initial_ms`
        ExponentialBackoff::from_millis(2)
            .factor((initial_ms / 2).max(1))
            .max_delay(self.max_backoff)
            .take(self.max_attempts.saturating_sub(1) as usize)
    }
}
