//! Retry policy for model endpoint calls

use std::time::Duration;

/// Linear backoff retry policy.
///
/// Attempt `n` (0-based) that fails with a transport error is followed by a
/// wait of `(n + 1) * backoff_unit` before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total number of attempts
    pub retries: u32,
    /// Base delay multiplied by the 1-based attempt number
    pub backoff_unit: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff_unit: Duration::from_secs(2),
        }
    }
}

impl RetryConfig {
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            ..Default::default()
        }
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Delay to wait after the given 0-based attempt failed
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_unit * (attempt + 1)
    }

    /// Whether another attempt follows the given 0-based attempt
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt + 1 < self.retries
    }
}
