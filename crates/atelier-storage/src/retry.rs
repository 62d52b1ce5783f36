//! Retry policy for network transfers.
//!
//! The policy only makes decisions (whether to retry, how long to wait); the
//! persister owns the loop and the sleeping, so decisions are testable without
//! timers.

use atelier_core::{Config, ErrorMetadata, ImageToolError};
use std::time::Duration;

const MAX_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base * attempt`
    Linear,
    /// `base * 2^(attempt - 1)`
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (at least 1)
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: MAX_DELAY,
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: MAX_DELAY,
            backoff,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_retries,
            config.retry_base_delay(),
            Backoff::Exponential,
        )
    }

    /// Single attempt, never retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Backoff::Linear)
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let delay = match self.backoff {
            Backoff::Linear => self.base_delay.saturating_mul(attempt),
            Backoff::Exponential => {
                let factor = 2u32.saturating_pow(attempt - 1);
                self.base_delay.saturating_mul(factor)
            }
        };
        delay.min(self.max_delay)
    }

    /// Whether a failure on `attempt` (1-based) should be followed by another attempt.
    ///
    /// Only network-class errors are retried; validation, size-limit and
    /// filesystem errors fail immediately.
    pub fn should_retry(&self, error: &ImageToolError, attempt: u32) -> bool {
        attempt < self.max_attempts && error.is_retryable()
    }
}
