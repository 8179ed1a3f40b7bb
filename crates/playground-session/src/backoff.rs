//! Exponential backoff for reconnecting to the backend.

use std::time::Duration;

use playground_core::PlaygroundConfig;

/// Capped exponential backoff with a bounded number of attempts.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base_delay: Duration,
    max_delay: Duration,
    max_attempts: u32,
    attempt: u32,
}

impl ExponentialBackoff {
    /// Create a backoff sequence allowing `max_attempts` delays.
    #[must_use]
    pub const fn new(base_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_delay,
            max_attempts,
            attempt: 0,
        }
    }

    /// Backoff configured for reconnection, or `None` when reconnection is disabled.
    #[must_use]
    pub const fn from_config(config: &PlaygroundConfig) -> Option<Self> {
        if config.reconnect_attempts == 0 {
            return None;
        }
        Some(Self::new(
            Duration::from_millis(config.reconnect_delay_ms),
            Duration::from_millis(config.reconnect_max_delay_ms),
            config.reconnect_attempts,
        ))
    }

    /// Next delay, or `None` once all attempts are used.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }

        // min(base * 2^attempt, max)
        let multiplier = 1u32.checked_shl(self.attempt).unwrap_or(u32::MAX);
        let delay = self
            .base_delay
            .checked_mul(multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);

        self.attempt = self.attempt.saturating_add(1);
        Some(delay)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Delays handed out since the last reset.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}
