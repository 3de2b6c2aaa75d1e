// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry backoff policy.
//!
//! `delay(attempt) = base^(attempt - 1) * unit`, capped at `max_delay`, plus
//! up to `jitter` of random spread. With the defaults (base 3, unit 5 min)
//! the delays after attempts 1, 2, 3 are 5, 15, and 45 minutes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

use outreach_config::model::RetryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    base: u32,
    unit: Duration,
    jitter: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(base: u32, unit: Duration) -> Self {
        Self {
            base: base.max(2),
            unit: unit.max(Duration::from_millis(1)),
            jitter: Duration::ZERO,
            max_delay: Duration::MAX,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.base, Duration::from_secs(config.unit_secs))
            .with_jitter(Duration::from_secs(config.jitter_secs))
            .with_max_delay(Duration::from_secs(config.max_delay_secs))
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Cap on the deterministic part of the delay. Never below `unit`.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay.max(self.unit);
        self
    }

    /// Deterministic delay after the given failed attempt (1-based; 0 is treated as 1).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.max(1) - 1;
        let factor = self.base.checked_pow(exponent).unwrap_or(u32::MAX);
        self.unit
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
            .min(self.max_delay)
    }

    /// Delay including random jitter in `[0, jitter]`.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let delay = self.delay(attempt);
        if self.jitter.is_zero() {
            return delay;
        }
        let spread = rand::thread_rng().gen_range(0..=self.jitter.as_millis() as u64);
        delay.saturating_add(Duration::from_millis(spread))
    }

    /// When a message that just failed `attempt` becomes eligible again.
    pub fn next_attempt_at(&self, now: DateTime<Utc>, attempt: u32) -> DateTime<Utc> {
        let delay = chrono::Duration::from_std(self.jittered_delay(attempt))
            .unwrap_or(chrono::Duration::MAX);
        now.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
