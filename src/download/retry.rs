//! Delay between a failed download and its retry.
//!
//! Retries are never capped in count: a transiently failed item always goes
//! back on the queue. The policy only decides how long the worker pauses first. The
//! default is no pause at all; a base delay turns on exponential backoff
//! with jitter, keyed on the worker's consecutive failures.

use std::time::Duration;

use rand::Rng;

/// Default maximum delay cap (32 seconds).
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(32);

/// Default backoff multiplier (doubles each consecutive failure).
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Maximum jitter added to delays (500ms).
const MAX_JITTER: Duration = Duration::from_millis(500);

/// Pause applied before a failed item is requeued.
///
/// # Delay Calculation
///
/// ```text
/// delay = min(base_delay * multiplier^(failures - 1), max_delay) + jitter
/// ```
///
/// where jitter is at most half the base delay, and never more than 500ms.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::immediate()
    }
}

impl RetryPolicy {
    /// Requeue right away, with no pause.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }

    /// Exponential backoff starting at `base_delay`.
    #[must_use]
    pub fn with_base_delay(base_delay: Duration) -> Self {
        Self {
            base_delay,
            ..Self::immediate()
        }
    }

    /// Returns true when failed items are requeued without pausing.
    #[must_use]
    pub fn is_immediate(&self) -> bool {
        self.base_delay.is_zero()
    }

    /// Pause before requeueing after `consecutive_failures` failures in a row
    /// (1 for the first failure).
    #[must_use]
    pub fn delay_for(&self, consecutive_failures: u32) -> Duration {
        if self.is_immediate() {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(consecutive_failures.saturating_sub(1)).unwrap_or(i32::MAX);
        let delay_secs = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let capped_secs = delay_secs.min(self.max_delay.as_secs_f64());

        Duration::from_secs_f64(capped_secs) + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let ceiling = (self.base_delay / 2).min(MAX_JITTER);
        let ceiling_ms = u64::try_from(ceiling.as_millis()).unwrap_or(u64::MAX);
        if ceiling_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=ceiling_ms))
    }
}
