//! Retry policy: pure retry-eligibility and backoff decisions.
//!
//! The policy never sleeps; the client's retry controller asks
//! [`RetryPolicy::should_retry`] and [`RetryPolicy::delay_for`] and owns the
//! waiting.

use std::sync::Arc;
use std::time::Duration;

use crate::Error;

/// Custom retry predicate with final say over retry eligibility.
pub type RetryPredicate = Arc<dyn Fn(&Error, u32) -> bool + Send + Sync>;

/// Per-attempt base delay function.
pub type DelayFn = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

// Keeps an errant delay function or multiplier from producing absurd waits.
const DELAY_CEILING: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone)]
enum RetryDelay {
    Fixed(Duration),
    PerAttempt(DelayFn),
}

/// Retry policy for a logical request.
///
/// `attempts` counts re-attempts, so a request is dispatched at most
/// `attempts + 1` times. The default policy performs no retries.
#[derive(Clone)]
pub struct RetryPolicy {
    attempts: u32,
    delay: RetryDelay,
    backoff: bool,
    backoff_multiplier: f64,
    max_delay: Option<Duration>,
    retryable_statuses: Option<Vec<u16>>,
    retry_if: Option<RetryPredicate>,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RetryPolicy")
            .field("attempts", &self.attempts)
            .field(
                "delay",
                match &self.delay {
                    RetryDelay::Fixed(d) => d,
                    RetryDelay::PerAttempt(_) => &"<fn>",
                },
            )
            .field("backoff", &self.backoff)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("max_delay", &self.max_delay)
            .field("retryable_statuses", &self.retryable_statuses)
            .field("has_retry_predicate", &self.retry_if.is_some())
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self::attempts(0)
    }

    /// Policy allowing up to `attempts` re-attempts.
    #[must_use]
    pub fn attempts(attempts: u32) -> Self {
        Self {
            attempts,
            delay: RetryDelay::Fixed(Duration::from_millis(200)),
            backoff: false,
            backoff_multiplier: 2.0,
            max_delay: None,
            retryable_statuses: None,
            retry_if: None,
        }
    }

    /// Sets a fixed base delay between attempts.
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = RetryDelay::Fixed(delay);
        self
    }

    /// Sets an attempt-index-dependent base delay.
    #[must_use]
    pub fn delay_fn(mut self, f: impl Fn(u32) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = RetryDelay::PerAttempt(Arc::new(f));
        self
    }

    /// Enables exponential backoff with the given multiplier.
    #[must_use]
    pub fn backoff(mut self, multiplier: f64) -> Self {
        self.backoff = true;
        self.backoff_multiplier = multiplier.max(1.0);
        self
    }

    /// Caps the computed delay.
    #[must_use]
    pub fn max_delay(mut self, cap: Duration) -> Self {
        self.max_delay = Some(cap);
        self
    }

    /// Restricts status-driven retries to an explicit status list.
    ///
    /// Without a list, any 5xx status is considered retryable.
    #[must_use]
    pub fn retry_on_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_statuses = Some(statuses.into_iter().collect());
        self
    }

    /// Installs a custom predicate with final say over retry eligibility.
    ///
    /// Cancellation errors are still never retried.
    #[must_use]
    pub fn retry_if(mut self, predicate: impl Fn(&Error, u32) -> bool + Send + Sync + 'static) -> Self {
        self.retry_if = Some(Arc::new(predicate));
        self
    }

    /// Maximum number of re-attempts.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.attempts
    }

    /// Decides whether the error from attempt `attempt` warrants a retry.
    ///
    /// Explicit user cancellation short-circuits everything, including the
    /// custom predicate. Otherwise the predicate, when present, has final
    /// say; the default rules retry network errors, timeouts, and statuses
    /// from the retryable list (or any 5xx when no list is set).
    #[must_use]
    pub fn should_retry(&self, error: &Error, attempt: u32) -> bool {
        if error.is_canceled() {
            return false;
        }
        if let Some(predicate) = &self.retry_if {
            return predicate(error, attempt);
        }
        if error.is_network() || error.is_timeout() {
            return true;
        }
        if let Some(status) = error.status() {
            return match &self.retryable_statuses {
                Some(list) => list.contains(&status),
                None => (500..600).contains(&status),
            };
        }
        false
    }

    /// Computes the delay before the attempt following attempt `attempt`.
    ///
    /// `base * multiplier^attempt` when backoff is enabled, clamped to the
    /// configured cap.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = match &self.delay {
            RetryDelay::Fixed(delay) => *delay,
            RetryDelay::PerAttempt(f) => f(attempt),
        };
        let delay = if self.backoff {
            let exponent = attempt.min(32);
            let factor = self.backoff_multiplier.powi(exponent.cast_signed());
            let seconds = (base.as_secs_f64() * factor).min(DELAY_CEILING.as_secs_f64());
            Duration::from_secs_f64(seconds)
        } else {
            base.min(DELAY_CEILING)
        };
        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }
}
