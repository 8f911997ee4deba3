//! Retry configuration: attempt budget, caps, and error classification.
//!
//! A [`RetryConfig`] is an immutable value constructed once by the caller
//! and safely shared across concurrent executions; cloning is cheap (the
//! predicate is behind an `Arc`).

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// Immutable retry configuration for one or more executions.
///
/// The `should_retry` predicate is an opaque function over the caller's own
/// error type; the engine never interprets error semantics itself. The
/// default predicate retries everything.
pub struct RetryConfig<E> {
    max_attempts: u32,
    max_delay: Option<Duration>,
    timeout: Option<Duration>,
    should_retry: Arc<dyn Fn(&E) -> bool + Send + Sync>,
}

impl<E> RetryConfig<E> {
    /// Create a configuration with the given attempt budget, no delay cap,
    /// no overall timeout, and an always-retry predicate. An attempt budget
    /// of 0 is treated as 1 — one attempt is always mandatory.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            max_delay: None,
            timeout: None,
            should_retry: Arc::new(|_| true),
        }
    }

    /// Preset: 5 attempts, delays capped at 30 seconds, 120 second overall
    /// budget.
    pub fn conservative() -> Self {
        Self::new(5)
            .with_max_delay(Duration::from_secs(30))
            .with_timeout(Duration::from_secs(120))
    }

    /// Preset: 10 attempts, delays capped at 60 seconds, 300 second overall
    /// budget.
    pub fn aggressive() -> Self {
        Self::new(10)
            .with_max_delay(Duration::from_secs(60))
            .with_timeout(Duration::from_secs(300))
    }

    /// Replace the attempt budget (0 is treated as 1).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Cap every post-jitter delay at `max_delay`.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Bound the whole execution by a wall-clock budget. The budget gates
    /// starting new attempts; it never interrupts a running operation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the error-classification predicate.
    pub fn with_should_retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(predicate);
        self
    }

    /// The attempt budget (always ≥ 1).
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The post-jitter delay cap, if any.
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }

    /// The overall wall-clock budget, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Evaluate the classification predicate for `error`.
    pub fn should_retry(&self, error: &E) -> bool {
        (self.should_retry)(error)
    }
}

impl<E> RetryConfig<E>
where
    E: Eq + Hash + Send + Sync + 'static,
{
    /// Build a configuration whose predicate retries exactly the errors in
    /// `retryable`. Requires a closed error type with value equality; there
    /// is no runtime type inspection involved.
    pub fn for_errors(
        max_attempts: u32,
        max_delay: Option<Duration>,
        timeout: Option<Duration>,
        retryable: HashSet<E>,
    ) -> Self {
        let mut config = Self::new(max_attempts)
            .with_should_retry(move |error: &E| retryable.contains(error));
        config.max_delay = max_delay;
        config.timeout = timeout;
        config
    }
}

impl<E> Default for RetryConfig<E> {
    /// 3 attempts, no delay cap, no timeout, retry everything.
    fn default() -> Self {
        Self::new(3)
    }
}

impl<E> Clone for RetryConfig<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            max_delay: self.max_delay,
            timeout: self.timeout,
            should_retry: Arc::clone(&self.should_retry),
        }
    }
}

impl<E> fmt::Debug for RetryConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_attempts", &self.max_attempts)
            .field("max_delay", &self.max_delay)
            .field("timeout", &self.timeout)
            .field("should_retry", &"<predicate>")
            .finish()
    }
}
