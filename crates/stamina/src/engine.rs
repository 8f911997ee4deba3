//! The retry engine: orchestrates attempts, timing, circuit consultation,
//! and error classification.
//!
//! One [`Retrier`] execution spans 1..=`max_attempts` attempts. Per attempt,
//! in order: the overall timeout gate, circuit admission, cancellation,
//! the operation itself, breaker bookkeeping, classification, exhaustion,
//! and finally the jittered backoff sleep. The timeout and circuit gates
//! run *before* the operation, so a blocked or expired execution never
//! incurs the cost of invoking it.
//!
//! The engine holds no lock across suspension points; all shared mutable
//! state lives inside the [`CircuitBreaker`].
//!
//! # Examples
//!
//! ```rust
//! use stamina::prelude::*;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let retrier = Retrier::builder()
//!     .max_attempts(5)
//!     .strategy(stamina::strategy::exponential(Duration::from_millis(100)))
//!     .jitter(stamina::jitter::full())
//!     .build();
//!
//! let value = retrier
//!     .execute(|| async { Ok::<_, std::io::Error>(42) })
//!     .await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

use crate::breaker::CircuitBreaker;
use crate::config::RetryConfig;
use crate::error::{RetryError, RetryResult};
use crate::jitter::{Jitter, NoJitter};
use crate::strategy::{self, DelayStrategy};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Terminal result of one execution plus its attempt statistics.
///
/// This is the non-panicking, tagged-outcome view of an execution: it never
/// raises, and it carries what happened alongside how long it took.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// The terminal result of the execution.
    pub result: RetryResult<T, E>,
    /// Number of times the operation was actually invoked.
    pub attempts: u32,
    /// Total time spent sleeping between attempts.
    pub total_delay: Duration,
    /// Wall-clock time from execution start to the terminal outcome.
    pub elapsed: Duration,
}

impl<T, E> RetryOutcome<T, E> {
    /// True if the execution ended in success.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Consume the outcome, keeping only the result.
    pub fn into_result(self) -> RetryResult<T, E> {
        self.result
    }
}

/// Executes operations under a retry policy.
///
/// A retrier is assembled once via [`Retrier::builder`] and may be reused
/// for any number of executions; each `execute` call is an independent
/// execution with its own attempt counter and clock. An attached
/// [`CircuitBreaker`] is shared by reference, so concurrent executions
/// agree on backend health.
pub struct Retrier<E> {
    config: RetryConfig<E>,
    strategy: Arc<dyn DelayStrategy>,
    jitter: Arc<dyn Jitter>,
    breaker: Option<Arc<CircuitBreaker>>,
    cancel: Option<CancellationToken>,
}

impl<E> Retrier<E> {
    /// Start assembling a retrier.
    pub fn builder() -> RetrierBuilder<E> {
        RetrierBuilder::new()
    }
}

impl<E> Clone for Retrier<E> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            strategy: Arc::clone(&self.strategy),
            jitter: Arc::clone(&self.jitter),
            breaker: self.breaker.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<E> std::fmt::Debug for Retrier<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retrier")
            .field("config", &self.config)
            .field("breaker", &self.breaker)
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

impl<E> Retrier<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Execute `operation` under this retry policy.
    ///
    /// Returns the operation's success value, or a [`RetryError`] naming
    /// the terminal path: the caller's own error verbatim when the
    /// predicate declined to retry it, exhaustion, timeout, circuit
    /// denial, or cancellation.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> RetryResult<T, E>
    where
        T: Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        self.execute_with_outcome(operation).await.into_result()
    }

    /// Execute `operation` and return the terminal outcome together with
    /// attempt statistics. Never panics; every path yields an outcome.
    pub async fn execute_with_outcome<T, F, Fut>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        T: Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        let started = Instant::now();
        let max_attempts = self.config.max_attempts();
        let mut attempts: u32 = 0;
        let mut total_delay = Duration::ZERO;

        let result = loop {
            // Overall budget gates starting an attempt, never a running one.
            if let Some(timeout) = self.config.timeout() {
                let elapsed = started.elapsed();
                if elapsed >= timeout {
                    warn!(
                        elapsed_ms = elapsed.as_millis() as u64,
                        attempts, "retry budget exhausted"
                    );
                    break Err(RetryError::Timeout { elapsed });
                }
            }

            // Denied admission consumes no attempt slot and does not wait.
            if let Some(breaker) = &self.breaker {
                if !breaker.should_allow_request() {
                    warn!(attempts, "circuit breaker denied admission");
                    break Err(RetryError::CircuitOpen);
                }
            }

            if let Some(cancel) = &self.cancel {
                if cancel.is_cancelled() {
                    break Err(RetryError::Cancelled);
                }
            }

            attempts += 1;
            let outcome = match &self.cancel {
                Some(cancel) => {
                    tokio::select! {
                        outcome = operation() => Some(outcome),
                        () = cancel.cancelled() => None,
                    }
                }
                None => Some(operation().await),
            };

            // A cancelled in-flight attempt produced no outcome; the
            // breaker must not be told anything about it.
            let Some(outcome) = outcome else {
                break Err(RetryError::Cancelled);
            };

            match outcome {
                Ok(value) => {
                    if let Some(breaker) = &self.breaker {
                        breaker.record_success();
                    }
                    break Ok(value);
                }
                Err(err) => {
                    // Bookkeeping happens before the retry decision, so
                    // circuit health reflects true outcomes regardless of
                    // the predicate's verdict.
                    if let Some(breaker) = &self.breaker {
                        breaker.record_failure();
                    }

                    if !self.config.should_retry(&err) {
                        debug!(attempt = attempts, error = %err, "error classified non-retryable");
                        break Err(RetryError::Operation(err));
                    }

                    if attempts >= max_attempts {
                        warn!(attempts, error = %err, "retry attempts exhausted");
                        break Err(RetryError::MaxAttemptsExceeded {
                            attempts,
                            last_error: err.to_string(),
                        });
                    }

                    let base = self.strategy.delay(attempts);
                    let mut wait = self.jitter.apply(base, attempts);
                    if let Some(cap) = self.config.max_delay() {
                        wait = wait.min(cap);
                    }
                    debug!(
                        attempt = attempts,
                        wait_ms = wait.as_millis() as u64,
                        error = %err,
                        "attempt failed, backing off"
                    );

                    let slept = match &self.cancel {
                        Some(cancel) => {
                            tokio::select! {
                                () = tokio::time::sleep(wait) => true,
                                () = cancel.cancelled() => false,
                            }
                        }
                        None => {
                            tokio::time::sleep(wait).await;
                            true
                        }
                    };
                    if !slept {
                        // Cancelled mid-sleep: not a failed attempt, no
                        // breaker mutation.
                        break Err(RetryError::Cancelled);
                    }
                    total_delay += wait;
                }
            }
        };

        RetryOutcome {
            result,
            attempts,
            total_delay,
            elapsed: started.elapsed(),
        }
    }
}

/// Builder for [`Retrier`].
///
/// Defaults: the [`RetryConfig`] defaults (3 attempts, retry everything),
/// exponential backoff from 100 ms doubling each attempt, no jitter, no
/// circuit breaker, not cancellable.
pub struct RetrierBuilder<E> {
    config: RetryConfig<E>,
    strategy: Arc<dyn DelayStrategy>,
    jitter: Arc<dyn Jitter>,
    breaker: Option<Arc<CircuitBreaker>>,
    cancel: Option<CancellationToken>,
}

impl<E> RetrierBuilder<E> {
    fn new() -> Self {
        Self {
            config: RetryConfig::default(),
            strategy: Arc::new(strategy::exponential(Duration::from_millis(100))),
            jitter: Arc::new(NoJitter),
            breaker: None,
            cancel: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: RetryConfig<E>) -> Self {
        self.config = config;
        self
    }

    /// Set the attempt budget on the current configuration.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.config = self.config.with_max_attempts(max_attempts);
        self
    }

    /// Set the delay strategy.
    pub fn strategy<S>(mut self, strategy: S) -> Self
    where
        S: DelayStrategy + 'static,
    {
        self.strategy = Arc::new(strategy);
        self
    }

    /// Set the delay strategy from an already-shared instance.
    pub fn strategy_arc(mut self, strategy: Arc<dyn DelayStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the jitter function.
    pub fn jitter<J>(mut self, jitter: J) -> Self
    where
        J: Jitter + 'static,
    {
        self.jitter = Arc::new(jitter);
        self
    }

    /// Set the jitter function from an already-shared instance.
    pub fn jitter_arc(mut self, jitter: Arc<dyn Jitter>) -> Self {
        self.jitter = jitter;
        self
    }

    /// Attach a circuit breaker. The breaker may be shared with other
    /// retriers; sharing is the caller's choice.
    pub fn circuit_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Make executions cancellable through `token`. Cancellation observed
    /// at a suspension point surfaces as [`RetryError::Cancelled`].
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Build the retrier.
    pub fn build(self) -> Retrier<E> {
        Retrier {
            config: self.config,
            strategy: self.strategy,
            jitter: self.jitter,
            breaker: self.breaker,
            cancel: self.cancel,
        }
    }
}

impl<E> Default for RetrierBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Execute `operation` with an attempt budget and the given policies.
///
/// Attempts-first convenience wrapper around [`Retrier`]; the remaining
/// configuration keeps its defaults.
pub async fn execute<T, E, S, J, F, Fut>(
    max_attempts: u32,
    strategy: S,
    jitter: J,
    breaker: Option<Arc<CircuitBreaker>>,
    operation: F,
) -> RetryResult<T, E>
where
    T: Send,
    E: std::error::Error + Send + Sync + 'static,
    S: DelayStrategy + 'static,
    J: Jitter + 'static,
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<T, E>> + Send,
{
    execute_with_config(
        RetryConfig::new(max_attempts),
        strategy,
        jitter,
        breaker,
        operation,
    )
    .await
}

/// Execute `operation` under a full [`RetryConfig`] and the given policies.
///
/// Configuration-first convenience wrapper around [`Retrier`];
/// `config.max_attempts` governs the attempt count.
pub async fn execute_with_config<T, E, S, J, F, Fut>(
    config: RetryConfig<E>,
    strategy: S,
    jitter: J,
    breaker: Option<Arc<CircuitBreaker>>,
    operation: F,
) -> RetryResult<T, E>
where
    T: Send,
    E: std::error::Error + Send + Sync + 'static,
    S: DelayStrategy + 'static,
    J: Jitter + 'static,
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<T, E>> + Send,
{
    let mut builder = Retrier::builder().config(config).strategy(strategy).jitter(jitter);
    if let Some(breaker) = breaker {
        builder = builder.circuit_breaker(breaker);
    }
    builder.build().execute(operation).await
}
