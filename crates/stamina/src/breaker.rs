//! Circuit breaker: admission control for repeatedly failing backends.
//!
//! A breaker guards call admission with a small state machine:
//!
//! ```text
//! Closed ──[failure_threshold failures]──> Open
//!   ▲                                        │
//!   │                                        │ [reset_timeout elapses, next query]
//!   │                                        ▼
//!   └────────[success recorded]──────── HalfOpen
//!                 [any failure] ─────────────> Open
//! ```
//!
//! One breaker instance may be shared (via `Arc`) by any number of
//! concurrent retry executions against the same backend, so they agree on
//! whether it is currently considered healthy. All operations are
//! serialized under one mutex; the critical sections are short and never
//! held across an await point.
//!
//! # Examples
//!
//! ```rust
//! use stamina::breaker::{CircuitBreaker, CircuitState};
//! use std::time::Duration;
//!
//! let breaker = CircuitBreaker::new(2, Duration::from_secs(30));
//! assert_eq!(breaker.current_state(), CircuitState::Closed);
//!
//! breaker.record_failure();
//! breaker.record_failure();
//! assert!(!breaker.should_allow_request());
//! ```

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Snapshot of a breaker's position in the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation; every request is admitted.
    Closed,
    /// Tripped; requests are denied until `reset_timeout` has elapsed
    /// since `since`.
    Open {
        /// Moment the breaker transitioned to open.
        since: Instant,
    },
    /// Probing recovery; requests are admitted, the next recorded outcome
    /// decides the direction.
    HalfOpen,
}

impl CircuitState {
    /// True if the breaker is closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// True if the breaker is open.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// True if the breaker is half-open.
    pub fn is_half_open(&self) -> bool {
        matches!(self, Self::HalfOpen)
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
}

/// Admission-control state machine shared across retry executions.
///
/// Created by the caller and optionally shared by reference; all mutation
/// goes through its own operations, which observe a consistent, linearized
/// state.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    reset_timeout: Duration,
    inner: Mutex<BreakerInner>,
}

impl Default for CircuitBreaker {
    /// A breaker that opens after 5 failures and probes after 60 seconds.
    fn default() -> Self {
        Self::new(5, Duration::from_secs(60))
    }
}

impl CircuitBreaker {
    /// Create a breaker that opens once `failure_threshold` failures have
    /// accumulated and admits a probe after `reset_timeout` in the open
    /// state. A threshold of 0 is treated as 1.
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            reset_timeout,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
            }),
        }
    }

    /// Number of failures that trip the breaker.
    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// How long the breaker stays open before admitting a probe.
    pub fn reset_timeout(&self) -> Duration {
        self.reset_timeout
    }

    /// Whether a request should be admitted right now.
    ///
    /// In `Open`, this is also where the timed transition happens: once
    /// `reset_timeout` has elapsed the breaker moves to `HalfOpen`, zeroes
    /// its failure count, and admits the request. There is no background
    /// timer; the transition is driven entirely by queries.
    pub fn should_allow_request(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open { since } => {
                if since.elapsed() >= self.reset_timeout {
                    inner.state = CircuitState::HalfOpen;
                    inner.failure_count = 0;
                    info!(
                        reset_timeout_ms = self.reset_timeout.as_millis() as u64,
                        "circuit half-open, admitting probe"
                    );
                    true
                } else {
                    false
                }
            }
            // Probes are not limited: any call while half-open is admitted.
            CircuitState::HalfOpen => true,
        }
    }

    /// Record a successful call. Zeroes the failure count; a half-open
    /// breaker closes.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        inner.failure_count = 0;
        if inner.state.is_half_open() {
            inner.state = CircuitState::Closed;
            info!("circuit closed after successful probe");
        }
    }

    /// Record a failed call. Trips the breaker when the count reaches the
    /// threshold; a half-open breaker re-opens on any failure. Opening
    /// always stamps a fresh timestamp.
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.failure_count = inner.failure_count.saturating_add(1);
        let tripped =
            inner.state.is_half_open() || inner.failure_count >= self.failure_threshold;
        if tripped {
            inner.state = CircuitState::Open {
                since: Instant::now(),
            };
            warn!(
                failures = inner.failure_count,
                threshold = self.failure_threshold,
                "circuit opened"
            );
        }
    }

    /// Unconditionally return to `Closed` with a zero failure count,
    /// discarding any open/half-open timers.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        debug!("circuit reset");
    }

    /// Read-only snapshot of the current state.
    pub fn current_state(&self) -> CircuitState {
        self.lock().state
    }

    /// Read-only snapshot of the accumulated failure count.
    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    // A poisoned mutex means a panic mid-transition; the state itself is
    // always a valid variant, so keep serving rather than propagate.
    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn starts_closed_with_zero_failures() {
        let breaker = CircuitBreaker::default();
        assert_eq!(breaker.current_state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 0);
        assert_eq!(breaker.failure_threshold(), 5);
        assert_eq!(breaker.reset_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn opens_after_threshold_failures() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        breaker.record_failure();
        breaker.record_failure();
        assert!(breaker.current_state().is_closed());

        breaker.record_failure();
        assert!(breaker.current_state().is_open());
        assert!(!breaker.should_allow_request());
    }

    #[test]
    fn success_resets_failure_count_while_closed() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        assert_eq!(breaker.failure_count(), 0);

        // The count starts over; two more failures do not trip it.
        breaker.record_failure();
        breaker.record_failure();
        assert!(breaker.current_state().is_closed());
    }

    #[tokio::test]
    async fn half_open_after_reset_timeout() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(40));
        breaker.record_failure();
        assert!(!breaker.should_allow_request());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(breaker.should_allow_request());
        assert!(breaker.current_state().is_half_open());
        assert_eq!(breaker.failure_count(), 0);
    }

    #[tokio::test]
    async fn half_open_success_closes() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(20));
        breaker.record_failure();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(breaker.should_allow_request());

        breaker.record_success();
        assert_eq!(breaker.current_state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 0);
    }

    #[tokio::test]
    async fn half_open_failure_reopens() {
        let breaker = CircuitBreaker::new(5, Duration::from_millis(20));
        for _ in 0..5 {
            breaker.record_failure();
        }
        assert!(breaker.current_state().is_open());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(breaker.should_allow_request());
        assert!(breaker.current_state().is_half_open());

        // One failure while half-open re-opens immediately, even though the
        // count is far below the threshold.
        breaker.record_failure();
        assert!(breaker.current_state().is_open());
        assert!(!breaker.should_allow_request());
    }

    #[tokio::test]
    async fn reopening_stamps_a_fresh_timestamp() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(50));
        breaker.record_failure();
        tokio::time::sleep(Duration::from_millis(70)).await;
        assert!(breaker.should_allow_request());

        breaker.record_failure();
        // Re-opened just now: the reset window starts over.
        assert!(!breaker.should_allow_request());
        tokio::time::sleep(Duration::from_millis(70)).await;
        assert!(breaker.should_allow_request());
    }

    #[test]
    fn reset_is_idempotent_from_any_state() {
        let breaker = CircuitBreaker::new(1, Duration::from_secs(60));

        breaker.reset();
        assert_eq!(breaker.current_state(), CircuitState::Closed);

        breaker.record_failure();
        assert!(breaker.current_state().is_open());
        breaker.reset();
        assert_eq!(breaker.current_state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 0);

        breaker.reset();
        assert_eq!(breaker.current_state(), CircuitState::Closed);
    }

    #[test]
    fn zero_threshold_is_clamped_to_one() {
        let breaker = CircuitBreaker::new(0, Duration::from_secs(1));
        assert_eq!(breaker.failure_threshold(), 1);
        breaker.record_failure();
        assert!(breaker.current_state().is_open());
    }

    #[test]
    fn shared_breaker_is_consistent_across_threads() {
        let breaker = Arc::new(CircuitBreaker::new(64, Duration::from_secs(60)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let breaker = Arc::clone(&breaker);
                std::thread::spawn(move || {
                    for _ in 0..8 {
                        breaker.record_failure();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        // 64 failures against a threshold of 64: no lost updates.
        assert!(breaker.current_state().is_open());
    }
}
