#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Resilience primitives for async Rust.
//!
//! `stamina` wraps an arbitrary fallible asynchronous operation with retry,
//! backoff, jitter, and circuit-breaking policies:
//!
//! - **Delay strategies** via the [`strategy::DelayStrategy`] trait —
//!   constant, linear, exponential, and Fibonacci curves
//! - **Jitter** via the [`jitter::Jitter`] trait — full, equal, and
//!   decorrelated randomization to desynchronize concurrent retriers
//! - **Circuit breaking** via [`breaker::CircuitBreaker`] — a shareable
//!   admission-control state machine that fails fast while a backend is
//!   unhealthy and probes recovery after a cooldown
//! - **Orchestration** via [`engine::Retrier`] — attempt budgets, overall
//!   wall-clock timeouts, caller-supplied error classification, and
//!   cancellable suspension points
//!
//! Policies are plain values: build them once, share them freely, and every
//! execution stays independent. Shared mutable state is confined to the
//! circuit breaker, which any number of concurrent executions may reference.
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
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
//!     .execute(|| async {
//!         Ok::<_, std::io::Error>(42)
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! Sharing a breaker across executions:
//!
//! ```rust
//! use stamina::breaker::CircuitBreaker;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let breaker = Arc::new(CircuitBreaker::new(3, Duration::from_secs(30)));
//! assert!(breaker.should_allow_request());
//! ```

pub mod breaker;
pub mod config;
pub mod engine;
pub mod error;
pub mod jitter;
pub mod settings;
pub mod strategy;

/// Convenient re-exports of commonly used items.
///
/// Import the whole surface with:
///
/// ```rust
/// use stamina::prelude::*;
/// ```
pub mod prelude {
    pub use crate::breaker::{CircuitBreaker, CircuitState};
    pub use crate::config::RetryConfig;
    pub use crate::engine::{Retrier, RetrierBuilder, RetryOutcome};
    pub use crate::error::{RetryError, RetryResult};
    pub use crate::jitter::Jitter;
    pub use crate::strategy::DelayStrategy;
}
