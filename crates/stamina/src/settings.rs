//! Declarative policy settings.
//!
//! Serde-friendly descriptions of a retry stack, for wiring resilience from
//! configuration files instead of code. Each settings type knows how to
//! build its runtime counterpart; durations are given in milliseconds.
//!
//! ```rust
//! use stamina::settings::RetrySettings;
//!
//! let settings: RetrySettings = serde_json::from_str(
//!     r#"{
//!         "max_attempts": 5,
//!         "backoff": { "kind": "exponential", "base_ms": 100 },
//!         "jitter": { "kind": "full" },
//!         "breaker": { "failure_threshold": 3, "reset_timeout_ms": 30000 }
//!     }"#,
//! ).unwrap();
//!
//! let retrier = settings.retrier::<std::io::Error>();
//! # let _ = retrier;
//! ```

use crate::breaker::CircuitBreaker;
use crate::config::RetryConfig;
use crate::engine::Retrier;
use crate::jitter::{self, Jitter};
use crate::strategy::{self, DelayStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Delay strategy description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffSettings {
    /// Fixed delay between attempts.
    Constant {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// Delay growing by a fixed increment.
    Linear {
        /// First delay in milliseconds.
        base_ms: u64,
        /// Growth per attempt in milliseconds.
        increment_ms: u64,
    },
    /// Delay growing geometrically.
    Exponential {
        /// First delay in milliseconds.
        base_ms: u64,
        /// Growth factor per attempt.
        #[serde(default = "default_multiplier")]
        multiplier: f64,
    },
    /// Delay following the Fibonacci sequence.
    Fibonacci {
        /// Scale factor in milliseconds.
        base_ms: u64,
    },
}

fn default_multiplier() -> f64 {
    2.0
}

impl Default for BackoffSettings {
    /// Exponential from 100 ms, doubling.
    fn default() -> Self {
        Self::Exponential {
            base_ms: 100,
            multiplier: 2.0,
        }
    }
}

impl BackoffSettings {
    /// Build the described delay strategy.
    pub fn build(&self) -> Arc<dyn DelayStrategy> {
        match *self {
            Self::Constant { delay_ms } => {
                Arc::new(strategy::constant(Duration::from_millis(delay_ms)))
            }
            Self::Linear {
                base_ms,
                increment_ms,
            } => Arc::new(strategy::linear(
                Duration::from_millis(base_ms),
                Duration::from_millis(increment_ms),
            )),
            Self::Exponential {
                base_ms,
                multiplier,
            } => Arc::new(strategy::exponential_with_multiplier(
                Duration::from_millis(base_ms),
                multiplier,
            )),
            Self::Fibonacci { base_ms } => {
                Arc::new(strategy::fibonacci(Duration::from_millis(base_ms)))
            }
        }
    }
}

/// Jitter description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JitterSettings {
    /// No randomization.
    None,
    /// Uniform in `[0, delay]`.
    Full,
    /// Uniform in `[delay/2, delay]`.
    Equal,
    /// Uniform in `[base, 3 * delay]`.
    Decorrelated {
        /// Lower bound in milliseconds.
        #[serde(default = "default_decorrelated_base_ms")]
        base_ms: u64,
    },
}

fn default_decorrelated_base_ms() -> u64 {
    1000
}

impl Default for JitterSettings {
    fn default() -> Self {
        Self::None
    }
}

impl JitterSettings {
    /// Build the described jitter function.
    pub fn build(&self) -> Arc<dyn Jitter> {
        match *self {
            Self::None => Arc::new(jitter::none()),
            Self::Full => Arc::new(jitter::full()),
            Self::Equal => Arc::new(jitter::equal()),
            Self::Decorrelated { base_ms } => Arc::new(jitter::decorrelated_with_base(
                Duration::from_millis(base_ms),
            )),
        }
    }
}

/// Circuit breaker description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerSettings {
    /// Failures that trip the breaker.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Open-state cooldown in milliseconds.
    #[serde(default = "default_reset_timeout_ms")]
    pub reset_timeout_ms: u64,
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_reset_timeout_ms() -> u64 {
    60_000
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            reset_timeout_ms: default_reset_timeout_ms(),
        }
    }
}

impl BreakerSettings {
    /// Build the described breaker.
    pub fn build(&self) -> CircuitBreaker {
        CircuitBreaker::new(
            self.failure_threshold,
            Duration::from_millis(self.reset_timeout_ms),
        )
    }
}

/// A whole retry stack, described declaratively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempt budget.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Post-jitter delay cap in milliseconds.
    #[serde(default)]
    pub max_delay_ms: Option<u64>,
    /// Overall wall-clock budget in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Delay strategy.
    #[serde(default)]
    pub backoff: BackoffSettings,
    /// Jitter function.
    #[serde(default)]
    pub jitter: JitterSettings,
    /// Circuit breaker, if any.
    #[serde(default)]
    pub breaker: Option<BreakerSettings>,
}

fn default_max_attempts() -> u32 {
    3
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            max_delay_ms: None,
            timeout_ms: None,
            backoff: BackoffSettings::default(),
            jitter: JitterSettings::default(),
            breaker: None,
        }
    }
}

impl RetrySettings {
    /// Build the [`RetryConfig`] portion of these settings with the default
    /// (retry-everything) predicate.
    pub fn config<E>(&self) -> RetryConfig<E> {
        let mut config = RetryConfig::new(self.max_attempts);
        if let Some(ms) = self.max_delay_ms {
            config = config.with_max_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = self.timeout_ms {
            config = config.with_timeout(Duration::from_millis(ms));
        }
        config
    }

    /// Assemble a full [`Retrier`] from these settings. The breaker, when
    /// present, is freshly created and owned by this retrier; build it
    /// separately and use [`crate::engine::RetrierBuilder::circuit_breaker`]
    /// to share one across retriers.
    pub fn retrier<E>(&self) -> Retrier<E> {
        let mut builder = Retrier::builder()
            .config(self.config())
            .strategy_arc(self.backoff.build())
            .jitter_arc(self.jitter.build());
        if let Some(breaker) = &self.breaker {
            builder = builder.circuit_breaker(Arc::new(breaker.build()));
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_settings_round_trip() {
        let json = r#"{ "kind": "linear", "base_ms": 50, "increment_ms": 25 }"#;
        let settings: BackoffSettings = serde_json::from_str(json).unwrap();
        assert_eq!(
            settings,
            BackoffSettings::Linear {
                base_ms: 50,
                increment_ms: 25
            }
        );

        let strategy = settings.build();
        assert_eq!(strategy.delay(1), Duration::from_millis(50));
        assert_eq!(strategy.delay(3), Duration::from_millis(100));
    }

    #[test]
    fn exponential_multiplier_defaults_to_two() {
        let settings: BackoffSettings =
            serde_json::from_str(r#"{ "kind": "exponential", "base_ms": 100 }"#).unwrap();
        let strategy = settings.build();
        assert_eq!(strategy.delay(2), Duration::from_millis(200));
    }

    #[test]
    fn jitter_settings_build() {
        let settings: JitterSettings =
            serde_json::from_str(r#"{ "kind": "decorrelated", "base_ms": 10 }"#).unwrap();
        let jitter = settings.build();
        let sampled = jitter.apply(Duration::from_millis(100), 1);
        assert!(sampled >= Duration::from_millis(10));
        assert!(sampled <= Duration::from_millis(300));
    }

    #[test]
    fn breaker_settings_defaults_match_breaker_defaults() {
        let settings = BreakerSettings::default();
        let breaker = settings.build();
        assert_eq!(breaker.failure_threshold(), 5);
        assert_eq!(breaker.reset_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn full_stack_from_json() {
        let settings: RetrySettings = serde_json::from_str(
            r#"{
                "max_attempts": 4,
                "max_delay_ms": 2000,
                "timeout_ms": 10000,
                "backoff": { "kind": "fibonacci", "base_ms": 100 },
                "jitter": { "kind": "equal" },
                "breaker": { "failure_threshold": 2, "reset_timeout_ms": 5000 }
            }"#,
        )
        .unwrap();

        let config: RetryConfig<std::io::Error> = settings.config();
        assert_eq!(config.max_attempts(), 4);
        assert_eq!(config.max_delay(), Some(Duration::from_millis(2000)));
        assert_eq!(config.timeout(), Some(Duration::from_secs(10)));

        let retrier = settings.retrier::<std::io::Error>();
        let repr = format!("{retrier:?}");
        assert!(repr.contains("max_attempts: 4"));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let settings: RetrySettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, RetrySettings::default());
        assert_eq!(settings.max_attempts, 3);
        assert!(settings.breaker.is_none());
    }
}
