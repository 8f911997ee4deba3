//! Jitter functions: randomized perturbation of a computed delay.
//!
//! Jitter desynchronizes concurrent retriers so they do not hammer a
//! recovering backend in lockstep. A jitter function takes the base delay
//! produced by a [`crate::strategy::DelayStrategy`] and returns the delay
//! actually slept. Randomness comes from the thread-local RNG, which is
//! safe to use from any task.

use rand::Rng;
use std::time::Duration;

/// Randomized perturbation of a base delay.
///
/// Implementations never return a negative duration (enforced by
/// `Duration` itself) and must handle a zero base delay gracefully.
pub trait Jitter: Send + Sync {
    /// Apply jitter to `delay` for the given 1-based attempt number.
    fn apply(&self, delay: Duration, attempt: u32) -> Duration;
}

/// Pass-through: returns the delay unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn apply(&self, delay: Duration, _attempt: u32) -> Duration {
        delay
    }
}

/// Uniform random delay in `[0, delay]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullJitter;

impl Jitter for FullJitter {
    fn apply(&self, delay: Duration, _attempt: u32) -> Duration {
        sample(0.0, delay.as_secs_f64())
    }
}

/// Half the delay kept, half randomized: uniform in `[delay/2, delay]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualJitter;

impl Jitter for EqualJitter {
    fn apply(&self, delay: Duration, _attempt: u32) -> Duration {
        let half = delay.as_secs_f64() / 2.0;
        sample(half, delay.as_secs_f64())
    }
}

/// Uniform random delay in `[base, 3 * delay]`.
///
/// This variant is memoryless: each call samples from the incoming delay
/// alone and does not track the previously jittered delay across attempts.
/// When `base` exceeds `3 * delay` the sampling range is inverted and the
/// lower bound wins — `base` is returned.
#[derive(Debug, Clone, Copy)]
pub struct DecorrelatedJitter {
    base: Duration,
}

impl DecorrelatedJitter {
    /// Create a decorrelated jitter with the given lower bound.
    pub fn new(base: Duration) -> Self {
        Self { base }
    }
}

impl Default for DecorrelatedJitter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Jitter for DecorrelatedJitter {
    fn apply(&self, delay: Duration, _attempt: u32) -> Duration {
        let lower = self.base.as_secs_f64();
        let upper = delay.as_secs_f64() * 3.0;
        if lower >= upper {
            return self.base;
        }
        sample(lower, upper)
    }
}

/// Uniform sample from `[lower, upper]` as a `Duration`, saturating on
/// overflow. Callers guarantee `lower <= upper`.
fn sample(lower: f64, upper: f64) -> Duration {
    let secs = if lower == upper {
        lower
    } else {
        rand::thread_rng().gen_range(lower..=upper)
    };
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// No jitter: the computed delay is used as-is.
pub fn none() -> NoJitter {
    NoJitter
}

/// Full jitter: uniform in `[0, delay]`.
pub fn full() -> FullJitter {
    FullJitter
}

/// Equal jitter: uniform in `[delay/2, delay]`.
pub fn equal() -> EqualJitter {
    EqualJitter
}

/// Decorrelated jitter with a 1 second lower bound.
pub fn decorrelated() -> DecorrelatedJitter {
    DecorrelatedJitter::default()
}

/// Decorrelated jitter with an explicit lower bound.
pub fn decorrelated_with_base(base: Duration) -> DecorrelatedJitter {
    DecorrelatedJitter::new(base)
}
