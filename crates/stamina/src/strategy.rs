//! Delay strategies: pure curves from attempt number to base delay.
//!
//! A strategy computes the delay that follows a failed attempt. Strategies
//! are stateless and side-effect free; randomization lives in
//! [`crate::jitter`] and capping at a maximum delay is the engine's job,
//! applied uniformly after jitter.
//!
//! # Examples
//!
//! ```rust
//! use stamina::strategy::{self, DelayStrategy};
//! use std::time::Duration;
//!
//! let backoff = strategy::exponential(Duration::from_millis(100));
//! assert_eq!(backoff.delay(1), Duration::from_millis(100));
//! assert_eq!(backoff.delay(4), Duration::from_millis(800));
//! ```

use std::time::Duration;

/// A curve from attempt number to base delay.
///
/// `attempt` is 1-based: `delay(1)` is the wait scheduled after the first
/// failed attempt. Implementations must be pure — same input, same output,
/// no side effects.
pub trait DelayStrategy: Send + Sync {
    /// Compute the base delay for the given 1-based attempt number.
    fn delay(&self, attempt: u32) -> Duration;
}

/// Fixed delay regardless of attempt number.
#[derive(Debug, Clone, Copy)]
pub struct Constant {
    delay: Duration,
}

impl Constant {
    /// Create a constant delay strategy.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl DelayStrategy for Constant {
    fn delay(&self, _attempt: u32) -> Duration {
        self.delay
    }
}

/// Delay growing by a fixed increment each attempt:
/// `base + increment * (attempt - 1)`.
#[derive(Debug, Clone, Copy)]
pub struct Linear {
    base: Duration,
    increment: Duration,
}

impl Linear {
    /// Create a linear delay strategy.
    pub fn new(base: Duration, increment: Duration) -> Self {
        Self { base, increment }
    }
}

impl DelayStrategy for Linear {
    fn delay(&self, attempt: u32) -> Duration {
        let steps = attempt.max(1) - 1;
        self.base
            .saturating_add(self.increment.saturating_mul(steps))
    }
}

/// Delay growing geometrically: `base * multiplier^(attempt - 1)`.
#[derive(Debug, Clone, Copy)]
pub struct Exponential {
    base: Duration,
    multiplier: f64,
}

impl Exponential {
    /// Create an exponential delay strategy with an explicit multiplier.
    pub fn new(base: Duration, multiplier: f64) -> Self {
        Self { base, multiplier }
    }
}

impl DelayStrategy for Exponential {
    fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.max(1) - 1;
        let secs = self.base.as_secs_f64() * self.multiplier.powi(exponent as i32);
        // Saturate rather than panic when the curve outruns Duration.
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

/// Delay following the Fibonacci sequence: `base * fib(attempt)` with
/// `fib(1) = fib(2) = 1`.
#[derive(Debug, Clone, Copy)]
pub struct Fibonacci {
    base: Duration,
}

impl Fibonacci {
    /// Create a Fibonacci delay strategy.
    pub fn new(base: Duration) -> Self {
        Self { base }
    }
}

impl DelayStrategy for Fibonacci {
    fn delay(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(fib(attempt.max(1)))
    }
}

/// Iterative Fibonacci, saturating at `u32::MAX`. O(n), no stack growth.
fn fib(n: u32) -> u32 {
    let (mut prev, mut curr) = (0u32, 1u32);
    for _ in 1..n {
        let next = prev.saturating_add(curr);
        prev = curr;
        curr = next;
    }
    curr
}

/// Fixed delay `d` between every attempt.
pub fn constant(delay: Duration) -> Constant {
    Constant::new(delay)
}

/// Delay starting at `base` and growing by `increment` each attempt.
pub fn linear(base: Duration, increment: Duration) -> Linear {
    Linear::new(base, increment)
}

/// Delay doubling each attempt, starting at `base`.
pub fn exponential(base: Duration) -> Exponential {
    Exponential::new(base, 2.0)
}

/// Delay growing by `multiplier` each attempt, starting at `base`.
pub fn exponential_with_multiplier(base: Duration, multiplier: f64) -> Exponential {
    Exponential::new(base, multiplier)
}

/// Delay following the Fibonacci sequence scaled by `base`.
pub fn fibonacci(base: Duration) -> Fibonacci {
    Fibonacci::new(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn constant_is_flat() {
        let s = constant(Duration::from_millis(250));
        for attempt in 1..=64 {
            assert_eq!(s.delay(attempt), Duration::from_millis(250));
        }
    }

    #[rstest]
    #[case(1, 100)]
    #[case(2, 150)]
    #[case(3, 200)]
    #[case(10, 550)]
    fn linear_grows_by_increment(#[case] attempt: u32, #[case] expected_ms: u64) {
        let s = linear(Duration::from_millis(100), Duration::from_millis(50));
        assert_eq!(s.delay(attempt), Duration::from_millis(expected_ms));
    }

    #[rstest]
    #[case(1, 100)]
    #[case(2, 200)]
    #[case(3, 400)]
    #[case(4, 800)]
    fn exponential_doubles(#[case] attempt: u32, #[case] expected_ms: u64) {
        let s = exponential(Duration::from_millis(100));
        assert_eq!(s.delay(attempt), Duration::from_millis(expected_ms));
    }

    #[test]
    fn exponential_custom_multiplier() {
        let s = exponential_with_multiplier(Duration::from_secs(1), 3.0);
        assert_eq!(s.delay(1), Duration::from_secs(1));
        assert_eq!(s.delay(2), Duration::from_secs(3));
        assert_eq!(s.delay(3), Duration::from_secs(9));
    }

    #[test]
    fn exponential_saturates_instead_of_panicking() {
        let s = exponential_with_multiplier(Duration::from_secs(1), 10.0);
        assert_eq!(s.delay(1000), Duration::MAX);
    }

    #[test]
    fn fibonacci_sequence() {
        let s = fibonacci(Duration::from_secs(1));
        let expected = [1u64, 1, 2, 3, 5, 8, 13, 21];
        for (i, secs) in expected.iter().enumerate() {
            assert_eq!(s.delay(i as u32 + 1), Duration::from_secs(*secs));
        }
    }

    #[test]
    fn fibonacci_saturates_for_large_attempts() {
        let s = fibonacci(Duration::from_secs(1));
        // fib(50) overflows u32; the delay must still be finite and monotone.
        assert!(s.delay(50) >= s.delay(49));
    }

    proptest! {
        #[test]
        fn linear_formula_holds(base_ms in 0u64..10_000, inc_ms in 0u64..10_000, attempt in 1u32..1000) {
            let s = linear(Duration::from_millis(base_ms), Duration::from_millis(inc_ms));
            let expected = base_ms + inc_ms * u64::from(attempt - 1);
            prop_assert_eq!(s.delay(attempt), Duration::from_millis(expected));
        }

        #[test]
        fn exponential_formula_holds(base_ms in 1u64..1000, attempt in 1u32..20) {
            let s = exponential(Duration::from_millis(base_ms));
            let expected = base_ms as f64 / 1000.0 * 2f64.powi(attempt as i32 - 1);
            let got = s.delay(attempt).as_secs_f64();
            prop_assert!((got - expected).abs() < 1e-9);
        }

        #[test]
        fn delays_are_monotone_for_growing_curves(attempt in 1u32..100) {
            let lin = linear(Duration::from_millis(10), Duration::from_millis(5));
            let exp = exponential(Duration::from_millis(10));
            let fib = fibonacci(Duration::from_millis(10));
            prop_assert!(lin.delay(attempt + 1) >= lin.delay(attempt));
            prop_assert!(exp.delay(attempt + 1) >= exp.delay(attempt));
            prop_assert!(fib.delay(attempt + 1) >= fib.delay(attempt));
        }
    }
}
