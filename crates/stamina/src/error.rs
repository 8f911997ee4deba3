//! Error types for retry executions.
//!
//! Every terminal path of the retry engine produces exactly one variant of
//! [`RetryError`]. Errors the caller's policy chose not to retry are carried
//! verbatim in [`RetryError::Operation`], so the original error type stays
//! pattern-matchable.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for retry executions.
pub type RetryResult<T, E> = std::result::Result<T, RetryError<E>>;

/// Why a retry execution failed overall.
///
/// `E` is the caller's own error type. It appears untouched in
/// [`RetryError::Operation`] whenever the engine does not intervene (the
/// `should_retry` predicate rejected the error), preserving the caller's
/// ability to match on their own variants.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation failed with an error the configuration declined to
    /// retry. The payload is the original error, unchanged.
    #[error("operation failed: {0}")]
    Operation(E),

    /// All permitted attempts were consumed and every failure was deemed
    /// retryable.
    #[error("all {attempts} retry attempts exhausted; last error: {last_error}")]
    MaxAttemptsExceeded {
        /// Number of attempts made (equal to the configured maximum).
        attempts: u32,
        /// Description of the error from the final attempt.
        last_error: String,
    },

    /// The overall time budget was exhausted before a further attempt could
    /// start. The timeout gate runs before each attempt, never mid-attempt.
    #[error("retry timeout exceeded after {elapsed:?}")]
    Timeout {
        /// Wall-clock time elapsed since the execution started.
        elapsed: Duration,
    },

    /// Admission was denied by the circuit breaker; no attempt was made for
    /// this call.
    #[error("circuit breaker is open")]
    CircuitOpen,

    /// The surrounding task was cancelled while suspended (awaiting the
    /// operation or waiting out an inter-attempt delay).
    #[error("execution cancelled")]
    Cancelled,
}

impl<E> RetryError<E> {
    /// True if this is an [`RetryError::Operation`] error.
    pub fn is_operation(&self) -> bool {
        matches!(self, Self::Operation(_))
    }

    /// True if all attempts were exhausted.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::MaxAttemptsExceeded { .. })
    }

    /// True if the overall time budget ran out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// True if the circuit breaker denied admission.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen)
    }

    /// True if the execution was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Borrow the original operation error, if that is what this is.
    pub fn as_operation(&self) -> Option<&E> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }

    /// Extract the original operation error, if that is what this is.
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }
}
