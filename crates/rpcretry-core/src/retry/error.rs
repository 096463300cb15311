//! Errors surfaced by the retry loop.

use std::time::Duration;

use crate::status::Code;

/// Terminal failure of one retry episode.
///
/// `E` is the operation's own error type. A foreign failure (one without a
/// status code) comes back as [`RetryError::Foreign`] holding the original
/// value, unchanged.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The operation failed with a recognized code that is not retryable.
    #[error("non-retryable RPC failure ({code})")]
    NonRetryable {
        code: Code,
        #[source]
        source: E,
    },

    /// The deadline passed while retrying. `last` is the most recent retryable
    /// failure, or `None` when the deadline had already passed before the
    /// first attempt.
    #[error("retry deadline of {total_timeout:?} exceeded after {attempts} attempt(s)")]
    DeadlineExceeded {
        total_timeout: Duration,
        attempts: u32,
        #[source]
        last: Option<E>,
    },

    /// Failure without a status code, passed through as-is.
    #[error(transparent)]
    Foreign(E),
}

impl<E> RetryError<E> {
    /// The underlying operation error, if any.
    pub fn cause(&self) -> Option<&E> {
        match self {
            RetryError::NonRetryable { source, .. } => Some(source),
            RetryError::DeadlineExceeded { last, .. } => last.as_ref(),
            RetryError::Foreign(e) => Some(e),
        }
    }

    /// Unwrap into the underlying operation error, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            RetryError::NonRetryable { source, .. } => Some(source),
            RetryError::DeadlineExceeded { last, .. } => last,
            RetryError::Foreign(e) => Some(e),
        }
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, RetryError::DeadlineExceeded { .. })
    }
}
