//! Retry and backoff policy.
//!
//! This module holds the backoff curve ([`BackoffSettings`]), the set of
//! retryable status codes ([`RetryOptions`]), failure classification, and the
//! loop that ties them together so client stubs can wrap any fallible call
//! without knowing about retry semantics.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, Classification};
pub use error::RetryError;
pub use policy::{BackoffCurve, BackoffSettings, BackoffStep, RetryOptions, SettingsError};
pub use run::{retryable, run_with_retry, Retryable};
