//! Retry engine for RPC client stubs.
//!
//! Wrap a fallible call with [`retry::retryable`] (or run it once through
//! [`retry::run_with_retry`]) to retry transient status codes under an
//! exponential backoff bounded by an overall deadline.

pub mod client_config;
pub mod clock;
pub mod config;
pub mod logging;
pub mod merge;
pub mod retry;
pub mod status;

pub use clock::{Clock, ManualClock, SystemClock};
pub use retry::{
    classify, retryable, run_with_retry, BackoffSettings, Classification, RetryError,
    RetryOptions, Retryable,
};
pub use status::{Code, HasStatusCode, RpcError};
