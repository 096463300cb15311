//! Retry loop: run an operation until success, a terminal failure, or the deadline.

use std::time::Duration;

use super::classify::{classify, Classification};
use super::error::RetryError;
use super::policy::RetryOptions;
use crate::clock::{Clock, SystemClock};
use crate::status::HasStatusCode;

/// Run one retry episode of `op` under `options`.
///
/// `op` receives the per-attempt timeout (clipped to the time left before the
/// deadline) and may ignore it. Delay, timeout and deadline start fresh on
/// every call.
pub fn run_with_retry<T, E, F, C>(
    options: &RetryOptions,
    clock: &C,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(Option<Duration>) -> Result<T, E>,
    E: HasStatusCode + std::fmt::Display,
    C: Clock + ?Sized,
{
    let backoff = &options.backoff;
    let mut curve = backoff.curve();
    let deadline = backoff
        .total_timeout
        .and_then(|total| clock.now().checked_add(total));
    let mut last: Option<E> = None;
    let mut attempts = 0u32;

    loop {
        let now = clock.now();
        let remaining = match deadline {
            Some(d) if now >= d => {
                tracing::warn!(
                    attempts,
                    total_timeout = ?backoff.total_timeout,
                    "retry deadline exceeded"
                );
                return Err(RetryError::DeadlineExceeded {
                    total_timeout: backoff.total_timeout.unwrap_or_default(),
                    attempts,
                    last,
                });
            }
            Some(d) => Some(d - now),
            None => None,
        };

        let step = curve.current();
        let timeout = match (step.rpc_timeout, remaining) {
            (Some(t), Some(r)) => Some(t.min(r)),
            (None, Some(r)) => Some(r),
            (t, None) => t,
        };

        attempts += 1;
        let err = match op(timeout) {
            Ok(value) => {
                if attempts > 1 {
                    tracing::info!(attempts, "operation succeeded after retries");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        match classify(&err, &options.retry_codes) {
            Classification::Foreign => {
                tracing::debug!(attempt = attempts, "foreign failure, not retrying: {}", err);
                return Err(RetryError::Foreign(err));
            }
            Classification::NonRetryable(code) => {
                tracing::debug!(attempt = attempts, %code, "non-retryable failure: {}", err);
                return Err(RetryError::NonRetryable { code, source: err });
            }
            Classification::Retryable(code) => {
                let mut delay = step.delay;
                if let Some(d) = deadline {
                    delay = delay.min(d.saturating_duration_since(clock.now()));
                }
                tracing::debug!(
                    attempt = attempts,
                    %code,
                    ?delay,
                    ?timeout,
                    "retryable failure: {}",
                    err
                );
                last = Some(err);
                if !delay.is_zero() {
                    clock.sleep(delay);
                }
                curve.advance();
            }
        }
    }
}

/// An operation wrapped with retry semantics. Build with [`retryable`].
#[derive(Debug, Clone)]
pub struct Retryable<F, C = SystemClock> {
    op: F,
    options: RetryOptions,
    clock: C,
}

/// Wrap `op` so each [`Retryable::call`] is a full retry episode on the
/// system clock.
pub fn retryable<T, E, F>(op: F, options: RetryOptions) -> Retryable<F>
where
    F: FnMut(Option<Duration>) -> Result<T, E>,
{
    Retryable {
        op,
        options,
        clock: SystemClock,
    }
}

impl<F, C> Retryable<F, C> {
    /// Swap the time source (e.g. a `ManualClock` in tests).
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Retryable<F, C2> {
        Retryable {
            op: self.op,
            options: self.options,
            clock,
        }
    }

    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    /// Run one episode.
    pub fn call<T, E>(&mut self) -> Result<T, RetryError<E>>
    where
        F: FnMut(Option<Duration>) -> Result<T, E>,
        E: HasStatusCode + std::fmt::Display,
        C: Clock,
    {
        run_with_retry(&self.options, &self.clock, &mut self.op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::retry::policy::BackoffSettings;
    use crate::status::{Code, RpcError};

    fn opts(codes: &[Code], backoff: BackoffSettings) -> RetryOptions {
        RetryOptions::new(codes.iter().copied(), backoff)
    }

    #[test]
    fn timeout_is_clipped_to_remaining_time() {
        let clock = ManualClock::new();
        let backoff = BackoffSettings::from_millis(0, 1.0, 0, Some(1000), 1.0, Some(1000), Some(300));
        let mut seen = Vec::new();
        let op_clock = clock.clone();
        let result: Result<(), _> = run_with_retry(&opts(&[Code::Unavailable], backoff), &clock, |t| {
            seen.push(t);
            op_clock.advance(Duration::from_millis(100));
            Err(RpcError::new(Code::Unavailable, "down"))
        });
        assert!(matches!(result, Err(RetryError::DeadlineExceeded { attempts: 3, .. })));
        assert_eq!(
            seen,
            vec![
                Some(Duration::from_millis(300)),
                Some(Duration::from_millis(200)),
                Some(Duration::from_millis(100)),
            ]
        );
    }

    #[test]
    fn unset_timeout_gets_remaining_time_under_deadline() {
        let clock = ManualClock::new();
        let backoff = BackoffSettings::from_millis(0, 1.0, 0, None, 1.0, None, Some(50));
        let mut seen = None;
        let result = run_with_retry(&opts(&[], backoff), &clock, |t| {
            seen = Some(t);
            Ok::<_, RpcError>(7)
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(seen, Some(Some(Duration::from_millis(50))));
    }

    #[test]
    fn sleep_never_runs_past_deadline() {
        let clock = ManualClock::new();
        let backoff = BackoffSettings::from_millis(400, 1.0, 400, None, 1.0, None, Some(1000));
        let result: Result<(), _> = run_with_retry(&opts(&[Code::Aborted], backoff), &clock, |_| {
            Err(RpcError::new(Code::Aborted, "conflict"))
        });
        assert!(result.unwrap_err().is_deadline_exceeded());
        assert_eq!(
            clock.sleeps(),
            vec![
                Duration::from_millis(400),
                Duration::from_millis(400),
                Duration::from_millis(200),
            ]
        );
        assert_eq!(clock.elapsed(), Duration::from_millis(1000));
    }

    #[test]
    fn wrapper_restarts_backoff_each_call() {
        let clock = ManualClock::new();
        let backoff = BackoffSettings::from_millis(10, 2.0, 1000, None, 1.0, None, None);
        let mut failures_left = 0;
        let mut wrapped = retryable(
            |_| {
                if failures_left > 0 {
                    failures_left -= 1;
                    Err(RpcError::new(Code::Unavailable, "down"))
                } else {
                    failures_left = 2;
                    Ok(())
                }
            },
            opts(&[Code::Unavailable], backoff),
        )
        .with_clock(clock.clone());

        wrapped.call().unwrap();
        wrapped.call().unwrap();
        wrapped.call().unwrap();
        let ten = Duration::from_millis(10);
        let twenty = Duration::from_millis(20);
        assert_eq!(clock.sleeps(), vec![ten, twenty, ten, twenty]);
    }
}
