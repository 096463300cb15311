use std::collections::BTreeSet;
use std::time::Duration;

use crate::status::Code;

/// Exponential backoff curve with caps and an optional overall deadline.
///
/// The delay between attempts starts at `initial_retry_delay` and grows by
/// `retry_delay_multiplier` after each retryable failure, capped at
/// `max_retry_delay`. The per-attempt RPC timeout grows the same way. When
/// `total_timeout` is `None` there is no deadline and the loop retries until
/// success or a non-retryable failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffSettings {
    pub initial_retry_delay: Duration,
    pub retry_delay_multiplier: f64,
    pub max_retry_delay: Duration,
    pub initial_rpc_timeout: Option<Duration>,
    pub rpc_timeout_multiplier: f64,
    pub max_rpc_timeout: Option<Duration>,
    pub total_timeout: Option<Duration>,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            initial_retry_delay: Duration::from_millis(100),
            retry_delay_multiplier: 1.3,
            max_retry_delay: Duration::from_secs(60),
            initial_rpc_timeout: Some(Duration::from_secs(20)),
            rpc_timeout_multiplier: 1.0,
            max_rpc_timeout: Some(Duration::from_secs(20)),
            total_timeout: Some(Duration::from_secs(600)),
        }
    }
}

/// Invalid backoff parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidMultiplier { field: &'static str, value: f64 },
}

impl BackoffSettings {
    /// Build settings from millisecond values, in the order client configs list them.
    pub fn from_millis(
        initial_retry_delay: u64,
        retry_delay_multiplier: f64,
        max_retry_delay: u64,
        initial_rpc_timeout: Option<u64>,
        rpc_timeout_multiplier: f64,
        max_rpc_timeout: Option<u64>,
        total_timeout: Option<u64>,
    ) -> Self {
        Self {
            initial_retry_delay: Duration::from_millis(initial_retry_delay),
            retry_delay_multiplier,
            max_retry_delay: Duration::from_millis(max_retry_delay),
            initial_rpc_timeout: initial_rpc_timeout.map(Duration::from_millis),
            rpc_timeout_multiplier,
            max_rpc_timeout: max_rpc_timeout.map(Duration::from_millis),
            total_timeout: total_timeout.map(Duration::from_millis),
        }
    }

    /// Reject negative, NaN or infinite multipliers.
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_multiplier("retry_delay_multiplier", self.retry_delay_multiplier)?;
        check_multiplier("rpc_timeout_multiplier", self.rpc_timeout_multiplier)?;
        Ok(())
    }

    /// Iterate the (delay, per-attempt timeout) pairs this curve produces,
    /// ignoring the deadline.
    pub fn curve(&self) -> BackoffCurve {
        BackoffCurve {
            settings: *self,
            current: BackoffStep {
                delay: self.initial_retry_delay,
                rpc_timeout: self.initial_rpc_timeout,
            },
        }
    }
}

fn check_multiplier(field: &'static str, value: f64) -> Result<(), SettingsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SettingsError::InvalidMultiplier { field, value })
    }
}

/// One point on the backoff curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffStep {
    /// Sleep after a retryable failure at this step.
    pub delay: Duration,
    /// Timeout handed to the operation at this step (before deadline clipping).
    pub rpc_timeout: Option<Duration>,
}

/// Infinite iterator over [`BackoffStep`]s.
#[derive(Debug, Clone)]
pub struct BackoffCurve {
    settings: BackoffSettings,
    current: BackoffStep,
}

impl BackoffCurve {
    pub fn current(&self) -> BackoffStep {
        self.current
    }

    /// Grow delay and timeout by their multipliers, capped.
    pub fn advance(&mut self) {
        let s = &self.settings;
        self.current.delay = grow(
            self.current.delay,
            s.retry_delay_multiplier,
            Some(s.max_retry_delay),
        );
        self.current.rpc_timeout = self
            .current
            .rpc_timeout
            .map(|t| grow(t, s.rpc_timeout_multiplier, s.max_rpc_timeout));
    }
}

impl Iterator for BackoffCurve {
    type Item = BackoffStep;

    fn next(&mut self) -> Option<BackoffStep> {
        let step = self.current;
        self.advance();
        Some(step)
    }
}

/// `min(current * multiplier, cap)`, computed in nanoseconds while that fits.
///
/// Negative or NaN multipliers count as zero; overflow saturates at
/// `Duration::MAX` before the cap applies.
fn grow(current: Duration, multiplier: f64, cap: Option<Duration>) -> Duration {
    let m = if multiplier >= 0.0 { multiplier } else { 0.0 };
    let nanos = (current.as_nanos() as f64 * m).round();
    let grown = if nanos < u64::MAX as f64 {
        Duration::from_nanos(nanos as u64)
    } else {
        Duration::try_from_secs_f64(current.as_secs_f64() * m).unwrap_or(Duration::MAX)
    };
    match cap {
        Some(cap) => grown.min(cap),
        None => grown,
    }
}

/// Retryable status codes plus the backoff curve to use for them.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOptions {
    pub retry_codes: BTreeSet<Code>,
    pub backoff: BackoffSettings,
}

impl RetryOptions {
    pub fn new(retry_codes: impl IntoIterator<Item = Code>, backoff: BackoffSettings) -> Self {
        Self {
            retry_codes: retry_codes.into_iter().collect(),
            backoff,
        }
    }

    pub fn is_retryable(&self, code: Code) -> bool {
        self.retry_codes.contains(&code)
    }
}
