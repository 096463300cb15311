//! `rpcretry simulate` – run one retry episode on simulated time.

use anyhow::Result;
use rpcretry_core::{
    run_with_retry, Code, HasStatusCode, ManualClock, RetryError, RetryOptions, RpcError,
};
use std::cell::RefCell;
use std::fmt;
use std::time::Duration;

use super::fmt_ms;

/// Failure produced by the simulated operation.
#[derive(Debug)]
enum SimulatedFailure {
    Status(RpcError),
    /// Carries no status code, so the loop treats it as foreign.
    Local(String),
}

impl fmt::Display for SimulatedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatedFailure::Status(e) => write!(f, "{}", e),
            SimulatedFailure::Local(msg) => write!(f, "local failure: {}", msg),
        }
    }
}

impl HasStatusCode for SimulatedFailure {
    fn status_code(&self) -> Option<Code> {
        match self {
            SimulatedFailure::Status(e) => Some(e.code),
            SimulatedFailure::Local(_) => None,
        }
    }
}

/// One invocation of the simulated operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttemptRecord {
    pub started_at: Duration,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    Success,
    NonRetryable(Code),
    DeadlineExceeded { last: Option<String> },
    Foreign(String),
}

#[derive(Debug)]
pub(crate) struct Report {
    pub attempts: Vec<AttemptRecord>,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

/// Run an operation that fails `failures` times (with `code`, or with a
/// foreign error when `foreign` is set) and then succeeds. Every attempt
/// consumes its full per-attempt timeout of simulated time.
pub(crate) fn simulate_episode(
    options: &RetryOptions,
    failures: u32,
    code: Code,
    foreign: bool,
) -> Report {
    let clock = ManualClock::new();
    let op_clock = clock.clone();
    let attempts = RefCell::new(Vec::new());

    let result = run_with_retry(options, &clock, |timeout| {
        let mut log = attempts.borrow_mut();
        log.push(AttemptRecord {
            started_at: op_clock.elapsed(),
            timeout,
        });
        op_clock.advance(timeout.unwrap_or_default());
        if log.len() as u64 > u64::from(failures) {
            Ok(())
        } else if foreign {
            Err(SimulatedFailure::Local(format!("attempt {} crashed", log.len())))
        } else {
            Err(SimulatedFailure::Status(RpcError::new(
                code,
                format!("attempt {} failed", log.len()),
            )))
        }
    });

    let outcome = match result {
        Ok(()) => Outcome::Success,
        Err(RetryError::NonRetryable { code, .. }) => Outcome::NonRetryable(code),
        Err(RetryError::DeadlineExceeded { last, .. }) => Outcome::DeadlineExceeded {
            last: last.map(|e| e.to_string()),
        },
        Err(RetryError::Foreign(e)) => Outcome::Foreign(e.to_string()),
    };

    Report {
        attempts: attempts.into_inner(),
        outcome,
        elapsed: clock.elapsed(),
    }
}

pub fn run_simulate(
    options: &RetryOptions,
    failures: u32,
    code: Code,
    foreign: bool,
) -> Result<()> {
    let report = simulate_episode(options, failures, code, foreign);
    tracing::info!(
        attempts = report.attempts.len(),
        outcome = ?report.outcome,
        "simulation finished"
    );

    println!("{:<8} {:<12} {}", "ATTEMPT", "START", "RPC TIMEOUT");
    for (i, a) in report.attempts.iter().enumerate() {
        println!(
            "{:<8} {:<12} {}",
            i + 1,
            format!("+{}", fmt_ms(Some(a.started_at))),
            fmt_ms(a.timeout)
        );
    }
    println!();
    match &report.outcome {
        Outcome::Success => println!(
            "succeeded after {} attempt(s), {} simulated",
            report.attempts.len(),
            fmt_ms(Some(report.elapsed))
        ),
        Outcome::NonRetryable(code) => {
            println!("stopped: {} is not a retryable code", code)
        }
        Outcome::DeadlineExceeded { last } => println!(
            "deadline exceeded after {} ({} attempt(s)); last failure: {}",
            fmt_ms(Some(report.elapsed)),
            report.attempts.len(),
            last.as_deref().unwrap_or("none")
        ),
        Outcome::Foreign(msg) => println!("foreign failure passed through: {}", msg),
    }
    Ok(())
}
