//! CLI command handlers, one per file.

mod methods;
mod schedule;
mod simulate;

pub use methods::run_methods;
pub use schedule::run_schedule;
pub use simulate::run_simulate;
#[cfg(test)]
pub(crate) use simulate::{simulate_episode, Outcome};

use std::time::Duration;

/// Millisecond rendering used by every table; `-` for unset.
pub(crate) fn fmt_ms(d: Option<Duration>) -> String {
    match d {
        Some(d) if d.subsec_nanos() % 1_000_000 == 0 => format!("{}ms", d.as_millis()),
        Some(d) => format!("{:.3}ms", d.as_secs_f64() * 1000.0),
        None => "-".to_string(),
    }
}
