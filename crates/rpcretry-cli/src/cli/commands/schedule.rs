//! `rpcretry schedule` – print the backoff curve.

use anyhow::Result;
use rpcretry_core::RetryOptions;

use super::fmt_ms;

pub fn run_schedule(options: &RetryOptions, steps: usize) -> Result<()> {
    let backoff = &options.backoff;
    let codes: Vec<&str> = options.retry_codes.iter().map(|c| c.as_str()).collect();
    let codes = if codes.is_empty() {
        "(none)".to_string()
    } else {
        codes.join(", ")
    };
    println!("retry codes: {}", codes);
    println!("deadline:    {}", fmt_ms(backoff.total_timeout));
    println!();
    println!("{:<6} {:<12} {}", "STEP", "DELAY", "RPC TIMEOUT");
    for (i, step) in backoff.curve().take(steps).enumerate() {
        println!(
            "{:<6} {:<12} {}",
            i + 1,
            fmt_ms(Some(step.delay)),
            fmt_ms(step.rpc_timeout)
        );
    }
    Ok(())
}
