//! `rpcretry methods` – resolve per-method settings from a client config.

use anyhow::{Context, Result};
use rpcretry_core::client_config::{construct_settings, load_client_config};
use std::path::Path;

use super::fmt_ms;

pub fn run_methods(client_config: &Path, service: &str, overrides: Option<&Path>) -> Result<()> {
    let base = load_client_config(client_config)?;
    let overrides = overrides.map(load_client_config).transpose()?;
    let methods = construct_settings(service, &base, overrides.as_ref())
        .with_context(|| format!("resolve {} from {}", service, client_config.display()))?;

    if methods.is_empty() {
        println!("No methods configured for {}.", service);
        return Ok(());
    }
    println!(
        "{:<24} {:<10} {:<36} {}",
        "METHOD", "TIMEOUT", "RETRY CODES", "BACKOFF (delay/x/max, timeout/x/max, total)"
    );
    for (name, m) in methods {
        let (codes, backoff) = match &m.retry {
            Some(r) => {
                let codes: Vec<&str> = r.retry_codes.iter().map(|c| c.as_str()).collect();
                let b = &r.backoff;
                (
                    if codes.is_empty() {
                        "(none)".to_string()
                    } else {
                        codes.join(",")
                    },
                    format!(
                        "{}/{}/{}, {}/{}/{}, {}",
                        fmt_ms(Some(b.initial_retry_delay)),
                        b.retry_delay_multiplier,
                        fmt_ms(Some(b.max_retry_delay)),
                        fmt_ms(b.initial_rpc_timeout),
                        b.rpc_timeout_multiplier,
                        fmt_ms(b.max_rpc_timeout),
                        fmt_ms(b.total_timeout),
                    ),
                )
            }
            None => ("-".to_string(), "no retry".to_string()),
        };
        println!(
            "{:<24} {:<10} {:<36} {}",
            name,
            fmt_ms(Some(m.timeout)),
            codes,
            backoff
        );
    }
    Ok(())
}
