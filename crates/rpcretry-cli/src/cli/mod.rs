//! CLI for inspecting and simulating retry policies.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rpcretry_core::{config, logging};
use rpcretry_core::{Code, RetryOptions};
use std::path::{Path, PathBuf};

use commands::{run_methods, run_schedule, run_simulate};

/// Top-level CLI for rpcretry.
#[derive(Debug, Parser)]
#[command(name = "rpcretry")]
#[command(about = "rpcretry: inspect and simulate RPC retry policies", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the backoff curve: delay and per-attempt timeout for each step.
    Schedule {
        /// Retry config (TOML). Defaults to ~/.config/rpcretry/config.toml.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Number of steps to print.
        #[arg(long, default_value = "10", value_name = "N")]
        steps: usize,
    },

    /// Run the retry loop on simulated time against an operation that fails N times.
    Simulate {
        /// Retry config (TOML). Defaults to ~/.config/rpcretry/config.toml.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Number of failures before the operation succeeds.
        #[arg(long, value_name = "N")]
        failures: u32,
        /// Status code the failures carry.
        #[arg(long, default_value = "UNAVAILABLE", value_name = "CODE")]
        code: Code,
        /// Fail with an error that carries no status code instead.
        #[arg(long)]
        foreign: bool,
    },

    /// Resolve per-method retry settings from a JSON client config.
    Methods {
        /// Path to the client config JSON.
        #[arg(long, value_name = "PATH")]
        client_config: PathBuf,
        /// Fully-qualified service name, e.g. example.v1.Library.
        #[arg(long)]
        service: String,
        /// JSON document merged over the client config first.
        #[arg(long = "override", value_name = "PATH")]
        overrides: Option<PathBuf>,
    },
}

/// Retry options from an explicit config file, or the default one (created if missing).
fn load_options(path: Option<&Path>) -> Result<RetryOptions> {
    let cfg = match path {
        Some(p) => config::load_from_path(p)?,
        None => config::load_or_init()?,
    };
    tracing::debug!("loaded config: {:?}", cfg);
    cfg.to_options()
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Schedule { config, steps } => {
                let options = load_options(config.as_deref())?;
                run_schedule(&options, steps)?;
            }
            CliCommand::Simulate {
                config,
                failures,
                code,
                foreign,
            } => {
                let options = load_options(config.as_deref())?;
                run_simulate(&options, failures, code, foreign)?;
            }
            CliCommand::Methods {
                client_config,
                service,
                overrides,
            } => run_methods(&client_config, &service, overrides.as_deref())?,
        }

        Ok(())
    }
}

/// Log to the state dir when possible, stderr otherwise. Returns a message
/// for the user when no subscriber could be installed.
pub fn init_logging() -> Option<String> {
    let file_err = match logging::init_logging() {
        Ok(_) => return None,
        Err(e) => e,
    };
    match logging::init_logging_stderr() {
        Ok(()) => {
            tracing::warn!("file logging unavailable: {:#}", file_err);
            None
        }
        Err(e) => Some(format!(
            "logging disabled: {:#} (file logging: {:#})",
            e, file_err
        )),
    }
}

#[cfg(test)]
mod tests;
