//! Per-method retry settings from a JSON client config.
//!
//! Generated stubs ship a client config naming retry code sets and backoff
//! parameter sets per service, then point each method at one of each:
//!
//! ```json
//! {"interfaces": {"example.v1.Library": {
//!   "retry_codes": {"idempotent": ["UNAVAILABLE"], "non_idempotent": []},
//!   "retry_params": {"default": {"initial_retry_delay_millis": 100, ...}},
//!   "methods": {"GetBook": {"timeout_millis": 30000,
//!     "retry_codes_name": "idempotent", "retry_params_name": "default"}}}}}
//! ```
//!
//! An optional override document is merged over the base config first.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::BackoffConfig;
use crate::merge::merge_all;
use crate::retry::{BackoffSettings, RetryOptions, SettingsError};
use crate::status::Code;

#[derive(Debug, Deserialize)]
struct ClientConfig {
    #[serde(default)]
    interfaces: BTreeMap<String, InterfaceConfig>,
}

#[derive(Debug, Deserialize)]
struct InterfaceConfig {
    #[serde(default)]
    retry_codes: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    retry_params: BTreeMap<String, BackoffConfig>,
    #[serde(default)]
    methods: BTreeMap<String, MethodConfig>,
}

#[derive(Debug, Deserialize)]
struct MethodConfig {
    timeout_millis: u64,
    #[serde(default)]
    retry_codes_name: Option<String>,
    #[serde(default)]
    retry_params_name: Option<String>,
}

/// Resolved settings for one RPC method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSettings {
    /// Timeout used when the call is not retried.
    pub timeout: Duration,
    /// `None` when the method names no retry codes or params.
    pub retry: Option<RetryOptions>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientConfigError {
    #[error("malformed client config: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("service {0:?} not found in client config")]
    UnknownService(String),

    #[error("method {method}: retry_codes_name {name:?} is not defined")]
    UnknownRetryCodes { method: String, name: String },

    #[error("method {method}: retry_params_name {name:?} is not defined")]
    UnknownRetryParams { method: String, name: String },

    #[error("retry_codes {set:?} lists unknown status code {code:?}")]
    UnknownCode { set: String, code: String },

    #[error("retry_params {name:?} is invalid")]
    InvalidBackoff {
        name: String,
        #[source]
        source: SettingsError,
    },
}

/// Resolve every method of `service` into [`MethodSettings`].
///
/// `overrides`, when given, is merged over `config` (right-hand wins, objects
/// merge recursively) before anything is resolved.
pub fn construct_settings(
    service: &str,
    config: &Value,
    overrides: Option<&Value>,
) -> Result<BTreeMap<String, MethodSettings>, ClientConfigError> {
    let merged = merge_all(std::iter::once(config.clone()).chain(overrides.cloned()));
    let mut parsed: ClientConfig = serde_json::from_value(merged)?;
    let iface = parsed
        .interfaces
        .remove(service)
        .ok_or_else(|| ClientConfigError::UnknownService(service.to_string()))?;

    let mut code_sets: BTreeMap<&str, BTreeSet<Code>> = BTreeMap::new();
    for (set, names) in &iface.retry_codes {
        let codes = names
            .iter()
            .map(|n| {
                n.parse::<Code>().map_err(|_| ClientConfigError::UnknownCode {
                    set: set.clone(),
                    code: n.clone(),
                })
            })
            .collect::<Result<BTreeSet<Code>, _>>()?;
        code_sets.insert(set.as_str(), codes);
    }

    let mut params: BTreeMap<&str, BackoffSettings> = BTreeMap::new();
    for (name, cfg) in &iface.retry_params {
        let settings = BackoffSettings::from(cfg);
        settings
            .validate()
            .map_err(|source| ClientConfigError::InvalidBackoff {
                name: name.clone(),
                source,
            })?;
        params.insert(name.as_str(), settings);
    }

    let mut out = BTreeMap::new();
    for (method, m) in &iface.methods {
        let retry = match (&m.retry_codes_name, &m.retry_params_name) {
            (Some(codes_name), Some(params_name)) => {
                let codes = code_sets.get(codes_name.as_str()).ok_or_else(|| {
                    ClientConfigError::UnknownRetryCodes {
                        method: method.clone(),
                        name: codes_name.clone(),
                    }
                })?;
                let backoff = params.get(params_name.as_str()).ok_or_else(|| {
                    ClientConfigError::UnknownRetryParams {
                        method: method.clone(),
                        name: params_name.clone(),
                    }
                })?;
                Some(RetryOptions {
                    retry_codes: codes.clone(),
                    backoff: *backoff,
                })
            }
            _ => None,
        };
        tracing::debug!(
            service,
            method = %method,
            retrying = retry.is_some(),
            "resolved method settings"
        );
        out.insert(
            method.clone(),
            MethodSettings {
                timeout: Duration::from_millis(m.timeout_millis),
                retry,
            },
        );
    }
    Ok(out)
}

/// Read a JSON client config from disk.
pub fn load_client_config(path: &Path) -> Result<Value> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read client config {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parse client config {}", path.display()))
}
