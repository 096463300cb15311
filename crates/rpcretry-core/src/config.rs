use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::retry::{BackoffSettings, RetryOptions};
use crate::status::Code;

/// Backoff curve in milliseconds (the `[backoff]` section of config.toml).
///
/// Field names match the `retry_params` entries of JSON client configs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    pub initial_retry_delay_millis: u64,
    pub retry_delay_multiplier: f64,
    pub max_retry_delay_millis: u64,
    /// Omit to hand the operation no per-attempt timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_rpc_timeout_millis: Option<u64>,
    #[serde(default = "default_multiplier")]
    pub rpc_timeout_multiplier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rpc_timeout_millis: Option<u64>,
    /// Omit to retry with no overall deadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_timeout_millis: Option<u64>,
}

fn default_multiplier() -> f64 {
    1.0
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_retry_delay_millis: 100,
            retry_delay_multiplier: 1.3,
            max_retry_delay_millis: 60_000,
            initial_rpc_timeout_millis: Some(20_000),
            rpc_timeout_multiplier: 1.0,
            max_rpc_timeout_millis: Some(20_000),
            total_timeout_millis: Some(600_000),
        }
    }
}

impl From<&BackoffConfig> for BackoffSettings {
    fn from(c: &BackoffConfig) -> Self {
        BackoffSettings::from_millis(
            c.initial_retry_delay_millis,
            c.retry_delay_multiplier,
            c.max_retry_delay_millis,
            c.initial_rpc_timeout_millis,
            c.rpc_timeout_multiplier,
            c.max_rpc_timeout_millis,
            c.total_timeout_millis,
        )
    }
}

impl BackoffConfig {
    /// Convert to validated [`BackoffSettings`].
    pub fn to_settings(&self) -> Result<BackoffSettings> {
        let settings = BackoffSettings::from(self);
        settings.validate()?;
        Ok(settings)
    }
}

/// Global configuration loaded from `~/.config/rpcretry/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Status codes worth retrying.
    pub retry_codes: Vec<Code>,
    #[serde(default)]
    pub backoff: BackoffConfig,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retry_codes: vec![Code::DeadlineExceeded, Code::Unavailable],
            backoff: BackoffConfig::default(),
        }
    }
}

impl RetryConfig {
    pub fn to_options(&self) -> Result<RetryOptions> {
        Ok(RetryOptions::new(
            self.retry_codes.iter().copied(),
            self.backoff.to_settings()?,
        ))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rpcretry")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RetryConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RetryConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<RetryConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: RetryConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
