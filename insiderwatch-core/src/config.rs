//! Run configuration: paths, windows, pacing and retry settings.
//!
//! Every field has a default, so an empty TOML file (or none at all) gives
//! the standard daily job. The provider credential never lives in the file;
//! it comes from the `FINNHUB_API_KEY` environment variable.

use crate::candles::{CandleOptions, DEFAULT_WINDOW_DAYS};
use crate::data::retry::{Backoff, RetryPolicy};
use crate::transactions::{TransactionOptions, DEFAULT_LOOKBACK_DAYS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const API_KEY_ENV: &str = "FINNHUB_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("FINNHUB_API_KEY is not set")]
    MissingCredential,

    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub lookback_days: i64,
    pub candle_window_days: i64,
    pub request_delay_ms: u64,
    pub candle_delay_ms: u64,
    pub max_attempts: u32,
    /// Multiplied by the attempt number after HTTP 429.
    pub rate_limit_backoff_secs: u64,
    pub forbidden_backoff_secs: u64,
    pub error_backoff_secs: u64,
    /// Optional TOML universe replacing the built-in registry.
    pub universe: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            candle_window_days: DEFAULT_WINDOW_DAYS,
            request_delay_ms: 1200,
            candle_delay_ms: 300,
            max_attempts: 3,
            rate_limit_backoff_secs: 30,
            forbidden_backoff_secs: 60,
            error_backoff_secs: 5,
            universe: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookback_days <= 0 {
            return Err(ConfigError::Invalid("lookback_days must be positive".into()));
        }
        if self.candle_window_days <= 0 {
            return Err(ConfigError::Invalid(
                "candle_window_days must be positive".into(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            rate_limited: Backoff::Linear(Duration::from_secs(self.rate_limit_backoff_secs)),
            forbidden: Backoff::Fixed(Duration::from_secs(self.forbidden_backoff_secs)),
            other: Backoff::Fixed(Duration::from_secs(self.error_backoff_secs)),
        }
    }

    pub fn transaction_options(&self) -> TransactionOptions {
        TransactionOptions {
            lookback_days: self.lookback_days,
            request_delay: Duration::from_millis(self.request_delay_ms),
        }
    }

    pub fn candle_options(&self) -> CandleOptions {
        CandleOptions {
            window_days: self.candle_window_days,
            request_delay: Duration::from_millis(self.candle_delay_ms),
        }
    }
}

/// Read the provider key from the process environment.
pub fn api_key_from_env() -> Result<String, ConfigError> {
    api_key_from(std::env::var(API_KEY_ENV).ok())
}

fn api_key_from(value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(ConfigError::MissingCredential),
    }
}
