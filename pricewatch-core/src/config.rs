//! Startup configuration.
//!
//! Loaded once from a TOML file, validated, and passed by reference to the
//! components that need it. The API key may also come from the
//! `ALPHAVANTAGE_API_KEY` environment variable, which takes precedence.

use crate::data::cache::TableName;
use crate::signal::crossover::MaKind;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";
pub const DEFAULT_CONFIG_FILE: &str = "pricewatch.toml";

/// Longest accepted window, roughly a century of calendar days.
pub const MAX_WINDOW_DAYS: i64 = 36_525;

/// Longest accepted slow moving average, in sessions.
pub const MAX_PERIOD: usize = 5_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Runtime configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub database: PathBuf,
    pub table: String,
    pub symbols: Vec<String>,
    /// Requested window length in calendar days, ending today.
    pub window_days: i64,
    pub fast_period: usize,
    pub slow_period: usize,
    pub moving_average: MaKind,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://www.alphavantage.co".into(),
            database: PathBuf::from("finance.db"),
            table: "AlphaVantage".into(),
            symbols: vec!["SWTSX".into(), "SWISX".into()],
            window_days: 365,
            fast_period: 10,
            slow_period: 30,
            moving_average: MaKind::Ema,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Parse a config from a TOML string. Unset keys keep their defaults.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load `path`, falling back to [`Config::default`] when the file does not
    /// exist. Any other read failure, or a parse failure, is an error.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Override the API key from the environment when set and non-empty.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.api_key = key.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "api_key is empty (set it in the config file or {API_KEY_ENV})"
            )));
        }
        TableName::new(&self.table).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.fast_period == 0 || self.fast_period >= self.slow_period {
            return Err(ConfigError::Invalid(format!(
                "need 1 <= fast_period < slow_period, got {} and {}",
                self.fast_period, self.slow_period
            )));
        }
        if self.slow_period > MAX_PERIOD {
            return Err(ConfigError::Invalid(format!(
                "slow_period {} exceeds {MAX_PERIOD}",
                self.slow_period
            )));
        }
        if self.window_days <= 0 || self.window_days > MAX_WINDOW_DAYS {
            return Err(ConfigError::Invalid(format!(
                "window_days must be in 1..={MAX_WINDOW_DAYS}, got {}",
                self.window_days
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn table_name(&self) -> Result<TableName, ConfigError> {
        TableName::new(&self.table).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
