//! Scan configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bounds that keep every derived duration inside chrono's range.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;
pub const MAX_UNIVERSE_TTL_HOURS: i64 = 24 * 365;
pub const MAX_COMPANY_TTL_DAYS: i64 = 3650;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// CSV score history.
    pub history_path: PathBuf,
    /// Directory holding `universe.json` and `companies.json`.
    pub cache_dir: PathBuf,
    /// Calendar days of daily bars requested per ticker.
    pub lookback_days: i64,
    /// Index used to classify the market regime.
    pub benchmark: String,
    pub headline_limit: usize,
    /// Buy threshold in a bullish market.
    pub buy_threshold: i32,
    /// Buy threshold when the market is weak or unknown.
    pub weak_market_threshold: i32,
    /// Score a ticker must cross upward to raise an alert.
    pub crossing_threshold: i32,
    pub universe_ttl_hours: i64,
    pub company_ttl_days: i64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from("data/score_history.csv"),
            cache_dir: PathBuf::from("data/cache"),
            lookback_days: 183,
            benchmark: "QQQ".to_string(),
            headline_limit: 5,
            buy_threshold: 70,
            weak_market_threshold: 75,
            crossing_threshold: 70,
            universe_ttl_hours: 24,
            company_ttl_days: 7,
        }
    }
}

impl ScanConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(ConfigError::Invalid(format!(
                "lookback_days must be within 1..={MAX_LOOKBACK_DAYS}, got {}",
                self.lookback_days
            )));
        }
        if self.benchmark.trim().is_empty() {
            return Err(ConfigError::Invalid("benchmark must not be empty".into()));
        }
        for (name, value) in [
            ("buy_threshold", self.buy_threshold),
            ("weak_market_threshold", self.weak_market_threshold),
            ("crossing_threshold", self.crossing_threshold),
        ] {
            if !(0..=100).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within 0..=100, got {value}"
                )));
            }
        }
        for (name, value, max) in [
            ("universe_ttl_hours", self.universe_ttl_hours, MAX_UNIVERSE_TTL_HOURS),
            ("company_ttl_days", self.company_ttl_days, MAX_COMPANY_TTL_DAYS),
        ] {
            if !(0..=max).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within 0..={max}, got {value}"
                )));
            }
        }
        Ok(())
    }

    // The accessors clamp as well: the fields are public, so a config built
    // in code may never have gone through `validate`.

    pub fn lookback(&self) -> Duration {
        Duration::days(self.lookback_days.clamp(1, MAX_LOOKBACK_DAYS))
    }

    pub fn universe_ttl(&self) -> Duration {
        Duration::hours(self.universe_ttl_hours.clamp(0, MAX_UNIVERSE_TTL_HOURS))
    }

    pub fn company_ttl(&self) -> Duration {
        Duration::days(self.company_ttl_days.clamp(0, MAX_COMPANY_TTL_DAYS))
    }
}
