//! Refresh pipeline configuration.
//!
//! A small TOML file drives a refresh: date range, rolling window, output
//! directories and the universe source. Every field has a default, so an
//! empty file is a valid config. Values are taken as given; there is no
//! schema validation layer.

use crate::data::universe::UniverseSource;
use crate::features::DEFAULT_WINDOW;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for one dataset refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// First date to request (inclusive), as a quoted ISO date.
    pub start_date: NaiveDate,

    /// Last date to request (inclusive). Today in UTC when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    /// Trailing window for the volatility estimators, in trading days.
    pub range_vol_window: usize,

    /// Directory receiving the raw OHLCV snapshot.
    pub processed_dir: PathBuf,

    /// Directory receiving the features snapshot.
    pub features_dir: PathBuf,

    /// Where the ticker universe comes from.
    pub universe: UniverseSource,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            end_date: None,
            range_vol_window: DEFAULT_WINDOW,
            processed_dir: PathBuf::from("data/processed"),
            features_dir: PathBuf::from("data/features"),
            universe: UniverseSource::Csv {
                path: PathBuf::from("configs/universe.csv"),
            },
        }
    }
}

impl RefreshConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// The effective end date: the configured value, or today in UTC.
    pub fn end_date_or_today(&self) -> NaiveDate {
        self.end_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive())
    }
}
