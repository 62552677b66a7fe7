//! Mercator Core — market data refresh and range-based volatility features.
//!
//! This crate contains the heart of the data pipeline:
//! - Daily OHLCV acquisition behind a provider trait (Yahoo Finance, synthetic)
//! - Universe resolution from CSV files or inline ticker lists
//! - Assembly of per-symbol bars into one combined, date-sorted table
//! - Volatility features: 1-day log returns, Parkinson, Garman-Klass
//! - Atomic parquet snapshots with content-hash sidecars
//! - TOML-driven refresh orchestration

pub mod config;
pub mod data;
pub mod features;
pub mod refresh;

pub use config::RefreshConfig;
pub use features::{add_range_vol_features, DEFAULT_WINDOW};
pub use refresh::{run_refresh, RefreshError, RefreshOutcome};
