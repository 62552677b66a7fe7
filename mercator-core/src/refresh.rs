//! Dataset refresh orchestrator.
//!
//! One refresh: resolve the universe, fetch every symbol once, assemble the
//! combined frame, compute the volatility features, write both snapshots.
//! Individual symbol failures are collected and reported, not fatal; the
//! run aborts only when the universe is empty or nothing at all was fetched.

use crate::config::RefreshConfig;
use crate::data::frame::{bars_to_frame, combine_frames};
use crate::data::provider::{DataError, DataProvider, DownloadProgress};
use crate::data::store::{
    write_snapshot, FEATURES_SNAPSHOT, OHLCV_SNAPSHOT, SnapshotMeta, StoreError,
};
use crate::data::universe::{Universe, UniverseError};
use crate::features::{add_range_vol_features, FeatureError};
use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("universe resolved to zero tickers")]
    EmptyUniverse,

    #[error("no data fetched for any symbol; check connectivity and the ticker list")]
    NoData,

    #[error("universe error: {0}")]
    Universe(#[from] UniverseError),

    #[error("feature error: {0}")]
    Feature(#[from] FeatureError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("frame assembly: {0}")]
    Assembly(#[from] PolarsError),
}

/// Summary of one refresh run.
#[derive(Debug)]
pub struct RefreshOutcome {
    pub universe_size: usize,
    pub fetched: usize,
    pub failed: Vec<(String, DataError)>,
    pub raw_path: PathBuf,
    pub raw_meta: SnapshotMeta,
    pub features_path: PathBuf,
    pub features_meta: SnapshotMeta,
}

impl RefreshOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run a full dataset refresh against the given provider.
pub fn run_refresh(
    cfg: &RefreshConfig,
    provider: &dyn DataProvider,
    progress: &dyn DownloadProgress,
) -> Result<RefreshOutcome, RefreshError> {
    let universe = Universe::resolve(&cfg.universe)?;
    if universe.is_empty() {
        return Err(RefreshError::EmptyUniverse);
    }

    let start = cfg.start_date;
    let end = cfg.end_date_or_today();
    let total = universe.len();

    let mut frames = Vec::with_capacity(total);
    let mut failed: Vec<(String, DataError)> = Vec::new();

    for (i, symbol) in universe.tickers.iter().enumerate() {
        progress.on_start(symbol, i, total);

        match provider.fetch(symbol, start, end) {
            Ok(fetch) => {
                progress.on_complete(symbol, i, total, &Ok(fetch.bars.len()));
                frames.push(bars_to_frame(symbol, &fetch.bars)?);
            }
            Err(e) => {
                progress.on_complete(symbol, i, total, &Err(e.clone()));
                failed.push((symbol.clone(), e));
            }
        }
    }

    progress.on_batch_complete(total - failed.len(), failed.len(), total);

    let raw = combine_frames(frames)?;
    if raw.height() == 0 {
        return Err(RefreshError::NoData);
    }

    let features = add_range_vol_features(&raw, cfg.range_vol_window)?;

    let raw_path = cfg.processed_dir.join(OHLCV_SNAPSHOT);
    let raw_meta = write_snapshot(&raw, &raw_path)?;
    let features_path = cfg.features_dir.join(FEATURES_SNAPSHOT);
    let features_meta = write_snapshot(&features, &features_path)?;

    Ok(RefreshOutcome {
        universe_size: total,
        fetched: total - failed.len(),
        failed,
        raw_path,
        raw_meta,
        features_path,
        features_meta,
    })
}
