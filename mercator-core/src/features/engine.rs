//! Frame-level feature engine.
//!
//! Takes a long-format OHLCV frame, partitions it by `Ticker` in
//! first-encounter order, sorts each partition ascending by date, runs the
//! volatility kernels over the partition's own columns, and returns the
//! input rows (reordered) with `ret_log_1d`, `vol_pk` and `vol_gk` appended.
//! Pure: the input frame is never mutated; extra columns pass through.

use super::volatility::{garman_klass_vol, log_returns, parkinson_vol};
use crate::data::frame::{
    COL_CLOSE, COL_DATE, COL_HIGH, COL_LOW, COL_OPEN, COL_RET_LOG_1D, COL_TICKER, COL_VOL_GK,
    COL_VOL_PK,
};
use polars::prelude::*;
use std::collections::HashMap;
use thiserror::Error;

/// Columns the engine needs. `Volume` and `Adj Close` are passthrough only.
pub const REQUIRED_COLUMNS: [&str; 6] =
    [COL_DATE, COL_TICKER, COL_OPEN, COL_HIGH, COL_LOW, COL_CLOSE];

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("column '{column}' has type {actual:?}, expected {expected:?}")]
    ColumnType {
        column: String,
        expected: DataType,
        actual: DataType,
    },

    #[error("rolling window must be at least 1 day")]
    InvalidWindow,

    #[error("frame error: {0}")]
    Frame(#[from] PolarsError),
}

/// Append the range-volatility feature columns to a multi-instrument frame.
///
/// Bad numeric cells (nulls, non-positive prices) become NaN in the derived
/// columns and never fail the call; only structural problems do. An empty
/// frame comes back empty with the augmented schema.
pub fn add_range_vol_features(df: &DataFrame, window: usize) -> Result<DataFrame, FeatureError> {
    if window == 0 {
        return Err(FeatureError::InvalidWindow);
    }
    for name in REQUIRED_COLUMNS {
        if df.column(name).is_err() {
            return Err(FeatureError::MissingColumn(name.to_string()));
        }
    }

    let (order, partition_lens) = partition_order(df)?;
    let mut out = df.take(&IdxCa::from_vec("idx".into(), order))?;

    let open = float_values(&out, COL_OPEN)?;
    let high = float_values(&out, COL_HIGH)?;
    let low = float_values(&out, COL_LOW)?;
    let close = float_values(&out, COL_CLOSE)?;

    let n = out.height();
    let mut ret = Vec::with_capacity(n);
    let mut pk = Vec::with_capacity(n);
    let mut gk = Vec::with_capacity(n);

    // Partitions are contiguous in the gathered frame, so each kernel runs
    // on a plain subslice.
    let mut offset = 0;
    for len in partition_lens {
        let end = offset + len;
        ret.extend(log_returns(&close[offset..end]));
        pk.extend(parkinson_vol(&high[offset..end], &low[offset..end], window));
        gk.extend(garman_klass_vol(
            &open[offset..end],
            &high[offset..end],
            &low[offset..end],
            &close[offset..end],
            window,
        ));
        offset = end;
    }

    out.with_column(Column::new(COL_RET_LOG_1D.into(), ret))?;
    out.with_column(Column::new(COL_VOL_PK.into(), pk))?;
    out.with_column(Column::new(COL_VOL_GK.into(), gk))?;
    Ok(out)
}

/// Row permutation realizing the output order: partition by `Ticker` in
/// first-encounter order, each partition stable-sorted ascending by date
/// with null dates last. Null tickers form a partition of their own rather
/// than being dropped, so the row count is preserved.
fn partition_order(df: &DataFrame) -> Result<(Vec<u32>, Vec<usize>), FeatureError> {
    let date_col = df.column(COL_DATE)?;
    let casted = date_col
        .cast(&DataType::Date)
        .map_err(|_| FeatureError::ColumnType {
            column: COL_DATE.to_string(),
            expected: DataType::Date,
            actual: date_col.dtype().clone(),
        })?;
    let date_ca = casted.date()?;
    let date_keys: Vec<Option<i32>> = (0..date_ca.len()).map(|i| date_ca.get(i)).collect();

    let ticker_col = df.column(COL_TICKER)?;
    let ticker_ca = ticker_col.str().map_err(|_| FeatureError::ColumnType {
        column: COL_TICKER.to_string(),
        expected: DataType::String,
        actual: ticker_col.dtype().clone(),
    })?;

    let mut partitions: Vec<Vec<u32>> = Vec::new();
    let mut partition_of: HashMap<Option<&str>, usize> = HashMap::new();
    for i in 0..df.height() {
        let pi = *partition_of.entry(ticker_ca.get(i)).or_insert_with(|| {
            partitions.push(Vec::new());
            partitions.len() - 1
        });
        partitions[pi].push(i as u32);
    }

    let mut order = Vec::with_capacity(df.height());
    let mut lens = Vec::with_capacity(partitions.len());
    for mut idxs in partitions {
        idxs.sort_by_key(|&i| date_keys[i as usize].unwrap_or(i32::MAX));
        lens.push(idxs.len());
        order.extend(idxs);
    }
    Ok((order, lens))
}

/// Read a column as f64 values, null cells becoming NaN.
fn float_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, FeatureError> {
    let col = df.column(name)?;
    let casted = col
        .cast(&DataType::Float64)
        .map_err(|_| FeatureError::ColumnType {
            column: name.to_string(),
            expected: DataType::Float64,
            actual: col.dtype().clone(),
        })?;
    let ca = casted.f64()?;
    Ok((0..ca.len()).map(|i| ca.get(i).unwrap_or(f64::NAN)).collect())
}
