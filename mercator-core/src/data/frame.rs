//! Long-format OHLCV frame assembly.
//!
//! One frame holds every instrument: `date, Ticker, Open, High, Low, Close,
//! Adj Close, Volume`, one row per instrument-day. The feature engine appends
//! its columns to this frame without reshaping it, and the snapshot store
//! writes it as-is, so these names are the on-disk contract.

use super::provider::RawBar;
use chrono::NaiveDate;
use polars::prelude::*;

pub const COL_DATE: &str = "date";
pub const COL_TICKER: &str = "Ticker";
pub const COL_OPEN: &str = "Open";
pub const COL_HIGH: &str = "High";
pub const COL_LOW: &str = "Low";
pub const COL_CLOSE: &str = "Close";
pub const COL_ADJ_CLOSE: &str = "Adj Close";
pub const COL_VOLUME: &str = "Volume";

/// Columns appended by the feature engine.
pub const COL_RET_LOG_1D: &str = "ret_log_1d";
pub const COL_VOL_PK: &str = "vol_pk";
pub const COL_VOL_GK: &str = "vol_gk";

/// Convert one symbol's bars into a long-format frame.
pub fn bars_to_frame(symbol: &str, bars: &[RawBar]) -> PolarsResult<DataFrame> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let dates: Vec<i32> = bars
        .iter()
        .map(|b| (b.date - epoch).num_days() as i32)
        .collect();
    let tickers: Vec<&str> = bars.iter().map(|_| symbol).collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let adj_closes: Vec<f64> = bars.iter().map(|b| b.adj_close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

    DataFrame::new(vec![
        Column::new(COL_DATE.into(), dates).cast(&DataType::Date)?,
        Column::new(COL_TICKER.into(), tickers),
        Column::new(COL_OPEN.into(), opens),
        Column::new(COL_HIGH.into(), highs),
        Column::new(COL_LOW.into(), lows),
        Column::new(COL_CLOSE.into(), closes),
        Column::new(COL_ADJ_CLOSE.into(), adj_closes),
        Column::new(COL_VOLUME.into(), volumes),
    ])
}

/// Stack per-symbol frames into one canonical frame: vertical concat, stable
/// sort by (Ticker, date), first-wins dedupe on (Ticker, date).
pub fn combine_frames(frames: Vec<DataFrame>) -> PolarsResult<DataFrame> {
    if frames.is_empty() {
        return bars_to_frame("", &[]);
    }

    let lazy: Vec<LazyFrame> = frames.into_iter().map(|df| df.lazy()).collect();
    concat(lazy, UnionArgs::default())?
        .sort(
            [COL_TICKER, COL_DATE],
            SortMultipleOptions::default()
                .with_order_descending_multi([false, false])
                .with_maintain_order(true),
        )
        .unique_stable(
            Some(vec![COL_TICKER.into(), COL_DATE.into()]),
            UniqueKeepStrategy::First,
        )
        .collect()
}
