//! Snapshot persistence.
//!
//! Each refresh writes whole-file Parquet snapshots; nothing is updated in
//! place. Writes are atomic (write to .tmp, rename into place) and every
//! snapshot gets a JSON metadata sidecar carrying a BLAKE3 hash of the
//! Parquet bytes, so two runs over the same data are provably identical.

use super::frame::{COL_DATE, COL_TICKER};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Snapshot file names within the processed/features directories.
pub const OHLCV_SNAPSHOT: &str = "market_ohlcv.parquet";
pub const FEATURES_SNAPSHOT: &str = "market_features.parquet";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("snapshot metadata: {0}")]
    Meta(#[from] serde_json::Error),

    #[error("unsupported table format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Metadata sidecar written next to each snapshot (`<name>.meta.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub rows: usize,
    pub tickers: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub data_hash: String,
    pub written_at: chrono::NaiveDateTime,
}

/// Write a snapshot atomically and return its metadata.
pub fn write_snapshot(df: &DataFrame, path: &Path) -> Result<SnapshotMeta, StoreError> {
    let io_err = |p: &Path| {
        let p = p.to_path_buf();
        move |source: std::io::Error| StoreError::Io { path: p, source }
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    // Encode in memory first so the hash covers exactly the file bytes.
    let mut bytes = Vec::new();
    ParquetWriter::new(&mut bytes).finish(&mut df.clone())?;
    let data_hash = blake3::hash(&bytes).to_hex().to_string();

    let tmp_path = path.with_extension("parquet.tmp");
    fs::write(&tmp_path, &bytes).map_err(io_err(&tmp_path))?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        StoreError::Io {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    let (start_date, end_date) = date_range(df);
    let meta = SnapshotMeta {
        rows: df.height(),
        tickers: ticker_count(df),
        start_date,
        end_date,
        data_hash,
        written_at: chrono::Local::now().naive_local(),
    };

    let meta_path = meta_path(path);
    let meta_json = serde_json::to_string_pretty(&meta)?;
    fs::write(&meta_path, meta_json).map_err(io_err(&meta_path))?;

    Ok(meta)
}

/// Read a Parquet snapshot back.
pub fn read_snapshot(path: &Path) -> Result<DataFrame, StoreError> {
    let file = fs::File::open(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ParquetReader::new(file).finish()?)
}

/// Read the metadata sidecar for a snapshot, if present and parseable.
pub fn read_meta(path: &Path) -> Option<SnapshotMeta> {
    let content = fs::read_to_string(meta_path(path)).ok()?;
    serde_json::from_str(&content).ok()
}

/// Load a table from disk, dispatching on the file extension.
/// CSV columns get date parsing so `date` arrives typed, not as strings.
pub fn read_table(path: &Path) -> Result<DataFrame, StoreError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") => read_snapshot(path),
        Some("csv") => {
            let lf = LazyCsvReader::new(path)
                .with_has_header(true)
                .with_try_parse_dates(true)
                .finish()?;
            Ok(lf.collect()?)
        }
        _ => Err(StoreError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn meta_path(path: &Path) -> PathBuf {
    path.with_extension("meta.json")
}

fn date_range(df: &DataFrame) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let Ok(col) = df.column(COL_DATE) else {
        return (None, None);
    };
    let Ok(ca) = col.date() else {
        return (None, None);
    };
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let to_date = |days: i32| epoch + chrono::Duration::days(days as i64);
    (ca.min().map(to_date), ca.max().map(to_date))
}

fn ticker_count(df: &DataFrame) -> usize {
    df.column(COL_TICKER)
        .ok()
        .and_then(|c| c.as_materialized_series().n_unique().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::frame::bars_to_frame;
    use crate::data::provider::RawBar;

    fn sample_frame() -> DataFrame {
        let bars = vec![
            RawBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                open: 100.0,
                high: 102.0,
                low: 99.0,
                close: 101.0,
                volume: 1000.0,
                adj_close: 101.0,
            },
            RawBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                open: 101.0,
                high: 103.0,
                low: 100.0,
                close: 102.0,
                volume: 1100.0,
                adj_close: 102.0,
            },
        ];
        bars_to_frame("SPY", &bars).unwrap()
    }

    #[test]
    fn snapshot_roundtrip_with_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("market_ohlcv.parquet");

        let df = sample_frame();
        let meta = write_snapshot(&df, &path).unwrap();
        assert_eq!(meta.rows, 2);
        assert_eq!(meta.tickers, 1);
        assert_eq!(meta.start_date, NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(meta.end_date, NaiveDate::from_ymd_opt(2024, 1, 3));
        assert_eq!(meta.data_hash.len(), 64);

        let loaded = read_snapshot(&path).unwrap();
        assert!(loaded.equals_missing(&df));

        let sidecar = read_meta(&path).unwrap();
        assert_eq!(sidecar.data_hash, meta.data_hash);
    }

    #[test]
    fn identical_frames_hash_identically() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_snapshot(&sample_frame(), &dir.path().join("a.parquet")).unwrap();
        let b = write_snapshot(&sample_frame(), &dir.path().join("b.parquet")).unwrap();
        assert_eq!(a.data_hash, b.data_hash);
    }

    #[test]
    fn no_tmp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market_ohlcv.parquet");
        write_snapshot(&sample_frame(), &path).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|n| n == "market_ohlcv.parquet"));
        assert!(names.iter().any(|n| n == "market_ohlcv.meta.json"));
        assert!(!names.iter().any(|n| n.ends_with(".tmp")));
    }

    #[test]
    fn read_table_handles_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.csv");
        fs::write(
            &path,
            "date,Ticker,Open,High,Low,Close\n\
             2024-01-02,SPY,100.0,102.0,99.0,101.0\n\
             2024-01-03,SPY,101.0,103.0,100.0,102.0\n",
        )
        .unwrap();

        let df = read_table(&path).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column(COL_DATE).unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn read_table_rejects_unknown_extensions() {
        let err = read_table(Path::new("bars.xlsx")).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedFormat(_)));
    }

    #[test]
    fn empty_frame_meta_has_no_date_range() {
        let dir = tempfile::tempdir().unwrap();
        let df = bars_to_frame("SPY", &[]).unwrap();
        let meta = write_snapshot(&df, &dir.path().join("empty.parquet")).unwrap();
        assert_eq!(meta.rows, 0);
        assert_eq!(meta.start_date, None);
        assert_eq!(meta.end_date, None);
    }
}
