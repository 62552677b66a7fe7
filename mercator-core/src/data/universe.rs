//! Universe resolution — the list of tickers to refresh.
//!
//! Two sources: a CSV file with a `Symbol` column (index constituent
//! exports ship in that shape) or an inline list in the config. Symbols get
//! one cleanup pass: trim, `.` to `-` (Yahoo's share-class convention, e.g.
//! BRK.B), drop empty and `N/A` entries, dedupe keeping the first
//! occurrence. Anything beyond that single substitution is out of scope.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where the ticker universe comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UniverseSource {
    /// CSV file with a `Symbol` column; falls back to the first column.
    Csv { path: PathBuf },
    /// Tickers listed directly in the config.
    Inline { tickers: Vec<String> },
}

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("failed to read universe file {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Resolved ticker list after normalization and dedup (order preserved).
#[derive(Debug, Clone)]
pub struct Universe {
    pub tickers: Vec<String>,
}

impl Universe {
    /// Resolve a universe from its configured source.
    pub fn resolve(source: &UniverseSource) -> Result<Self, UniverseError> {
        let raw = match source {
            UniverseSource::Csv { path } => read_symbols_csv(path)?,
            UniverseSource::Inline { tickers } => tickers.clone(),
        };

        let mut seen = HashSet::new();
        let mut tickers = Vec::new();
        for entry in raw {
            if let Some(symbol) = normalize_symbol(&entry) {
                if seen.insert(symbol.clone()) {
                    tickers.push(symbol);
                }
            }
        }

        Ok(Self { tickers })
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

/// Clean one raw symbol. Returns None for entries that are not symbols at
/// all (blank cells, N/A placeholders).
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim().replace('.', "-");
    if symbol.is_empty() || symbol.eq_ignore_ascii_case("n/a") {
        None
    } else {
        Some(symbol)
    }
}

fn read_symbols_csv(path: &Path) -> Result<Vec<String>, UniverseError> {
    let wrap = |source: csv::Error| UniverseError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(wrap)?;
    let headers = reader.headers().map_err(wrap)?;
    let column = headers.iter().position(|h| h == "Symbol").unwrap_or(0);

    let mut symbols = Vec::new();
    for record in reader.records() {
        let record = record.map_err(wrap)?;
        if let Some(field) = record.get(column) {
            symbols.push(field.to_string());
        }
    }
    Ok(symbols)
}
