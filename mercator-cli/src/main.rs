//! Mercator CLI — dataset refresh and offline feature recompute.
//!
//! Commands:
//! - `refresh` — fetch the configured universe and write OHLCV + feature snapshots
//! - `features` — recompute volatility features from an existing CSV/Parquet table
//! - `universe` — resolve and list the configured ticker universe

use anyhow::Result;
use clap::{Parser, Subcommand};
use mercator_core::data::{
    read_table, write_snapshot, DataProvider, StdoutProgress, SyntheticProvider, Universe,
    YahooProvider,
};
use mercator_core::refresh::{run_refresh, RefreshOutcome};
use mercator_core::{add_range_vol_features, DEFAULT_WINDOW, RefreshConfig};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "mercator",
    about = "Mercator CLI — daily OHLCV refresh and volatility features"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the configured universe and write OHLCV + feature snapshots.
    Refresh {
        /// Path to a TOML config file.
        #[arg(long, default_value = "configs/mercator.toml")]
        config: PathBuf,

        /// Use the synthetic provider instead of Yahoo Finance.
        #[arg(long, default_value_t = false)]
        synthetic: bool,
    },
    /// Recompute volatility features from an existing CSV or Parquet table.
    Features {
        /// Input table (.csv or .parquet) with OHLCV columns.
        #[arg(long)]
        input: PathBuf,

        /// Output path. Defaults to <input-stem>_features.parquet beside the input.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Rolling window for the volatility estimators, in trading days.
        #[arg(long, default_value_t = DEFAULT_WINDOW)]
        window: usize,
    },
    /// Resolve and list the configured ticker universe.
    Universe {
        /// Path to a TOML config file.
        #[arg(long, default_value = "configs/mercator.toml")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Refresh { config, synthetic } => run_refresh_cmd(&config, synthetic),
        Commands::Features {
            input,
            output,
            window,
        } => run_features_cmd(&input, output, window),
        Commands::Universe { config } => run_universe_cmd(&config),
    }
}

fn run_refresh_cmd(config_path: &Path, synthetic: bool) -> Result<()> {
    let cfg = RefreshConfig::from_file(config_path)?;

    let provider: Box<dyn DataProvider> = if synthetic {
        Box::new(SyntheticProvider)
    } else {
        Box::new(YahooProvider::new())
    };

    println!(
        "Refreshing {} to {} via {}",
        cfg.start_date,
        cfg.end_date_or_today(),
        provider.name()
    );

    let outcome = run_refresh(&cfg, provider.as_ref(), &StdoutProgress)?;

    // Partial failures are warnings; the run still produced snapshots.
    for (sym, err) in &outcome.failed {
        eprintln!("Warning for {sym}: {err}");
    }

    print_refresh_summary(&outcome);
    Ok(())
}

fn run_features_cmd(input: &Path, output: Option<PathBuf>, window: usize) -> Result<()> {
    let table = read_table(input)?;
    let features = add_range_vol_features(&table, window)?;

    let out = output.unwrap_or_else(|| default_features_path(input));
    let meta = write_snapshot(&features, &out)?;

    println!("Features written: {}", out.display());
    println!("Rows:       {}", meta.rows);
    println!("Tickers:    {}", meta.tickers);
    if let (Some(start), Some(end)) = (meta.start_date, meta.end_date) {
        println!("Date range: {start} to {end}");
    }
    println!("Data hash:  {}", meta.data_hash);
    Ok(())
}

fn run_universe_cmd(config_path: &Path) -> Result<()> {
    let cfg = RefreshConfig::from_file(config_path)?;
    let universe = Universe::resolve(&cfg.universe)?;

    println!("Universe: {} tickers", universe.len());
    for ticker in &universe.tickers {
        println!("  {ticker}");
    }
    Ok(())
}

/// `data/market_ohlcv.parquet` becomes `data/market_ohlcv_features.parquet`.
fn default_features_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("table");
    input.with_file_name(format!("{stem}_features.parquet"))
}

fn print_refresh_summary(outcome: &RefreshOutcome) {
    println!();
    println!("=== Refresh Summary ===");
    println!("Universe:   {} tickers", outcome.universe_size);
    println!("Fetched:    {}", outcome.fetched);
    println!("Failed:     {}", outcome.failed.len());
    println!("Rows:       {}", outcome.raw_meta.rows);
    if let (Some(start), Some(end)) = (outcome.raw_meta.start_date, outcome.raw_meta.end_date) {
        println!("Dates:      {start} to {end}");
    }
    println!("OHLCV:      {}", outcome.raw_path.display());
    println!("Features:   {}", outcome.features_path.display());
    println!("Data hash:  {}", outcome.features_meta.data_hash);
    println!();
}
