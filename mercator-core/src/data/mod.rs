//! Market data acquisition, assembly, and storage

pub mod frame;
pub mod provider;
pub mod store;
pub mod synthetic;
pub mod universe;
pub mod yahoo;

pub use frame::{bars_to_frame, combine_frames};
pub use provider::{
    DataError, DataProvider, DataSource, DownloadProgress, FetchResult, RawBar, SilentProgress,
    StdoutProgress,
};
pub use store::{read_snapshot, read_table, write_snapshot, SnapshotMeta, StoreError};
pub use synthetic::SyntheticProvider;
pub use universe::{normalize_symbol, Universe, UniverseError, UniverseSource};
pub use yahoo::YahooProvider;
