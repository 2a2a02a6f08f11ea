//! # Market Data
//!
//! Fetches raw OHLCV tables from a local CSV file or a URL and cleans them
//! into an `OhlcvFrame`: datetime-indexed, ascending, with the five
//! canonical fields and no missing rows. All I/O happens here, before any
//! simulation runs.

pub mod clean;
pub mod error;
pub mod loader;

pub use clean::{parse_csv, parse_timestamp};
pub use error::DataError;
pub use loader::{load, LoadSource};
