//! # Quantsim Core Types
//!
//! Timestamp-indexed containers shared by every other crate: single-asset
//! series, per-symbol tables, OHLCV bars and multi-asset price tables.
//! Undefined values are always `Option::None`.

pub mod enums;
pub mod error;
pub mod frame;
pub mod prices;
pub mod series;

// Re-export the core types to provide a clean public API.
pub use enums::{FactorId, RebalanceFrequency};
pub use error::CoreError;
pub use frame::Frame;
pub use prices::{Bar, CLOSE, ColumnLabel, OHLCV_FIELDS, OhlcvFrame, PriceTable};
pub use series::{TimeSeries, Timestamp};
