//! # Analytics Engine
//!
//! Performance metrics over the returns series a simulation produces. It
//! acts as the "unbiased judge" of a backtest.
//!
//! ## Architectural Principles
//!
//! - **Pure reducers:** every metric in `metrics` is a function of the
//!   returns series alone; the simulators know nothing about this crate.
//! - **Stateless Calculation:** `AnalyticsEngine` holds only its settings.
//!   It takes a returns series and produces a `PerformanceReport`.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: bundles the metrics into a report.
//! - `PerformanceReport`: the serializable summary.
//! - `sharpe`, `sortino`, `max_drawdown`, `total_return`: the reducers.

pub mod engine;
pub mod error;
pub mod metrics;
pub mod report;

pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use metrics::{max_drawdown, sharpe, sortino, total_return, TRADING_DAYS};
pub use report::PerformanceReport;
