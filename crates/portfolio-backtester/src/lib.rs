//! # Portfolio Backtester
//!
//! Multi-asset simulation over a `(symbol, field)` price table. Target
//! weights are reapplied on a calendar rebalance schedule, or replaced by
//! row-normalized signals, then lagged one period before they earn
//! returns. Costs come from the same linear commission model as the
//! single-asset engine.

pub mod calendar;
pub mod error;
pub mod manager;
pub mod weights;

pub use calendar::{rebalance_dates, rebalance_indices};
pub use error::PortfolioError;
pub use manager::{PortfolioBacktester, PortfolioTrace, PORTFOLIO_RETURNS};
pub use weights::{gross_exposure, signal_weights, static_weights};
