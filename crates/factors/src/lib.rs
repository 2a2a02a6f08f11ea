//! # Factor Library
//!
//! Signal generators that map one symbol's bars to a signal series aligned
//! with the bar index. Each factor is a small immutable value holding its
//! parameters; indicator state lives only for the duration of `compute`.
//!
//! ## Public API
//!
//! - `Factor`: the trait every single-output signal implements.
//! - `create_factor`: builds a boxed factor from a `FactorId` and the
//!   configured parameters.
//! - `Macd`: a three-output indicator. It is not a `Factor`; use
//!   `MacdHistogram` when a single MACD signal is needed.

pub mod error;
pub mod factory;
pub mod macd;
pub mod momentum;
pub mod rsi;
pub mod sma_crossover;
pub mod volatility;

pub use core_types::FactorId;
pub use error::FactorError;
pub use factory::create_factor;
pub use macd::{Macd, MacdHistogram, MacdOutput};
pub use momentum::Momentum;
pub use rsi::Rsi;
pub use sma_crossover::SmaCrossover;
pub use volatility::Volatility;

use core_types::{OhlcvFrame, TimeSeries};

/// A signal generator over one symbol's bars.
///
/// `compute` is a total function of the supplied frame. Leading values may
/// be undefined while the underlying indicator warms up. The `Send + Sync`
/// bounds let one factor serve several simulations in parallel.
pub trait Factor: Send + Sync {
    fn id(&self) -> FactorId;

    fn compute(&self, data: &OhlcvFrame) -> Result<TimeSeries, FactorError>;
}

/// Rejects a zero window.
pub(crate) fn positive(name: &str, value: usize) -> Result<usize, FactorError> {
    if value == 0 {
        return Err(FactorError::InvalidParameters(format!(
            "{name} must be a positive integer"
        )));
    }
    Ok(value)
}
