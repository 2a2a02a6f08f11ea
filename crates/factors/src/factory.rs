use crate::error::FactorError;
use crate::macd::MacdHistogram;
use crate::momentum::Momentum;
use crate::rsi::Rsi;
use crate::sma_crossover::SmaCrossover;
use crate::volatility::Volatility;
use crate::Factor;
use configuration::FactorParams;
use core_types::FactorId;

/// Creates a factor instance from its ID and the configured parameters.
///
/// The match is exhaustive, so a new `FactorId` fails to compile until it
/// is handled here.
pub fn create_factor(id: FactorId, params: &FactorParams) -> Result<Box<dyn Factor>, FactorError> {
    let factor: Box<dyn Factor> = match id {
        FactorId::Momentum => Box::new(Momentum::new(params.momentum)?),
        FactorId::Rsi => Box::new(Rsi::new(params.rsi)?),
        FactorId::SmaCrossover => Box::new(SmaCrossover::new(params.sma_crossover)?),
        FactorId::Volatility => Box::new(Volatility::new(params.volatility)?),
        FactorId::MacdHistogram => Box::new(MacdHistogram::new(params.macd)?),
    };
    tracing::debug!(factor = %id, "created factor");
    Ok(factor)
}
