use crate::error::FactorError;
use crate::{positive, Factor};
use configuration::SmaCrossoverParams;
use core_types::{FactorId, OhlcvFrame, TimeSeries};
use ta::indicators::SimpleMovingAverage as Sma;
use ta::Next;

/// Fast simple moving average minus slow simple moving average.
///
/// Positive while the fast average sits above the slow one. Each average
/// needs a full window, so the first `slow - 1` values are undefined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmaCrossover {
    fast: usize,
    slow: usize,
}

impl SmaCrossover {
    pub fn new(params: SmaCrossoverParams) -> Result<Self, FactorError> {
        let fast = positive("fast", params.fast)?;
        let slow = positive("slow", params.slow)?;
        // Validation: Ensure periods are logical.
        if fast >= slow {
            return Err(FactorError::InvalidParameters(
                "fast window must be smaller than slow window".to_string(),
            ));
        }
        Ok(Self { fast, slow })
    }
}

impl Factor for SmaCrossover {
    fn id(&self) -> FactorId {
        FactorId::SmaCrossover
    }

    fn compute(&self, data: &OhlcvFrame) -> Result<TimeSeries, FactorError> {
        let mut fast = Sma::new(self.fast)?;
        let mut slow = Sma::new(self.slow)?;

        let values = data
            .close()
            .iter()
            .enumerate()
            .map(|(t, &close)| {
                let fast_ma = fast.next(close);
                let slow_ma = slow.next(close);
                (t + 1 >= self.slow).then_some(fast_ma - slow_ma)
            })
            .collect();

        Ok(TimeSeries::new(self.id().as_str(), data.index().to_vec(), values)?)
    }
}
