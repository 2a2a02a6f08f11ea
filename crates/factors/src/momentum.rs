use crate::error::FactorError;
use crate::{positive, Factor};
use configuration::MomentumParams;
use core_types::{FactorId, OhlcvFrame, TimeSeries};

/// Close-to-close percentage change over `lookback` bars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Momentum {
    lookback: usize,
}

impl Momentum {
    pub fn new(params: MomentumParams) -> Result<Self, FactorError> {
        Ok(Self {
            lookback: positive("lookback", params.lookback)?,
        })
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }
}

impl Factor for Momentum {
    fn id(&self) -> FactorId {
        FactorId::Momentum
    }

    fn compute(&self, data: &OhlcvFrame) -> Result<TimeSeries, FactorError> {
        let close = data.close();
        let n = self.lookback;
        let values = (0..close.len())
            .map(|t| (t >= n).then(|| close[t] / close[t - n] - 1.0))
            .collect();
        Ok(TimeSeries::new(self.id().as_str(), data.index().to_vec(), values)?)
    }
}
