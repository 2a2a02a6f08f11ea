use crate::error::FactorError;
use crate::{positive, Factor};
use configuration::RsiParams;
use core_types::{FactorId, OhlcvFrame, TimeSeries};
use ta::indicators::ExponentialMovingAverage as Ema;
use ta::Next;

/// Relative Strength Index with Wilder smoothing.
///
/// Gains and losses are averaged with an exponential weight of
/// `1 / period`, seeded with the first bar (whose change counts as zero).
/// The first `period - 1` values are undefined. A flat stretch where both
/// averages are zero reads 50; no losses at all reads 100.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(params: RsiParams) -> Result<Self, FactorError> {
        Ok(Self {
            period: positive("period", params.period)?,
        })
    }

    /// A `ta` EMA of length `2p - 1` has smoothing factor `1 / p`.
    fn wilder(&self) -> Result<Ema, FactorError> {
        Ok(Ema::new(2 * self.period - 1)?)
    }
}

impl Factor for Rsi {
    fn id(&self) -> FactorId {
        FactorId::Rsi
    }

    fn compute(&self, data: &OhlcvFrame) -> Result<TimeSeries, FactorError> {
        let close = data.close();
        let mut avg_gain = self.wilder()?;
        let mut avg_loss = self.wilder()?;

        let values = (0..close.len())
            .map(|t| {
                let delta = if t == 0 { 0.0 } else { close[t] - close[t - 1] };
                let gain = avg_gain.next(delta.max(0.0));
                let loss = avg_loss.next((-delta).max(0.0));
                if t + 1 < self.period {
                    return None;
                }
                Some(if gain == 0.0 && loss == 0.0 {
                    50.0
                } else if loss == 0.0 {
                    100.0
                } else {
                    100.0 - 100.0 / (1.0 + gain / loss)
                })
            })
            .collect();

        Ok(TimeSeries::new(self.id().as_str(), data.index().to_vec(), values)?)
    }
}
