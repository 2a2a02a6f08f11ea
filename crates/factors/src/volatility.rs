use crate::error::FactorError;
use crate::{positive, Factor};
use configuration::VolatilityParams;
use core_types::{FactorId, OhlcvFrame, TimeSeries};
use ta::indicators::StandardDeviation;
use ta::Next;

/// Rolling sample standard deviation of bar-to-bar returns.
///
/// A value needs `window` defined returns, so the first `window` rows are
/// undefined. With `window == 1` the sample deviation is never defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volatility {
    window: usize,
    use_log_returns: bool,
}

impl Volatility {
    pub fn new(params: VolatilityParams) -> Result<Self, FactorError> {
        Ok(Self {
            window: positive("window", params.window)?,
            use_log_returns: params.use_log_returns,
        })
    }

    fn bar_return(&self, previous: f64, current: f64) -> f64 {
        if self.use_log_returns {
            (current / previous).ln()
        } else {
            current / previous - 1.0
        }
    }
}

impl Factor for Volatility {
    fn id(&self) -> FactorId {
        FactorId::Volatility
    }

    fn compute(&self, data: &OhlcvFrame) -> Result<TimeSeries, FactorError> {
        let close = data.close();
        let n = self.window;
        let mut std = StandardDeviation::new(n)?;
        // `ta` reports the population deviation; rescale to the sample one.
        let bessel = if n > 1 { (n as f64 / (n - 1) as f64).sqrt() } else { f64::NAN };

        let values = (0..close.len())
            .map(|t| {
                if t == 0 {
                    return None;
                }
                let population = std.next(self.bar_return(close[t - 1], close[t]));
                (t >= n && n > 1).then(|| population * bessel)
            })
            .collect();

        Ok(TimeSeries::new(self.id().as_str(), data.index().to_vec(), values)?)
    }
}
