use crate::error::FactorError;
use crate::{positive, Factor};
use configuration::MacdParams;
use core_types::{FactorId, Frame, OhlcvFrame, TimeSeries};
use serde::{Deserialize, Serialize};
use ta::indicators::ExponentialMovingAverage as Ema;
use ta::Next;

/// The three MACD components, each aligned with the input bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdOutput {
    /// Fast EMA minus slow EMA.
    pub line: TimeSeries,
    /// EMA of the line.
    pub signal: TimeSeries,
    /// Line minus signal.
    pub histogram: TimeSeries,
}

impl MacdOutput {
    /// Columns `macd`, `signal` and `histogram` on the bar index.
    pub fn to_frame(&self) -> Result<Frame, FactorError> {
        Ok(Frame::from_series(vec![
            self.line.clone(),
            self.signal.clone(),
            self.histogram.clone(),
        ])?)
    }
}

/// Moving Average Convergence Divergence.
///
/// Produces three series, so it does not implement [`Factor`]; wrap it in
/// [`MacdHistogram`] to backtest it. The line is undefined for the first
/// `slow - 1` bars and the signal for the first `slow + signal_period - 2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal_period: usize,
}

impl Macd {
    pub fn new(params: MacdParams) -> Result<Self, FactorError> {
        let fast = positive("fast", params.fast)?;
        let slow = positive("slow", params.slow)?;
        let signal_period = positive("signal_period", params.signal_period)?;
        if fast >= slow {
            return Err(FactorError::InvalidParameters(
                "fast period must be smaller than slow period".to_string(),
            ));
        }
        Ok(Self {
            fast,
            slow,
            signal_period,
        })
    }

    pub fn compute(&self, data: &OhlcvFrame) -> Result<MacdOutput, FactorError> {
        let mut fast = Ema::new(self.fast)?;
        let mut slow = Ema::new(self.slow)?;
        let mut smoother = Ema::new(self.signal_period)?;
        let mut seen = 0;

        let mut line = Vec::with_capacity(data.len());
        let mut signal = Vec::with_capacity(data.len());
        let mut histogram = Vec::with_capacity(data.len());
        for (t, &close) in data.close().iter().enumerate() {
            let fast_ema = fast.next(close);
            let slow_ema = slow.next(close);
            let value = (t + 1 >= self.slow).then_some(fast_ema - slow_ema);

            // The signal EMA starts at the first defined line value.
            let smoothed = value.and_then(|v| {
                let s = smoother.next(v);
                seen += 1;
                (seen >= self.signal_period).then_some(s)
            });

            line.push(value);
            signal.push(smoothed);
            histogram.push(value.zip(smoothed).map(|(l, s)| l - s));
        }

        let index = data.index().to_vec();
        Ok(MacdOutput {
            line: TimeSeries::new("macd", index.clone(), line)?,
            signal: TimeSeries::new("signal", index.clone(), signal)?,
            histogram: TimeSeries::new("histogram", index, histogram)?,
        })
    }
}

/// MACD histogram as a single-output factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdHistogram {
    macd: Macd,
}

impl MacdHistogram {
    pub fn new(params: MacdParams) -> Result<Self, FactorError> {
        Ok(Self {
            macd: Macd::new(params)?,
        })
    }
}

impl Factor for MacdHistogram {
    fn id(&self) -> FactorId {
        FactorId::MacdHistogram
    }

    fn compute(&self, data: &OhlcvFrame) -> Result<TimeSeries, FactorError> {
        Ok(self.macd.compute(data)?.histogram.with_name(self.id().as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::frame;
    use approx::assert_abs_diff_eq;

    fn linear(start: f64, step: f64, n: usize) -> OhlcvFrame {
        let close: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
        frame(&close)
    }

    /// Recursive EMA with smoothing `2 / (span + 1)`, seeded with the first value.
    fn ema(xs: &[f64], span: usize) -> Vec<f64> {
        let k = 2.0 / (span as f64 + 1.0);
        let mut out = Vec::with_capacity(xs.len());
        for (i, x) in xs.iter().enumerate() {
            out.push(if i == 0 { *x } else { k * x + (1.0 - k) * out[i - 1] });
        }
        out
    }

    #[test]
    fn line_is_fast_minus_slow_ema() {
        let data = linear(100.0, 0.5, 50);
        let out = Macd::new(MacdParams::default()).unwrap().compute(&data).unwrap();

        let fast = ema(data.close(), 12);
        let slow = ema(data.close(), 26);
        assert!(out.line.values()[..25].iter().all(Option::is_none));
        for t in 25..50 {
            assert_abs_diff_eq!(out.line.values()[t].unwrap(), fast[t] - slow[t], epsilon = 1e-9);
        }
    }

    #[test]
    fn signal_is_ema_of_line_and_histogram_is_difference() {
        let data = linear(100.0, 0.5, 50);
        let out = Macd::new(MacdParams::default()).unwrap().compute(&data).unwrap();

        let defined_line: Vec<f64> = out.line.valid_values();
        let expected = ema(&defined_line, 9);
        // Signal appears after 9 defined line values: row 26 + 9 - 2.
        assert!(out.signal.values()[..33].iter().all(Option::is_none));
        for t in 33..50 {
            let s = out.signal.values()[t].unwrap();
            assert_abs_diff_eq!(s, expected[t - 25], epsilon = 1e-9);
            let h = out.histogram.values()[t].unwrap();
            assert_abs_diff_eq!(h, out.line.values()[t].unwrap() - s, epsilon = 1e-12);
        }
    }

    #[test]
    fn trend_direction_sets_line_sign() {
        let up = Macd::new(MacdParams::default()).unwrap().compute(&linear(100.0, 2.0, 50)).unwrap();
        assert!(up.line.values()[30..].iter().flatten().all(|v| *v > 0.0));

        let down = Macd::new(MacdParams::default()).unwrap().compute(&linear(200.0, -2.0, 50)).unwrap();
        assert!(down.line.values()[30..].iter().flatten().all(|v| *v < 0.0));
    }

    #[test]
    fn frame_has_named_columns() {
        let data = linear(100.0, 1.0, 50);
        let out = Macd::new(MacdParams::default()).unwrap().compute(&data).unwrap();
        let frame = out.to_frame().unwrap();
        assert_eq!(frame.columns(), &["macd", "signal", "histogram"]);
        assert_eq!(frame.nrows(), 50);
    }

    #[test]
    fn custom_periods_change_the_output() {
        let data = linear(100.0, 0.5, 100);
        let default = Macd::new(MacdParams::default()).unwrap().compute(&data).unwrap();
        let custom = Macd::new(MacdParams { fast: 8, slow: 17, signal_period: 5 })
            .unwrap()
            .compute(&data)
            .unwrap();
        assert_ne!(default.line, custom.line);
        assert_ne!(default.signal, custom.signal);
    }

    #[test]
    fn invalid_periods_are_rejected() {
        for params in [
            MacdParams { fast: 0, slow: 26, signal_period: 9 },
            MacdParams { fast: 12, slow: 26, signal_period: 0 },
        ] {
            let err = Macd::new(params).unwrap_err();
            assert!(err.to_string().contains("positive"));
        }
        for params in [
            MacdParams { fast: 26, slow: 12, signal_period: 9 },
            MacdParams { fast: 20, slow: 20, signal_period: 9 },
        ] {
            let err = Macd::new(params).unwrap_err();
            assert!(err.to_string().contains("smaller"));
        }
    }

    #[test]
    fn histogram_factor_renames_output() {
        let factor = MacdHistogram::new(MacdParams::default()).unwrap();
        let signal = factor.compute(&linear(100.0, 1.0, 40)).unwrap();
        assert_eq!(signal.name(), "macd_histogram");
        assert_eq!(signal.valid_values().len(), 40 - 33);
    }
}
