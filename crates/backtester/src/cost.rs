use crate::error::BacktestError;
use serde::{Deserialize, Serialize};

/// Flat linear commission charged on turnover.
///
/// Turnover is the absolute change in position between consecutive periods.
/// A change involving an undefined position (the lagged first row, or the
/// row where the first position appears) counts as zero turnover.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostModel {
    commission_rate: f64,
}

impl CostModel {
    /// `commission_rate` is a fraction of notional per unit of turnover.
    pub fn new(commission_rate: f64) -> Result<Self, BacktestError> {
        if !commission_rate.is_finite() || commission_rate < 0.0 {
            return Err(BacktestError::InvalidParameter {
                name: "commission_rate",
                reason: format!("cannot be negative (got {commission_rate})"),
            });
        }
        Ok(Self { commission_rate })
    }

    /// Builds the model from a commission quoted in basis points.
    pub fn from_bps(commission_bps: f64) -> Result<Self, BacktestError> {
        Self::new(commission_bps / 10_000.0)
    }

    pub fn commission_rate(&self) -> f64 {
        self.commission_rate
    }

    pub fn is_free(&self) -> bool {
        self.commission_rate == 0.0
    }

    pub fn cost(&self, turnover: f64) -> f64 {
        turnover * self.commission_rate
    }

    /// Subtracts the cost of each period's turnover from its raw return.
    /// Undefined returns stay undefined.
    pub fn apply(&self, raw: &[Option<f64>], turnover: &[f64]) -> Vec<Option<f64>> {
        if self.is_free() {
            return raw.to_vec();
        }
        raw.iter()
            .zip(turnover)
            .map(|(r, t)| r.map(|r| r - self.cost(*t)))
            .collect()
    }
}

/// Per-period turnover of a single position sequence.
pub fn position_turnover(positions: &[Option<f64>]) -> Vec<f64> {
    (0..positions.len())
        .map(|i| {
            if i == 0 {
                return 0.0;
            }
            step_turnover(positions[i - 1], positions[i])
        })
        .collect()
}

/// Turnover of one rebalance step across all symbols.
pub fn rebalance_turnover(previous: &[Option<f64>], current: &[Option<f64>]) -> f64 {
    previous
        .iter()
        .zip(current)
        .map(|(p, c)| step_turnover(*p, *c))
        .sum()
}

fn step_turnover(previous: Option<f64>, current: Option<f64>) -> f64 {
    match (previous, current) {
        (Some(p), Some(c)) => (c - p).abs(),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rejects_negative_or_non_finite_rates() {
        assert!(CostModel::new(-0.001).is_err());
        assert!(CostModel::new(f64::NAN).is_err());
        assert!(CostModel::new(0.0).unwrap().is_free());
    }

    #[test]
    fn bps_are_converted_to_a_fraction() {
        let model = CostModel::from_bps(10.0).unwrap();
        assert_abs_diff_eq!(model.commission_rate(), 0.001, epsilon = 1e-15);
        assert_abs_diff_eq!(model.cost(2.0), 0.002, epsilon = 1e-15);
    }

    #[test]
    fn missing_positions_contribute_no_turnover() {
        let positions = [None, Some(0.5), Some(-0.5), Some(-0.5)];
        assert_eq!(position_turnover(&positions), vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn rebalance_turnover_sums_symbols() {
        let prev = [Some(0.5), Some(0.5), None];
        let curr = [Some(0.2), Some(0.8), Some(0.1)];
        assert_abs_diff_eq!(rebalance_turnover(&prev, &curr), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn apply_is_a_no_op_when_free() {
        let raw = [None, Some(0.01)];
        let model = CostModel::default();
        assert_eq!(model.apply(&raw, &[0.0, 5.0]), raw.to_vec());

        let model = CostModel::new(0.01).unwrap();
        let net = model.apply(&raw, &[0.0, 1.0]);
        assert_eq!(net[0], None);
        assert_abs_diff_eq!(net[1].unwrap(), 0.0, epsilon = 1e-15);
    }
}
