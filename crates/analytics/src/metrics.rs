//! Reducers over a per-period returns series.
//!
//! Undefined periods are skipped. A metric that cannot be defined (no
//! data, zero deviation) comes back as `f64::NAN`, not as an error.

use core_types::TimeSeries;

/// Periods per year for daily bars.
pub const TRADING_DAYS: u32 = 252;

/// Annualized Sharpe ratio with a zero risk-free rate.
///
/// Uses the sample standard deviation, so at least two defined returns are
/// needed.
pub fn sharpe(returns: &TimeSeries, annualization: u32) -> f64 {
    let values = returns.valid_values();
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = mean(&values);
    let variance =
        values.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    let vol = variance.sqrt();
    if vol == 0.0 {
        return f64::NAN;
    }
    mean / vol * f64::from(annualization).sqrt()
}

/// Annualized Sortino ratio against a zero target return.
///
/// The downside deviation is the root mean square of `min(r, 0)` over
/// every defined period, not only the losing ones.
pub fn sortino(returns: &TimeSeries, annualization: u32) -> f64 {
    let values = returns.valid_values();
    if values.is_empty() {
        return f64::NAN;
    }
    let downside_variance = values.iter().map(|r| r.min(0.0).powi(2)).sum::<f64>() / values.len() as f64;
    if downside_variance == 0.0 {
        return f64::NAN;
    }
    mean(&values) / downside_variance.sqrt() * f64::from(annualization).sqrt()
}

/// Deepest peak-to-trough decline of the compounded return curve, as a
/// non-positive fraction.
pub fn max_drawdown(returns: &TimeSeries) -> f64 {
    let mut cumulative = 1.0;
    let mut peak = f64::NEG_INFINITY;
    let mut worst = f64::NAN;
    for r in returns.valid_values() {
        cumulative *= 1.0 + r;
        peak = peak.max(cumulative);
        let drawdown = (cumulative - peak) / peak;
        worst = if worst.is_nan() { drawdown } else { worst.min(drawdown) };
    }
    worst
}

/// Compounded return over the defined periods.
pub fn total_return(returns: &TimeSeries) -> f64 {
    returns.valid_values().iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn series(values: &[Option<f64>]) -> TimeSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let index = (0..values.len()).map(|i| start + Duration::days(i as i64)).collect();
        TimeSeries::new("returns", index, values.to_vec()).unwrap()
    }

    fn sample() -> TimeSeries {
        series(&[Some(0.01), Some(-0.02), Some(0.015), Some(0.0), Some(0.01)])
    }

    #[test]
    fn sharpe_matches_manual_calculation() {
        let values = [0.01, -0.02, 0.015, 0.0, 0.01];
        let mean = values.iter().sum::<f64>() / 5.0;
        let var = values.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 4.0;
        let expected = mean / var.sqrt() * 252f64.sqrt();
        assert_abs_diff_eq!(sharpe(&sample(), TRADING_DAYS), expected, epsilon = 1e-12);
    }

    #[test]
    fn sortino_uses_full_sample_downside_deviation() {
        let mean = 0.015 / 5.0;
        let downside = (0.02f64.powi(2) / 5.0).sqrt();
        let expected = mean / downside * 252f64.sqrt();
        assert_abs_diff_eq!(sortino(&sample(), TRADING_DAYS), expected, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_inputs_are_nan() {
        let empty = series(&[]);
        assert!(sharpe(&empty, TRADING_DAYS).is_nan());
        assert!(sortino(&empty, TRADING_DAYS).is_nan());
        assert!(max_drawdown(&empty).is_nan());

        let flat = series(&[Some(0.25), Some(0.25), Some(0.25)]);
        assert!(sharpe(&flat, TRADING_DAYS).is_nan());
        assert!(sortino(&flat, TRADING_DAYS).is_nan());
    }

    #[test]
    fn max_drawdown_is_worst_decline_from_peak() {
        let returns = series(&[Some(0.1), Some(0.05), Some(-0.2), Some(0.01)]);
        let peak = 1.1 * 1.05;
        let expected = (peak * 0.8 - peak) / peak;
        assert_abs_diff_eq!(max_drawdown(&returns), expected, epsilon = 1e-12);
    }

    #[test]
    fn undefined_periods_are_skipped() {
        let returns = series(&[None, Some(0.1), None, Some(-0.1)]);
        assert_abs_diff_eq!(total_return(&returns), 1.1 * 0.9 - 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(max_drawdown(&returns), -0.1, epsilon = 1e-12);
        assert!(sharpe(&returns, TRADING_DAYS).is_finite());
    }
}
