use serde::{Deserialize, Serialize};

/// Summary statistics of one returns series.
///
/// Metrics that are undefined for the series (see the `metrics` module)
/// are `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Number of rows in the series, defined or not.
    pub periods: usize,
    pub total_return: Option<f64>,
    pub sharpe_ratio: Option<f64>, // Option<> for cases with no stdev
    pub sortino_ratio: Option<f64>, // Option<> for cases with no downside
    pub max_drawdown: Option<f64>,
}

/// Maps the NaN "undefined" marker onto `None`.
pub(crate) fn defined(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}
