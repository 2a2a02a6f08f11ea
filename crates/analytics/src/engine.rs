use crate::error::AnalyticsError;
use crate::metrics::{max_drawdown, sharpe, sortino, total_return};
use crate::report::{defined, PerformanceReport};
use configuration::MetricsSettings;
use core_types::TimeSeries;

/// A stateless calculator turning a returns series into a `PerformanceReport`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsEngine {
    settings: MetricsSettings,
}

impl AnalyticsEngine {
    pub fn new(settings: MetricsSettings) -> Result<Self, AnalyticsError> {
        if settings.annualization == 0 {
            return Err(AnalyticsError::InvalidParameter {
                name: "annualization",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self { settings })
    }

    /// The main entry point for calculating performance metrics.
    ///
    /// An empty series is an error; a series whose metrics are merely
    /// undefined (too short, no variance) yields a report with `None`s.
    pub fn calculate(&self, returns: &TimeSeries) -> Result<PerformanceReport, AnalyticsError> {
        if returns.is_empty() {
            return Err(AnalyticsError::NotEnoughData(format!(
                "returns series '{}' is empty",
                returns.name()
            )));
        }

        let annualization = self.settings.annualization;
        let report = PerformanceReport {
            periods: returns.len(),
            total_return: defined(total_return(returns)),
            sharpe_ratio: defined(sharpe(returns, annualization)),
            sortino_ratio: defined(sortino(returns, annualization)),
            max_drawdown: defined(max_drawdown(returns)),
        };
        tracing::debug!(series = returns.name(), ?report, "performance report calculated");
        Ok(report)
    }
}
