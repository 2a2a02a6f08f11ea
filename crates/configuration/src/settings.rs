use crate::error::ConfigError;
use core_types::RebalanceFrequency;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section falls back to its defaults, so an empty file (or no file
/// at all) is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backtest: BacktestSettings,
    pub portfolio: PortfolioSettings,
    pub factors: FactorParams,
    pub metrics: MetricsSettings,
    pub logging: LoggingSettings,
}

impl Config {
    /// Rejects settings that no simulator would accept.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max_position = self.backtest.max_position;
        if max_position.is_nan() || max_position <= 0.0 {
            return Err(ConfigError::ValidationError(
                "backtest.max_position must be positive".to_string(),
            ));
        }
        check_rate("backtest.commission_rate", self.backtest.commission_rate)?;
        check_rate("portfolio.commission_rate", self.portfolio.commission_rate)?;
        if let Some(weights) = &self.portfolio.weights {
            if let Some(bad) = weights.iter().find(|w| !w.weight.is_finite()) {
                return Err(ConfigError::ValidationError(format!(
                    "portfolio weight for {} must be a finite number",
                    bad.symbol
                )));
            }
            let mut seen = HashSet::new();
            if let Some(repeated) = weights.iter().find(|w| !seen.insert(w.symbol.as_str())) {
                return Err(ConfigError::ValidationError(format!(
                    "portfolio weight for {} is given more than once",
                    repeated.symbol
                )));
            }
        }
        if self.metrics.annualization == 0 {
            return Err(ConfigError::ValidationError(
                "metrics.annualization must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_rate(name: &str, rate: f64) -> Result<(), ConfigError> {
    if rate.is_finite() && rate >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{name} cannot be negative (got {rate})"
        )))
    }
}

/// Parameters for the single-asset simulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    /// Absolute cap on the position taken from a signal.
    pub max_position: f64,
    /// Cost per unit of turnover, as a fraction of notional (0.001 = 10 bps).
    pub commission_rate: f64,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            max_position: 1.0,
            commission_rate: 0.0,
        }
    }
}

/// Parameters for the multi-asset portfolio simulator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioSettings {
    pub rebalance_frequency: RebalanceFrequency,
    pub commission_rate: f64,
    /// Target allocation per symbol. Equal weight when absent.
    pub weights: Option<Vec<TargetWeight>>,
}

/// One symbol's share of the portfolio.
///
/// Kept as a list entry rather than a map key so symbol case survives
/// configuration loading untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetWeight {
    pub symbol: String,
    pub weight: f64,
}

/// Contains the parameter sets for all available factors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorParams {
    pub momentum: MomentumParams,
    pub rsi: RsiParams,
    pub sma_crossover: SmaCrossoverParams,
    pub volatility: VolatilityParams,
    pub macd: MacdParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumParams {
    pub lookback: usize,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self { lookback: 20 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiParams {
    pub period: usize,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmaCrossoverParams {
    pub fast: usize,
    pub slow: usize,
}

impl Default for SmaCrossoverParams {
    fn default() -> Self {
        Self { fast: 10, slow: 30 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityParams {
    pub window: usize,
    pub use_log_returns: bool,
}

impl Default for VolatilityParams {
    fn default() -> Self {
        Self {
            window: 20,
            use_log_returns: false,
        }
    }
}

/// Parameters for MACD. The defaults are Appel's 12/26/9.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal_period: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal_period: 9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Periods per year used to annualize Sharpe and Sortino.
    pub annualization: u32,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self { annualization: 252 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// When set, logs also go to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}
