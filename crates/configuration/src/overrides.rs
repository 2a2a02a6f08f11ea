use crate::error::ConfigError;
use crate::settings::Config;
use core_types::RebalanceFrequency;

/// Command-line overrides layered on top of the loaded configuration.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SimulationOverrides {
    /// Commission per unit of turnover, as a fraction of notional (0.001 = 10 bps).
    #[arg(long, conflicts_with = "commission_bps")]
    pub commission_rate: Option<f64>,

    /// Commission per unit of turnover, in basis points.
    #[arg(long)]
    pub commission_bps: Option<f64>,

    /// Absolute cap on single-asset positions.
    #[arg(long)]
    pub max_position: Option<f64>,

    /// Portfolio rebalance frequency.
    #[arg(long, value_enum)]
    pub rebalance: Option<RebalanceFrequency>,
}

impl Config {
    /// Returns a copy with the overrides applied and re-validated.
    ///
    /// A commission override applies to both simulators.
    pub fn apply_overrides(&self, overrides: &SimulationOverrides) -> Result<Config, ConfigError> {
        let mut config = self.clone();
        let commission = overrides
            .commission_rate
            .or(overrides.commission_bps.map(|bps| bps / 10_000.0));
        if let Some(rate) = commission {
            config.backtest.commission_rate = rate;
            config.portfolio.commission_rate = rate;
        }
        if let Some(max_position) = overrides.max_position {
            config.backtest.max_position = max_position;
        }
        if let Some(frequency) = overrides.rebalance {
            config.portfolio.rebalance_frequency = frequency;
        }
        config.validate()?;
        Ok(config)
    }
}
