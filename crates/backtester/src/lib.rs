use configuration::BacktestSettings;
use core_types::{TimeSeries, Timestamp};
use serde::{Deserialize, Serialize};

pub mod cost;
pub mod error;

pub use cost::{position_turnover, rebalance_turnover, CostModel};
pub use error::BacktestError;

/// Label carried by every returns series the single-asset simulator emits.
pub const STRATEGY_RETURNS: &str = "strategy_returns";

/// The intermediate series of one single-asset run, aligned on the
/// timestamps shared by the signal and the prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationTrace {
    /// Lagged and clamped signal; undefined on the first row.
    pub positions: TimeSeries,
    /// Simple percentage change of the price.
    pub asset_returns: TimeSeries,
    pub turnover: Vec<f64>,
    /// Net-of-cost strategy returns.
    pub returns: TimeSeries,
}

/// The single-asset backtesting engine.
///
/// Holds a sorted copy of the prices and the settings captured at
/// construction. `run` never mutates either, so one instance can serve
/// many signals, from many threads.
#[derive(Debug, Clone)]
pub struct Backtester {
    prices: TimeSeries,
    settings: BacktestSettings,
    cost_model: CostModel,
}

impl Backtester {
    /// Validates the settings and takes an ascending copy of the prices.
    pub fn new(prices: TimeSeries, settings: BacktestSettings) -> Result<Self, BacktestError> {
        if settings.max_position.is_nan() || settings.max_position <= 0.0 {
            return Err(BacktestError::InvalidParameter {
                name: "max_position",
                reason: format!("must be positive (got {})", settings.max_position),
            });
        }
        let cost_model = CostModel::new(settings.commission_rate)?;
        if prices.is_empty() {
            return Err(BacktestError::EmptyPrices);
        }
        let prices = prices.sort_index()?;

        Ok(Self {
            prices,
            settings,
            cost_model,
        })
    }

    pub fn prices(&self) -> &TimeSeries {
        &self.prices
    }

    pub fn settings(&self) -> &BacktestSettings {
        &self.settings
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    /// Runs the simulation and returns only the net strategy returns.
    pub fn run(&self, signal: &TimeSeries) -> Result<TimeSeries, BacktestError> {
        Ok(self.simulate(signal)?.returns)
    }

    /// Runs the simulation and keeps every intermediate series.
    pub fn simulate(&self, signal: &TimeSeries) -> Result<SimulationTrace, BacktestError> {
        // Warm-up gaps in the signal are not part of the shared timeline.
        let (prices, signal) = self.prices.inner_join(&signal.dropna());
        if prices.is_empty() {
            return Err(BacktestError::NoOverlap);
        }

        let limit = self.settings.max_position;
        let positions = signal.shift(1).clip(-limit, limit).with_name("position");
        let asset_returns = prices.pct_change().with_name("asset_returns");

        let raw: Vec<Option<f64>> = positions
            .values()
            .iter()
            .zip(asset_returns.values())
            .map(|(position, ret)| match (position, ret) {
                (Some(p), Some(r)) => Some(p * r),
                _ => None,
            })
            .collect();
        let turnover = position_turnover(positions.values());
        let net = self.cost_model.apply(&raw, &turnover);

        let index: Vec<Timestamp> = prices.index().to_vec();
        let returns = TimeSeries::new(STRATEGY_RETURNS, index, net)?;

        tracing::debug!(
            rows = returns.len(),
            first = ?returns.index().first(),
            last = ?returns.index().last(),
            commission_rate = self.cost_model.commission_rate(),
            "single-asset simulation complete"
        );

        Ok(SimulationTrace {
            positions,
            asset_returns,
            turnover,
            returns,
        })
    }
}
