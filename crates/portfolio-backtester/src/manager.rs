use crate::calendar::rebalance_indices;
use crate::error::PortfolioError;
use crate::weights::{signal_weights, static_weights};
use backtester::{rebalance_turnover, BacktestError, CostModel};
use configuration::{PortfolioSettings, TargetWeight};
use core_types::{Frame, PriceTable, TimeSeries, CLOSE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label carried by every returns series the portfolio simulator emits.
pub const PORTFOLIO_RETURNS: &str = "portfolio_returns";

/// Every intermediate table of one portfolio run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTrace {
    pub weights: Frame,
    /// `weights` lagged by one row.
    pub positions: Frame,
    pub asset_returns: Frame,
    pub turnover: Vec<f64>,
    pub returns: TimeSeries,
}

/// Multi-asset backtester with calendar rebalancing.
///
/// Weights are either a static target allocation reapplied on each
/// rebalance date or, when `run` is given a signal table, the row-normalized
/// signals.
#[derive(Debug, Clone)]
pub struct PortfolioBacktester {
    prices: PriceTable,
    symbols: Vec<String>,
    closes: Vec<Vec<f64>>,
    targets: Vec<f64>,
    settings: PortfolioSettings,
    cost_model: CostModel,
}

impl PortfolioBacktester {
    /// Validates the price table and settings.
    ///
    /// Configured weights must name exactly the table's symbols; without
    /// them every symbol gets `1/N`.
    pub fn new(prices: PriceTable, settings: PortfolioSettings) -> Result<Self, PortfolioError> {
        if prices.is_empty() {
            return Err(PortfolioError::EmptyPrices);
        }
        if !prices.is_multi_level() {
            return Err(PortfolioError::Shape(
                "columns must be (symbol, field) pairs".to_string(),
            ));
        }
        let cost_model = CostModel::new(settings.commission_rate).map_err(|err| match err {
            BacktestError::InvalidParameter { name, reason } => {
                PortfolioError::InvalidParameter { name, reason }
            }
            other => other.into(),
        })?;

        let prices = prices.sort_index()?;
        let symbols = prices.symbols();
        let closes = symbols
            .iter()
            .map(|symbol| {
                prices
                    .field(symbol, CLOSE)
                    .map(<[f64]>::to_vec)
                    .ok_or_else(|| PortfolioError::MissingField {
                        symbol: symbol.clone(),
                        field: CLOSE.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let targets = match &settings.weights {
            Some(weights) => resolve_targets(&symbols, weights)?,
            None => vec![1.0 / symbols.len() as f64; symbols.len()],
        };

        Ok(Self {
            prices,
            symbols,
            closes,
            targets,
            settings,
            cost_model,
        })
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// Symbols in the price table's column order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Target allocation per symbol, in `symbols()` order.
    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    pub fn settings(&self) -> &PortfolioSettings {
        &self.settings
    }

    /// Runs the simulation and returns only the net portfolio returns.
    pub fn run(&self, signals: Option<&Frame>) -> Result<TimeSeries, PortfolioError> {
        Ok(self.simulate(signals)?.returns)
    }

    pub fn simulate(&self, signals: Option<&Frame>) -> Result<PortfolioTrace, PortfolioError> {
        let timeline = self.prices.index();

        let asset_returns = Frame::new(
            timeline.to_vec(),
            self.symbols
                .iter()
                .zip(&self.closes)
                .map(|(symbol, close)| (symbol.clone(), pct_change(close)))
                .collect(),
        )?;

        let weights = match signals {
            Some(signals) => signal_weights(timeline, &self.symbols, signals)?,
            None => {
                let rows = rebalance_indices(timeline, self.settings.rebalance_frequency);
                tracing::debug!(
                    frequency = %self.settings.rebalance_frequency,
                    rebalances = rows.len(),
                    "built rebalance calendar"
                );
                static_weights(timeline, &self.symbols, &self.targets, &rows)?
            }
        };
        let positions = weights.shift(1);

        let mut raw = Vec::with_capacity(timeline.len());
        let mut turnover = Vec::with_capacity(timeline.len());
        let mut previous: Option<Vec<Option<f64>>> = None;
        for row in 0..timeline.len() {
            let current = positions.row(row);
            let contribution: f64 = current
                .iter()
                .zip(asset_returns.row(row))
                .filter_map(|(position, ret)| Some((*position)? * ret?))
                .sum();
            raw.push(Some(contribution));
            turnover.push(match &previous {
                Some(previous) => rebalance_turnover(previous, &current),
                None => 0.0,
            });
            previous = Some(current);
        }
        let net = self.cost_model.apply(&raw, &turnover);
        let returns = TimeSeries::new(PORTFOLIO_RETURNS, timeline.to_vec(), net)?;

        tracing::debug!(
            rows = timeline.len(),
            symbols = self.symbols.len(),
            signal_mode = signals.is_some(),
            commission_rate = self.cost_model.commission_rate(),
            "portfolio simulation complete"
        );

        Ok(PortfolioTrace {
            weights,
            positions,
            asset_returns,
            turnover,
            returns,
        })
    }
}

/// Maps configured weights onto `symbols` order. Each symbol must appear
/// exactly once with a finite weight.
fn resolve_targets(
    symbols: &[String],
    targets: &[TargetWeight],
) -> Result<Vec<f64>, PortfolioError> {
    let mut weights: HashMap<String, f64> = HashMap::with_capacity(targets.len());
    for target in targets {
        if !target.weight.is_finite() {
            return Err(PortfolioError::InvalidParameter {
                name: "weights",
                reason: format!(
                    "weight for {} must be a finite number (got {})",
                    target.symbol, target.weight
                ),
            });
        }
        if weights.insert(target.symbol.clone(), target.weight).is_some() {
            return Err(PortfolioError::DuplicateWeight(target.symbol.clone()));
        }
    }

    let missing: Vec<String> = symbols
        .iter()
        .filter(|s| !weights.contains_key(*s))
        .cloned()
        .collect();
    let mut extra: Vec<String> = weights
        .keys()
        .filter(|k| !symbols.contains(*k))
        .cloned()
        .collect();
    extra.sort();
    if !missing.is_empty() || !extra.is_empty() {
        return Err(PortfolioError::WeightMismatch { missing, extra });
    }
    Ok(symbols.iter().map(|s| weights[s]).collect())
}

fn pct_change(close: &[f64]) -> Vec<Option<f64>> {
    (0..close.len())
        .map(|i| if i == 0 { None } else { Some(close[i] / close[i - 1] - 1.0) })
        .collect()
}
