//! Weight matrix construction for the portfolio simulator.
//!
//! Both builders return a [`Frame`] on the simulation timeline with one
//! column per price symbol and every cell defined.

use crate::error::PortfolioError;
use core_types::{Frame, Timestamp};

/// Static target mode.
///
/// Each row listed in `rebalance_rows` is set to `targets`, and the rows in
/// between carry the most recent rebalance row forward. Rows before the
/// first rebalance are zero. A target of 0 on a rebalance row resets that
/// symbol to 0.
///
/// `targets` is ordered like `symbols`.
pub fn static_weights(
    timeline: &[Timestamp],
    symbols: &[String],
    targets: &[f64],
    rebalance_rows: &[usize],
) -> Result<Frame, PortfolioError> {
    if targets.len() != symbols.len() {
        return Err(PortfolioError::InvalidParameter {
            name: "weights",
            reason: format!("expected {} targets, got {}", symbols.len(), targets.len()),
        });
    }

    let mut is_rebalance = vec![false; timeline.len()];
    for &row in rebalance_rows {
        if let Some(flag) = is_rebalance.get_mut(row) {
            *flag = true;
        }
    }

    let columns = symbols
        .iter()
        .zip(targets)
        .map(|(symbol, &target)| {
            let mut held = 0.0;
            let values = is_rebalance
                .iter()
                .map(|&rebalance| {
                    if rebalance {
                        held = target;
                    }
                    Some(held)
                })
                .collect();
            (symbol.clone(), values)
        })
        .collect();

    Ok(Frame::new(timeline.to_vec(), columns)?)
}

/// Signal-override mode.
///
/// Every signal row is scaled so its absolute values sum to one (undefined
/// cells count as 0, all-zero rows stay zero, rows whose absolute sum is
/// infinite become zero), then conformed to
/// `timeline`: signal rows off the timeline are dropped, timeline rows
/// without a signal row inherit the previous one, and anything still
/// undefined becomes 0. Price symbols with no signal column get weight 0.
pub fn signal_weights(
    timeline: &[Timestamp],
    symbols: &[String],
    signals: &Frame,
) -> Result<Frame, PortfolioError> {
    let unknown: Vec<String> = signals
        .columns()
        .iter()
        .filter(|c| !symbols.contains(*c))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(PortfolioError::UnknownSignalSymbols(unknown));
    }

    let signals = signals.sort_index()?;
    let gross: Vec<f64> = (0..signals.nrows())
        .map(|row| signals.row(row).iter().flatten().map(|v| v.abs()).sum())
        .collect();

    let columns = symbols
        .iter()
        .map(|symbol| {
            let values = match signals.column(symbol) {
                Some(column) => column
                    .iter()
                    .zip(&gross)
                    .map(|(value, &total)| {
                        if total == 0.0 || !total.is_finite() {
                            Some(0.0)
                        } else {
                            Some(value.unwrap_or(0.0) / total)
                        }
                    })
                    .collect(),
                None => vec![Some(0.0); signals.nrows()],
            };
            (symbol.clone(), values)
        })
        .collect();

    let normalized = Frame::new(signals.index().to_vec(), columns)?;
    Ok(normalized.reindex(timeline).ffill().fill_none(0.0))
}

/// Row-wise sum of absolute weights.
pub fn gross_exposure(weights: &Frame) -> Vec<f64> {
    (0..weights.nrows())
        .map(|row| weights.row(row).iter().flatten().map(|v| v.abs()).sum())
        .collect()
}
