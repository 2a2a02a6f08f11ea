use crate::error::CoreError;
use crate::series::{Timestamp, TimeSeries, ensure_unique};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Name of the field every simulator reads prices from.
pub const CLOSE: &str = "close";

/// The canonical bar schema, in column order.
pub const OHLCV_FIELDS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// A single cleaned OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: Timestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// One symbol's bars laid out column-wise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvFrame {
    index: Vec<Timestamp>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
}

impl OhlcvFrame {
    /// Builds a frame from bars, sorting them by timestamp.
    pub fn from_bars(mut bars: Vec<Bar>) -> Result<Self, CoreError> {
        bars.sort_by_key(|b| b.timestamp);
        let index: Vec<Timestamp> = bars.iter().map(|b| b.timestamp).collect();
        ensure_unique("bars", &index)?;
        Ok(Self {
            index,
            open: bars.iter().map(|b| b.open).collect(),
            high: bars.iter().map(|b| b.high).collect(),
            low: bars.iter().map(|b| b.low).collect(),
            close: bars.iter().map(|b| b.close).collect(),
            volume: bars.iter().map(|b| b.volume).collect(),
        })
    }

    /// A frame where only the close is meaningful; the other fields mirror it
    /// and volume is zero. Handy for factor inputs built from bare prices.
    pub fn from_closes(index: Vec<Timestamp>, close: Vec<f64>) -> Result<Self, CoreError> {
        if index.len() != close.len() {
            return Err(CoreError::LengthMismatch {
                name: CLOSE.to_string(),
                index: index.len(),
                values: close.len(),
            });
        }
        let bars = index
            .into_iter()
            .zip(close)
            .map(|(timestamp, c)| Bar {
                timestamp,
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 0.0,
            })
            .collect();
        Self::from_bars(bars)
    }

    pub fn index(&self) -> &[Timestamp] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn close(&self) -> &[f64] {
        &self.close
    }

    pub fn field(&self, name: &str) -> Option<&[f64]> {
        match name {
            "open" => Some(&self.open),
            "high" => Some(&self.high),
            "low" => Some(&self.low),
            "close" => Some(&self.close),
            "volume" => Some(&self.volume),
            _ => None,
        }
    }

    pub fn close_series(&self) -> TimeSeries {
        TimeSeries::from_parts(
            CLOSE.to_string(),
            self.index.clone(),
            self.close.iter().copied().map(Some).collect(),
        )
    }
}

/// Column label of a [`PriceTable`].
///
/// Multi-asset tables are keyed by `(symbol, field)` pairs. `Flat` labels
/// come from single-level tables, which the portfolio simulator rejects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnLabel {
    Flat(String),
    Pair { symbol: String, field: String },
}

impl ColumnLabel {
    pub fn pair(symbol: impl Into<String>, field: impl Into<String>) -> Self {
        ColumnLabel::Pair {
            symbol: symbol.into(),
            field: field.into(),
        }
    }
}

/// A timestamp × (symbol, field) price table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    index: Vec<Timestamp>,
    columns: Vec<(ColumnLabel, Vec<f64>)>,
}

impl PriceTable {
    pub fn from_columns(
        index: Vec<Timestamp>,
        columns: Vec<(ColumnLabel, Vec<f64>)>,
    ) -> Result<Self, CoreError> {
        for (label, values) in &columns {
            if values.len() != index.len() {
                return Err(CoreError::LengthMismatch {
                    name: format!("{label:?}"),
                    index: index.len(),
                    values: values.len(),
                });
            }
        }
        let duplicate = {
            let mut seen = HashSet::with_capacity(columns.len());
            columns
                .iter()
                .find(|(label, _)| !seen.insert(label))
                .map(|(label, _)| label.clone())
        };
        if let Some(label) = duplicate {
            return Err(CoreError::InvalidInput(
                "columns".to_string(),
                format!("duplicate column {label:?}"),
            ));
        }
        Ok(Self { index, columns })
    }

    /// Concatenates per-symbol bar frames side by side. Every frame must
    /// cover exactly the same timestamps.
    pub fn from_frames(frames: &[(String, OhlcvFrame)]) -> Result<Self, CoreError> {
        let Some((_, first)) = frames.first() else {
            return Self::from_columns(Vec::new(), Vec::new());
        };
        let index = first.index().to_vec();
        let mut columns = Vec::with_capacity(frames.len() * OHLCV_FIELDS.len());
        for (symbol, frame) in frames {
            if frame.index() != index.as_slice() {
                return Err(CoreError::InvalidInput(
                    symbol.clone(),
                    "bar timestamps differ from the other symbols".to_string(),
                ));
            }
            for field in OHLCV_FIELDS {
                let values = frame.field(field).unwrap_or_default().to_vec();
                columns.push((ColumnLabel::pair(symbol.as_str(), field), values));
            }
        }
        Self::from_columns(index, columns)
    }

    pub fn index(&self) -> &[Timestamp] {
        &self.index
    }

    pub fn columns(&self) -> &[(ColumnLabel, Vec<f64>)] {
        &self.columns
    }

    /// True when the table has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.columns.is_empty()
    }

    /// True when every column carries a `(symbol, field)` label.
    pub fn is_multi_level(&self) -> bool {
        !self.columns.is_empty()
            && self
                .columns
                .iter()
                .all(|(label, _)| matches!(label, ColumnLabel::Pair { .. }))
    }

    /// Distinct first-level labels in order of first appearance.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = Vec::new();
        for (label, _) in &self.columns {
            if let ColumnLabel::Pair { symbol, .. } = label {
                if !symbols.contains(symbol) {
                    symbols.push(symbol.clone());
                }
            }
        }
        symbols
    }

    pub fn field(&self, symbol: &str, field: &str) -> Option<&[f64]> {
        self.columns.iter().find_map(|(label, values)| match label {
            ColumnLabel::Pair { symbol: s, field: f } if s == symbol && f == field => {
                Some(values.as_slice())
            }
            _ => None,
        })
    }

    /// Rebuilds one symbol's bar frame, if all OHLCV fields are present.
    pub fn symbol_frame(&self, symbol: &str) -> Option<OhlcvFrame> {
        let open = self.field(symbol, "open")?;
        let high = self.field(symbol, "high")?;
        let low = self.field(symbol, "low")?;
        let close = self.field(symbol, CLOSE)?;
        let volume = self.field(symbol, "volume")?;
        let bars = (0..self.index.len())
            .map(|i| Bar {
                timestamp: self.index[i],
                open: open[i],
                high: high[i],
                low: low[i],
                close: close[i],
                volume: volume[i],
            })
            .collect();
        OhlcvFrame::from_bars(bars).ok()
    }

    /// Returns a copy sorted by ascending timestamp, rejecting duplicates.
    pub fn sort_index(&self) -> Result<Self, CoreError> {
        ensure_unique("prices", &self.index)?;
        let mut order: Vec<usize> = (0..self.index.len()).collect();
        order.sort_by_key(|&i| self.index[i]);
        Ok(Self {
            index: order.iter().map(|&i| self.index[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|(label, values)| (label.clone(), order.iter().map(|&i| values[i]).collect()))
                .collect(),
        })
    }
}
