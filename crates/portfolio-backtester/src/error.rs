use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
    /// The price table does not have the `(symbol, field)` column structure.
    #[error("Malformed price table: {0}")]
    Shape(String),

    #[error("price table must contain at least one row and one column")]
    EmptyPrices,

    #[error("price table has no '{field}' column for symbol {symbol}")]
    MissingField { symbol: String, field: String },

    #[error("target weights do not match the price symbols: {}", describe_mismatch(.missing, .extra))]
    WeightMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("target weight for {0} is given more than once")]
    DuplicateWeight(String),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("signal symbols not in data: {}", .0.join(", "))]
    UnknownSignalSymbols(Vec<String>),

    #[error(transparent)]
    Backtest(#[from] backtester::BacktestError),

    #[error("Malformed input table: {0}")]
    Data(#[from] core_types::CoreError),
}

fn describe_mismatch(missing: &[String], extra: &[String]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing weights for {}", missing.join(", ")));
    }
    if !extra.is_empty() {
        parts.push(format!("weights for symbols not in data: {}", extra.join(", ")));
    }
    parts.join("; ")
}
