use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BacktestError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("prices must contain at least one observation")]
    EmptyPrices,

    #[error("signal and prices do not share any timestamps")]
    NoOverlap,

    #[error("Malformed input series: {0}")]
    Data(#[from] core_types::CoreError),
}
