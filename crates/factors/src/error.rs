use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FactorError {
    #[error("Factor received invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("An error occurred during indicator calculation: {0}")]
    IndicatorError(String),

    #[error("Malformed factor output: {0}")]
    Data(#[from] core_types::CoreError),
}

impl From<ta::errors::TaError> for FactorError {
    fn from(err: ta::errors::TaError) -> Self {
        FactorError::IndicatorError(format!("{err:?}"))
    }
}
