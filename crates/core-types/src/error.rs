use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Length mismatch for '{name}': index has {index} rows but values have {values}")]
    LengthMismatch {
        name: String,
        index: usize,
        values: usize,
    },

    #[error("Index for '{0}' contains duplicate timestamps")]
    DuplicateTimestamp(String),
}
