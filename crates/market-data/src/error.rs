use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to read price file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to fetch price data: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("the source contains no rows")]
    Empty,

    #[error("Missing required OHLCV columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("data must include a datetime column")]
    NoDatetimeColumn,

    #[error("Unparseable datetime '{value}' on line {line}")]
    InvalidDatetime { value: String, line: u64 },

    #[error("Invalid bars: {0}")]
    Bars(#[from] core_types::CoreError),

    #[error("could not fetch data for {symbol} from any provided source")]
    NoSource {
        symbol: String,
        #[source]
        last_error: Option<Box<DataError>>,
    },
}
