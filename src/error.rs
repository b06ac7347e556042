use thiserror::Error;

#[derive(Error, Debug)]
pub enum PartsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Missing column `{column}` in {file}")]
    MissingColumn { file: String, column: String },

    #[error("{file}, line {line}: `{value}` is not a valid number for column `{column}`")]
    InvalidNumber {
        file: String,
        line: u64,
        column: String,
        value: String,
    },

    #[error("Total quantity for part `{part}` is too large")]
    QuantityOverflow { part: String },

    #[error("No order exports found in {0}")]
    NoExports(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PartsError>;
