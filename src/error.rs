use thiserror::Error;

pub use anyhow::Context;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    Chrono(#[from] chrono::ParseError),
    #[error("request for {symbols} symbol(s) is still too large for the provider")]
    RequestTooLarge { symbols: usize },
    #[error("gave up after {attempts} batch plans; the provider kept rejecting requests as too large")]
    ReplanLimitExceeded { attempts: usize },
    #[error("no historical data for {0}")]
    NoHistory(String),
    #[error("unknown instrument `{0}`")]
    UnknownInstrument(String),
    #[error("{context} failed with status {status}")]
    Status {
        context: String,
        status: reqwest::StatusCode,
    },
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn message<T: Into<String>>(msg: T) -> Self {
        AppError::Message(msg.into())
    }
}
