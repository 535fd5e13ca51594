use reqwest::StatusCode;
use thiserror::Error;

use crate::InfluxOp;

#[derive(Error, Debug)]
pub enum InfluxError {
    /// Connection refused, DNS failure, timeout or a failing body stream.
    #[error("{0}")]
    TransportError(#[from] reqwest::Error),

    /// The measurement can not be rendered as a valid line.
    #[error("Encoding failed: {0}")]
    EncodingError(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The server answered, but with a status code outside of the expected set for the operation.
    #[error("InfluxDB api responded to {operation} with code {code}, expected {expected:?}. response body is: {body}")]
    ApiResponseError {
        operation: InfluxOp,
        code: StatusCode,
        body: String,
        expected: Vec<u16>,
    },

    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl InfluxError {
    /// The server does not guarantee the points of a write answered with `500` are lost:
    /// they were accepted but might not be durable.
    pub fn is_possibly_written(&self) -> bool {
        matches!(
            self,
            Self::ApiResponseError { operation: InfluxOp::Write, code, .. } if *code == StatusCode::INTERNAL_SERVER_ERROR
        )
    }

    /// Status code received from the server, if the error is an api response error.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::ApiResponseError { code, .. } => Some(*code),
            Self::TransportError(e) => e.status(),
            _ => None,
        }
    }
}
