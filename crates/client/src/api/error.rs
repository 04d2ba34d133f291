//! Prefix-search API error types.

use std::sync::Arc;

/// Errors from the prefix-search transport.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request was superseded or the input was dismissed.
    #[error("request cancelled")]
    Cancelled,

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Non-success HTTP status.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response body was not the expected JSON.
    #[error("parse error: {0}")]
    Parse(String),

    /// Request URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Client could not be built from configuration.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ApiError::Timeout } else { ApiError::Network(Arc::new(err)) }
    }
}

impl ApiError {
    /// Cancellation is an expected outcome, not a failure worth a warning.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}
