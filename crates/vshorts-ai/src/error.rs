//! Oracle client error types.

use thiserror::Error;

pub type AiResult<T> = Result<T, AiError>;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chat API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Chat API returned no content")]
    EmptyResponse,

    #[error("Invalid chat API response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AiError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Rate limiting, server errors and transport failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::Api { status, .. } => *status == 429 || *status >= 500,
            AiError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}
