//! Client error types.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Still rate limited after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl ClientError {
    /// Whether the user retrying later has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::RetryExhausted { .. } | Self::Timeout(_) => true,
            Self::Server { status, .. } => *status >= 500,
            Self::MalformedResponse(_) => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e.to_string())
    }
}
