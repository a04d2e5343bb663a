use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("The HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("The provider responded with status {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("The provider reported an error for '{ticker}': {code}: {description}")]
    Provider {
        ticker: String,
        code: String,
        description: String,
    },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Whether trying the same request again could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(e) => !e.is_builder() && !e.is_decode(),
            ApiError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}
