use reqwest::StatusCode;

use crate::session::PlaybackError;

// Error type for backend and store operations
#[derive(Debug, thiserror::Error)]
pub enum VistaError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlError(String),

    #[error("Server returned status code {status}: {message}")]
    StatusCode { status: StatusCode, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<url::ParseError> for VistaError {
    fn from(err: url::ParseError) -> Self {
        VistaError::UrlError(err.to_string())
    }
}

impl VistaError {
    /// Whether the failure came from the transport layer rather than from the server.
    pub fn is_network(&self) -> bool {
        matches!(self, VistaError::HttpError(e) if e.is_connect() || e.is_timeout() || e.is_request())
    }
}
