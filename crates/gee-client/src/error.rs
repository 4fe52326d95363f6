//! Error types for the Earth Engine client.

use thiserror::Error;

/// Result type alias using GeeError.
pub type GeeResult<T> = Result<T, GeeError>;

/// Errors raised by the Earth Engine client.
#[derive(Debug, Error)]
pub enum GeeError {
    #[error("GEE_CREDENTIALS not set in the environment")]
    MissingCredentials,

    #[error("Invalid service-account credentials: {0}")]
    InvalidCredentials(String),

    #[error("Token exchange failed: {0}")]
    Auth(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Earth Engine rejected the request ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Unexpected response from Earth Engine: {0}")]
    UnexpectedResponse(String),
}
