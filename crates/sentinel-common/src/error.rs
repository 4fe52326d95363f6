//! Error types for the sentinel-gis services.

use thiserror::Error;

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;

/// Primary error type for API request handling.
///
/// Every handler failure is converted into one of these variants and
/// rendered as a `{success:false, error}` JSON body; nothing propagates
/// past a handler as a panic or bare error.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Earth Engine is not initialized")]
    NotInitialized,

    #[error("Remote imagery service error: {0}")]
    Remote(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status code for this error.
    ///
    /// The image endpoint's contract keeps 500 for anything that reaches
    /// the remote service; only request-shape problems caught before the
    /// remote call map to 400-class codes via the framework's extractor.
    pub fn http_status_code(&self) -> u16 {
        match self {
            ApiError::NotInitialized => 503,
            _ => 500,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(format!("JSON error: {}", err))
    }
}

impl From<crate::bbox::BboxParseError> for ApiError {
    fn from(err: crate::bbox::BboxParseError) -> Self {
        ApiError::InvalidField {
            field: "bounds".to_string(),
            message: err.to_string(),
        }
    }
}
