//! Error types for Headscale operations.
//!
//! Transport and decode failures always reach the caller as-is. Server signals
//! detected in error bodies become the dedicated [`Error::Unauthorized`] and
//! [`Error::UserNotFound`] variants so callers can compare them directly.

use thiserror::Error;

/// Main error type for Headscale operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The request never produced a response (connection, TLS, body read)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The server rejected the API key
    #[error("Unauthorized")]
    Unauthorized,

    /// The named user does not exist on the server
    #[error("User not found")]
    UserNotFound,

    /// A success response carried a body that could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// A response that matched no classification rule
    #[error("Unclassified response (HTTP {status}): {body}")]
    Unclassified {
        /// HTTP status code returned by the server
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Specialized result type for Headscale operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Unclassified { .. } => "UNCLASSIFIED",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    /// Returns true when the request failed below the HTTP layer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }

    /// Returns true for errors that came from a recognised server signal.
    #[must_use]
    pub const fn is_server_signal(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::UserNotFound)
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
