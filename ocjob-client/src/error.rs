//! Error types for the cluster client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the cluster API
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Resource already exists or was modified concurrently
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The request could not be built from the given input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Coarse classification used by the controller to decide whether to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network failure or server-side error; worth retrying
    Transport,
    /// The resource does not exist
    NotFound,
    /// The resource is in a conflicting state
    Conflict,
    /// The request itself was refused or malformed
    Rejected,
}

impl ClientError {
    /// Create an API error from status code and message
    ///
    /// 404 and 409 are mapped to their resource-level variants.
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            _ => Self::ApiError { status, message },
        }
    }

    /// Create a transport-level error without an underlying reqwest error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::ApiError {
            status: 503,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RequestFailed(e) if e.is_builder() => ErrorKind::Rejected,
            Self::RequestFailed(_) => ErrorKind::Transport,
            Self::ApiError { status, .. } if *status >= 500 || *status == 429 => {
                ErrorKind::Transport
            }
            Self::ApiError { .. } => ErrorKind::Rejected,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::ParseError(_) | Self::InvalidRequest(_) => ErrorKind::Rejected,
        }
    }

    /// Check if retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
