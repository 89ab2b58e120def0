//! Error types for remote background removal operations

use thiserror::Error;

/// Result type alias for background removal operations
pub type Result<T> = std::result::Result<T, BgRemovalError>;

/// Failure kinds of the remote background-removal call
///
/// Every non-success outcome of the call lands here. The status code is kept
/// for diagnostics only; callers treat all variants the same way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteServiceError {
    /// The service answered with a non-2xx status
    #[error("remote service responded with HTTP {status}")]
    Status { status: u16 },

    /// The request could not be completed (no connectivity, TLS, reset, ...)
    #[error("request to remote service failed: {0}")]
    Transport(String),

    /// The response arrived but its body could not be read
    #[error("failed to read remote service response: {0}")]
    Body(String),
}

impl RemoteServiceError {
    /// HTTP status returned by the service, if the request got that far
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            Self::Transport(_) | Self::Body(_) => None,
        }
    }
}

/// Comprehensive error types for background removal operations
#[derive(Error, Debug)]
pub enum BgRemovalError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding errors (broken preview)
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// The remote background-removal call did not succeed
    #[error("Remote service error: {0}")]
    RemoteService(#[from] RemoteServiceError),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Processing errors outside the remote call
    #[error("Processing error: {0}")]
    Processing(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BgRemovalError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a remote service error for a non-success HTTP status
    #[must_use]
    pub fn remote_status(status: u16) -> Self {
        Self::RemoteService(RemoteServiceError::Status { status })
    }

    /// Create a remote service error for a request that never completed
    pub fn remote_transport<E: std::fmt::Display>(error: E) -> Self {
        Self::RemoteService(RemoteServiceError::Transport(error.to_string()))
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create configuration error with the accepted values
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        expected: &str,
    ) -> Self {
        Self::InvalidConfig(format!(
            "Invalid {}: {} (expected: {})",
            parameter, value, expected
        ))
    }

    /// Whether this error came from the remote service
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteService(_))
    }
}
