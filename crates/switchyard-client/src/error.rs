/// Client-specific result type
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors from the switchyard client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response
    #[error("{status} {error_type}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error type identifier
        error_type: String,
        /// Human-readable error message
        message: String,
    },

    /// Failed to parse response
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Update stream ended or broke
    #[error("stream error: {0}")]
    Stream(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Error type reported by the server, if this is an API error
    pub fn error_type(&self) -> Option<&str> {
        match self {
            Self::Api { error_type, .. } => Some(error_type),
            _ => None,
        }
    }

    /// Whether the request may succeed if retried later
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Stream(_) => true,
            Self::Api { status, .. } => *status == 503 || *status == 504,
            Self::Parse(_) | Self::Config(_) => false,
        }
    }
}
