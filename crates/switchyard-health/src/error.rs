//! Health-specific error types

use http::StatusCode;
use switchyard_core::HttpError;
use thiserror::Error;

/// Errors raised by provider validation and probing
#[derive(Debug, Error)]
pub enum HealthError {
    /// Provider is not part of the catalog
    #[error("unknown provider: {provider}")]
    UnknownProvider { provider: String },

    /// Provider is already part of the catalog
    #[error("provider {provider} is already registered")]
    ProviderExists { provider: String },

    /// Registration data cannot describe a provider
    #[error("invalid provider: {0}")]
    InvalidProvider(String),

    /// Provider has no endpoint that can be probed
    #[error("provider {provider} has no probe endpoint configured")]
    ProbeUnavailable { provider: String },

    /// Probe did not finish within its time bound
    #[error("probe of {provider} timed out after {timeout_ms}ms")]
    ProbeTimeout { provider: String, timeout_ms: u64 },

    /// Probe reached the provider but failed
    #[error("probe failed: {0}")]
    ProbeFailed(String),
}

impl HttpError for HealthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownProvider { .. } => StatusCode::NOT_FOUND,
            Self::ProviderExists { .. } => StatusCode::CONFLICT,
            Self::InvalidProvider(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ProbeUnavailable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ProbeTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::ProbeFailed(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::UnknownProvider { .. } => "not_found_error",
            Self::ProviderExists { .. } => "conflict_error",
            Self::InvalidProvider(_) => "invalid_request_error",
            Self::ProbeUnavailable { .. } => "invalid_request_error",
            Self::ProbeTimeout { .. } => "probe_timeout",
            Self::ProbeFailed(_) => "probe_error",
        }
    }
}
