//! Routing-specific error types

use http::StatusCode;
use switchyard_core::HttpError;
use thiserror::Error;

/// Reasons a fallback chain is rejected on save
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("chain for {primary} has no entries")]
    EmptyChain { primary: String },

    #[error("chain for {primary} has no entry flagged as primary")]
    MissingPrimary { primary: String },

    #[error("chain for {primary} flags more than one entry as primary")]
    MultiplePrimaries { primary: String },

    /// The flagged primary entry is not the chain's primary provider
    #[error("primary entry {found} does not match chain primary {expected}")]
    PrimaryMismatch { expected: String, found: String },

    #[error("provider {provider} appears more than once in the chain")]
    DuplicateProvider { provider: String },

    #[error("unknown provider: {provider}")]
    UnknownProvider { provider: String },

    #[error("weight {weight} for {provider} is outside 0 to 100")]
    WeightOutOfRange { provider: String, weight: u32 },

    /// The primary is offline; resubmit with the override to save anyway
    #[error("primary provider {primary} is offline")]
    PrimaryOfflineWarning { primary: String },
}

impl ValidationError {
    /// Whether the caller may override this and save anyway
    pub const fn is_advisory(&self) -> bool {
        matches!(self, Self::PrimaryOfflineWarning { .. })
    }
}

impl HttpError for ValidationError {
    fn status_code(&self) -> StatusCode {
        if self.is_advisory() {
            StatusCode::CONFLICT
        } else {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::PrimaryOfflineWarning { .. } => "primary_offline_warning",
            Self::UnknownProvider { .. } => "unknown_provider",
            _ => "validation_error",
        }
    }
}

/// Errors surfaced by provider selection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// No chain is configured for the primary
    #[error("no fallback chain configured for {primary}")]
    ChainNotFound { primary: String },

    /// Every entry in the chain is ineligible
    #[error("all providers in the chain for {primary} are unavailable")]
    AllProvidersUnavailable { primary: String },
}

impl RoutingError {
    /// Whether the caller should retry later
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::AllProvidersUnavailable { .. })
    }
}

impl HttpError for RoutingError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ChainNotFound { .. } => StatusCode::NOT_FOUND,
            Self::AllProvidersUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::ChainNotFound { .. } => "not_found_error",
            Self::AllProvidersUnavailable { .. } => "all_providers_unavailable",
        }
    }
}
