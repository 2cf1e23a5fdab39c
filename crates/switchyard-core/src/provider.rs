use std::fmt;

use serde::{Deserialize, Serialize};

/// Health-derived availability of a provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    /// Healthy and eligible for routing
    #[default]
    Active,
    /// Reachable but below the success-rate or latency bar
    Degraded,
    /// Not eligible for routing
    Offline,
}

impl ProviderStatus {
    /// Wire name of the status
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Degraded => "degraded",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time health record of a single provider
///
/// Only the health monitor produces these; routing reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    /// Provider identity
    pub name: String,
    /// Current classification
    pub status: ProviderStatus,
    /// Rolling success rate (0 to 100)
    pub success_rate: f64,
    /// Moving average of call latency in milliseconds
    pub avg_latency_ms: f64,
    /// Catalog cost in USD per 1k tokens
    pub cost_per_1k_tokens: f64,
    /// Total failed outcomes observed
    pub error_count: u64,
    /// Failures since the last success
    pub consecutive_failures: u32,
    /// Total outcomes observed
    pub total_requests: u64,
    /// Sum of reported call costs in USD
    pub total_cost: f64,
    /// Unix milliseconds of the last successful outcome
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success_timestamp: Option<u64>,
    /// Catalog rate limit in requests per minute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_rpm: Option<u32>,
}

impl Provider {
    /// A provider that has not yet been observed
    pub fn new(name: impl Into<String>, cost_per_1k_tokens: f64) -> Self {
        Self {
            name: name.into(),
            status: ProviderStatus::Active,
            success_rate: 100.0,
            avg_latency_ms: 0.0,
            cost_per_1k_tokens,
            error_count: 0,
            consecutive_failures: 0,
            total_requests: 0,
            total_cost: 0.0,
            last_success_timestamp: None,
            rate_limit_rpm: None,
        }
    }

    /// Set the catalog rate limit
    #[must_use]
    pub fn with_rate_limit(mut self, rpm: Option<u32>) -> Self {
        self.rate_limit_rpm = rpm;
        self
    }

    /// Whether the provider is excluded from routing
    pub fn is_offline(&self) -> bool {
        self.status == ProviderStatus::Offline
    }
}
