use serde::{Deserialize, Serialize};

use crate::provider::ProviderStatus;

/// Weighted expectations for a fallback chain under current health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainAnalytics {
    pub primary_provider: String,
    /// Weight-averaged cost in USD per 1k tokens
    pub expected_cost_per_1k_tokens: f64,
    /// Weight-averaged latency in milliseconds
    pub expected_latency_ms: f64,
    /// Weight-averaged success rate (0 to 100)
    pub expected_success_rate: f64,
    pub entries: Vec<EntryAnalytics>,
}

/// Per-entry contribution to chain analytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryAnalytics {
    pub provider: String,
    pub weight: u32,
    pub status: ProviderStatus,
    pub cost_per_1k_tokens: f64,
    pub avg_latency_ms: f64,
    pub success_rate: f64,
}
