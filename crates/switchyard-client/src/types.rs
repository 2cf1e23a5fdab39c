//! Request and response bodies of the switchyard API

use serde::{Deserialize, Serialize};
use switchyard_core::{ChainEntry, Provider, RoutingStrategy};

/// Outcome of one provider call, reported back to the health monitor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeReport {
    pub success: bool,
    pub latency_ms: f64,
    #[serde(default)]
    pub cost_incurred: f64,
}

/// Body of a runtime provider registration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterProvider {
    pub name: String,
    pub cost_per_1k_tokens: f64,
    /// OpenAI-compatible endpoint; without one the provider cannot be tested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_rpm: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_model: Option<String>,
}

/// Result of a provider test call
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReport {
    pub healthy: bool,
    pub latency_ms: f64,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of a chain save
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveChain {
    pub entries: Vec<ChainEntry>,
    pub routing_strategy: RoutingStrategy,
    /// Save even if the primary is offline
    pub allow_offline_primary: bool,
}

/// Weights proposed by the optimizer; nothing is saved
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeProposal {
    pub primary_provider: String,
    pub strategy: RoutingStrategy,
    pub entries: Vec<ChainEntry>,
}

/// Body of a routing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub primary: String,
    pub exclude_offline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

impl RouteRequest {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            exclude_offline: true,
            strict: None,
        }
    }

    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }
}

/// Selected provider and the eligible candidates in fallback order
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RouteDecision {
    pub provider: Provider,
    pub ranked: Vec<RankedEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RankedEntry {
    pub provider: Provider,
    pub weight: u32,
    pub share: f64,
}
