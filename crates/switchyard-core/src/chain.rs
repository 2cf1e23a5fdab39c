//! Fallback chain configuration and routing strategy catalog

use std::fmt;

use serde::{Deserialize, Serialize};

/// Policy that decides how chain weights are computed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingStrategy {
    /// Weights are left as configured
    #[default]
    Balanced,
    /// Cheaper providers receive more weight
    Cost,
    /// Faster providers receive more weight
    Latency,
    /// Weight follows observed success rate
    Reliability,
    /// Operator-assigned weights, never recomputed
    Custom,
}

impl RoutingStrategy {
    /// Wire name of the strategy
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Cost => "cost",
            Self::Latency => "latency",
            Self::Reliability => "reliability",
            Self::Custom => "custom",
        }
    }

    /// Whether the optimizer recomputes weights for this strategy
    pub const fn recomputes_weights(self) -> bool {
        matches!(self, Self::Cost | Self::Latency | Self::Reliability)
    }
}

impl fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only description of a routing strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyDescriptor {
    pub name: RoutingStrategy,
    pub label: String,
    pub description: String,
}

/// The catalog of routing strategies offered to operators
pub fn strategy_catalog() -> Vec<StrategyDescriptor> {
    [
        (
            RoutingStrategy::Balanced,
            "Balanced",
            "Keep the configured weights and fall back in chain order",
        ),
        (
            RoutingStrategy::Cost,
            "Cost optimized",
            "Shift traffic toward providers with the lowest cost per 1k tokens",
        ),
        (
            RoutingStrategy::Latency,
            "Latency optimized",
            "Shift traffic toward providers with the lowest average latency",
        ),
        (
            RoutingStrategy::Reliability,
            "Reliability optimized",
            "Weight providers by their observed success rate",
        ),
        (
            RoutingStrategy::Custom,
            "Custom",
            "Operator-assigned weights that are never recomputed",
        ),
    ]
    .into_iter()
    .map(|(name, label, description)| StrategyDescriptor {
        name,
        label: label.to_owned(),
        description: description.to_owned(),
    })
    .collect()
}

/// A single provider slot in a fallback chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainEntry {
    /// Provider identity
    pub provider: String,
    /// Routing weight (0 to 100)
    pub weight: u32,
    /// Whether this entry is the chain's primary
    #[serde(default)]
    pub is_primary: bool,
}

impl ChainEntry {
    /// Primary entry with the given weight
    pub fn primary(provider: impl Into<String>, weight: u32) -> Self {
        Self {
            provider: provider.into(),
            weight,
            is_primary: true,
        }
    }

    /// Fallback entry with the given weight
    pub fn fallback(provider: impl Into<String>, weight: u32) -> Self {
        Self {
            provider: provider.into(),
            weight,
            is_primary: false,
        }
    }
}

/// Ordered fallback chain for one primary provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackChainConfig {
    /// Identity of the primary provider, also the store key
    pub primary_provider: String,
    /// Primary first, then fallbacks in configured order
    pub entries: Vec<ChainEntry>,
    /// How weights are computed for this chain
    #[serde(default)]
    pub routing_strategy: RoutingStrategy,
}

impl FallbackChainConfig {
    pub fn new(primary_provider: impl Into<String>, entries: Vec<ChainEntry>, routing_strategy: RoutingStrategy) -> Self {
        Self {
            primary_provider: primary_provider.into(),
            entries,
            routing_strategy,
        }
    }

    /// The entry flagged as primary, if any
    pub fn primary(&self) -> Option<&ChainEntry> {
        self.entries.iter().find(|e| e.is_primary)
    }

    /// Whether the provider appears anywhere in the chain
    pub fn contains(&self, provider: &str) -> bool {
        self.entries.iter().any(|e| e.provider == provider)
    }

    /// Sum of all entry weights
    pub fn total_weight(&self) -> u32 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    /// Provider names in chain order
    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.provider.as_str())
    }
}
