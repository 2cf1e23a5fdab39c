//! Typed live-update events pushed to subscribers

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analytics::ChainAnalytics;
use crate::chain::FallbackChainConfig;
use crate::provider::Provider;

/// Update pushed to dashboards and callers
///
/// Serialized as `{"type": "<kind>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum UpdateEvent {
    /// A provider changed health status
    ProviderHealthUpdate(Provider),
    /// Weighted expectations of a chain were recomputed
    CostAnalyticsUpdate(ChainAnalytics),
    /// A chain was saved
    ChainUpdate(FallbackChainConfig),
}

impl UpdateEvent {
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::ProviderHealthUpdate(_) => EventKind::ProviderHealthUpdate,
            Self::CostAnalyticsUpdate(_) => EventKind::CostAnalyticsUpdate,
            Self::ChainUpdate(_) => EventKind::ChainUpdate,
        }
    }

    /// Provider or primary the event is about
    pub fn subject(&self) -> &str {
        match self {
            Self::ProviderHealthUpdate(provider) => &provider.name,
            Self::CostAnalyticsUpdate(analytics) => &analytics.primary_provider,
            Self::ChainUpdate(chain) => &chain.primary_provider,
        }
    }
}

/// Discriminant of an [`UpdateEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ProviderHealthUpdate,
    CostAnalyticsUpdate,
    ChainUpdate,
}

impl EventKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProviderHealthUpdate => "provider_health_update",
            Self::CostAnalyticsUpdate => "cost_analytics_update",
            Self::ChainUpdate => "chain_update",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
