//! Shared domain model for switchyard
//!
//! Provider health records, fallback chain configuration, routing
//! strategies and the typed update events exchanged with consumers.

#![allow(clippy::must_use_candidate)]

pub mod analytics;
pub mod chain;
pub mod error;
pub mod event;
pub mod provider;
pub mod snapshot;

use std::time::{SystemTime, UNIX_EPOCH};

pub use analytics::{ChainAnalytics, EntryAnalytics};
pub use chain::{ChainEntry, FallbackChainConfig, RoutingStrategy, StrategyDescriptor, strategy_catalog};
pub use error::HttpError;
pub use event::{EventKind, UpdateEvent};
pub use provider::{Provider, ProviderStatus};
pub use snapshot::HealthSnapshot;

/// Milliseconds since the unix epoch
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
