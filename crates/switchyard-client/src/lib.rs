#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Typed Rust HTTP client for the switchyard routing engine
//!
//! Covers the query and mutation endpoints, the live update stream, and
//! an [`UpdateFeed`] that keeps consumers current by reconnecting with
//! backoff and falling back to polling when push delivery is down.

mod client;
pub mod dispatcher;
pub mod error;
pub mod feed;
mod sse;
pub mod types;

pub use client::{EventStream, SwitchyardClient};
pub use dispatcher::EventDispatcher;
pub use error::{ClientError, Result};
pub use feed::{Backoff, ReconnectPolicy, UpdateFeed};
pub use switchyard_core::{
    ChainAnalytics, ChainEntry, EventKind, FallbackChainConfig, Provider, ProviderStatus, RoutingStrategy,
    StrategyDescriptor, UpdateEvent,
};
pub use types::*;
