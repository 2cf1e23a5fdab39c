//! Fallback chain storage and provider selection for switchyard
//!
//! - **Store**: validated fallback chains keyed by primary provider
//! - **Optimizer**: strategy-driven weight distributions over a chain
//! - **Engine**: per-request provider selection over the current health snapshot
//! - **Analytics**: weighted cost, latency and reliability expectations of a chain

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod analytics;
pub mod engine;
pub mod error;
pub mod optimizer;
pub mod store;

pub use analytics::chain_analytics;
pub use engine::{Decision, RankedProvider, RoutingEngine, SelectOptions};
pub use error::{RoutingError, ValidationError};
pub use optimizer::{normalize, optimize};
pub use store::{ChainObserver, ChainStore, SaveOptions};
