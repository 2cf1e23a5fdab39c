#![allow(clippy::must_use_candidate)]

pub mod chains;
mod env;
pub mod events;
pub mod health;
mod loader;
pub mod providers;
pub mod routing;
pub mod server;
pub mod telemetry;
pub mod validation;

use indexmap::IndexMap;
use serde::Deserialize;

pub use chains::*;
pub use events::*;
pub use health::*;
pub use providers::*;
pub use routing::*;
pub use server::*;
pub use telemetry::TelemetryConfig;
pub use validation::*;

/// Top-level switchyard configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Known providers keyed by identity
    #[serde(default)]
    pub providers: IndexMap<String, ProviderConfig>,
    /// Health classification thresholds
    #[serde(default)]
    pub health: HealthMonitorConfig,
    /// Routing and optimizer tuning
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Live update delivery
    #[serde(default)]
    pub events: EventsConfig,
    /// Provider test calls
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Chains seeded at startup
    #[serde(default)]
    pub chains: Vec<ChainSeed>,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
