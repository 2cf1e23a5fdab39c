//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use secrecy::SecretString;
use switchyard_client::RoutingStrategy;
use switchyard_config::{ChainSeed, Config, FallbackSeed, ProviderConfig};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Create a new builder with background loops disabled
    pub fn new() -> Self {
        let mut config = Config::default();
        config.server.listen_address = Some(SocketAddr::from(([127, 0, 0, 1], 0)));
        config.health.probe_interval_seconds = 0;
        config.events.analytics_interval_seconds = 0;
        config.events.keep_alive_seconds = 1;
        config.validation.timeout_ms = 2000;
        Self { config }
    }

    /// Add a catalog-only provider
    pub fn with_provider(mut self, name: &str, cost_per_1k_tokens: f64) -> Self {
        self.config
            .providers
            .insert(name.to_owned(), ProviderConfig::with_cost(cost_per_1k_tokens));
        self
    }

    /// Add a provider whose probes hit a mock backend
    pub fn with_mock_provider(mut self, name: &str, cost_per_1k_tokens: f64, base_url: &str) -> Self {
        let mut provider = ProviderConfig::with_cost(cost_per_1k_tokens);
        provider.base_url = Some(base_url.parse().expect("valid URL"));
        provider.api_key = Some(SecretString::from("test-key"));
        self.config.providers.insert(name.to_owned(), provider);
        self
    }

    /// Seed a chain at startup
    pub fn with_chain(mut self, primary: &str, fallbacks: &[(&str, u32)], strategy: RoutingStrategy) -> Self {
        self.config.chains.push(ChainSeed {
            primary: primary.to_owned(),
            primary_weight: 50,
            fallbacks: fallbacks
                .iter()
                .map(|(provider, weight)| FallbackSeed {
                    provider: (*provider).to_owned(),
                    weight: *weight,
                })
                .collect(),
            strategy,
        });
        self
    }

    /// Consecutive failures that take a provider offline
    pub fn with_offline_threshold(mut self, failures: u32) -> Self {
        self.config.health.offline_consecutive_failures = failures;
        self
    }

    /// Seconds a failure streak may last before the provider is offline
    pub fn with_staleness(mut self, seconds: u64) -> Self {
        self.config.health.staleness_seconds = seconds;
        self
    }

    /// Cadence of the clock-driven health refresh
    pub fn with_refresh_interval(mut self, seconds: u64) -> Self {
        self.config.health.refresh_interval_seconds = seconds;
        self
    }

    /// Enable background probing
    pub fn with_probe_interval(mut self, seconds: u64) -> Self {
        self.config.health.probe_interval_seconds = seconds;
        self
    }

    /// Enable periodic analytics broadcasts
    pub fn with_analytics_interval(mut self, seconds: u64) -> Self {
        self.config.events.analytics_interval_seconds = seconds;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
