//! Lightweight calls that check whether a provider answers
//!
//! Probes speak the OpenAI-compatible wire format: a list-models ping by
//! default, or a one-token completion when a probe model is configured.

use async_trait::async_trait;
use dashmap::DashMap;
use indexmap::IndexMap;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use switchyard_config::ProviderConfig;

use crate::error::HealthError;

/// Something that can test a provider end to end
#[async_trait]
pub trait Prober: Send + Sync {
    /// Whether the provider has a probe endpoint
    fn can_probe(&self, provider: &str) -> bool;

    /// Every provider this prober can reach
    fn probe_targets(&self) -> Vec<String>;

    /// Make a provider added at runtime reachable
    ///
    /// Returns `true` when the provider now has an endpoint. Probers with a
    /// fixed target set ignore the call.
    fn add_endpoint(&self, _provider: &str, _config: &ProviderConfig) -> bool {
        false
    }

    /// Issue a single probe call
    ///
    /// Time bounds are enforced by the caller.
    async fn probe(&self, provider: &str, sample_message: &str) -> Result<(), HealthError>;
}

#[derive(Debug, Clone)]
struct ProbeEndpoint {
    base_url: String,
    api_key: Option<SecretString>,
    model: Option<String>,
}

impl ProbeEndpoint {
    fn from_config(config: &ProviderConfig) -> Option<Self> {
        let base_url = config.base_url.as_ref()?;
        Some(Self {
            base_url: base_url.as_str().trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.probe_model.clone(),
        })
    }
}

/// Prober for OpenAI-compatible HTTP endpoints
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    endpoints: DashMap<String, ProbeEndpoint>,
}

impl HttpProber {
    /// Build from the provider catalog, keeping providers with a base URL
    pub fn from_config(providers: &IndexMap<String, ProviderConfig>) -> Self {
        let endpoints = providers
            .iter()
            .filter_map(|(name, config)| Some((name.clone(), ProbeEndpoint::from_config(config)?)))
            .collect();

        Self {
            client: Client::new(),
            endpoints,
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    fn can_probe(&self, provider: &str) -> bool {
        self.endpoints.contains_key(provider)
    }

    fn probe_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self.endpoints.iter().map(|entry| entry.key().clone()).collect();
        targets.sort();
        targets
    }

    fn add_endpoint(&self, provider: &str, config: &ProviderConfig) -> bool {
        let Some(endpoint) = ProbeEndpoint::from_config(config) else {
            return false;
        };
        tracing::debug!(provider, base_url = %endpoint.base_url, "probe endpoint added");
        self.endpoints.insert(provider.to_owned(), endpoint);
        true
    }

    async fn probe(&self, provider: &str, sample_message: &str) -> Result<(), HealthError> {
        // Cloned out so no map shard stays locked across the request
        let endpoint = self
            .endpoints
            .get(provider)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| HealthError::ProbeUnavailable {
                provider: provider.to_owned(),
            })?;

        let mut builder = match &endpoint.model {
            Some(model) => self
                .client
                .post(format!("{}/chat/completions", endpoint.base_url))
                .json(&json!({
                    "model": model,
                    "messages": [{"role": "user", "content": sample_message}],
                    "max_tokens": 1,
                })),
            None => self.client.get(format!("{}/models", endpoint.base_url)),
        };

        if let Some(api_key) = &endpoint.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| HealthError::ProbeFailed(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(HealthError::ProbeFailed(format!("status {}", response.status())));
        }

        tracing::debug!(provider, status = %response.status(), "probe succeeded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> IndexMap<String, ProviderConfig> {
        let mut providers = IndexMap::new();
        providers.insert("local".to_owned(), ProviderConfig {
            base_url: Some("http://127.0.0.1:9/v1/".parse().unwrap()),
            ..ProviderConfig::with_cost(0.0)
        });
        providers.insert("catalog-only".to_owned(), ProviderConfig::with_cost(0.01));
        providers
    }

    #[test]
    fn only_providers_with_base_url_are_probeable() {
        let prober = HttpProber::from_config(&catalog());

        assert!(prober.can_probe("local"));
        assert!(!prober.can_probe("catalog-only"));
        assert_eq!(prober.probe_targets(), vec!["local".to_owned()]);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let prober = HttpProber::from_config(&catalog());
        assert_eq!(prober.endpoints.get("local").unwrap().base_url, "http://127.0.0.1:9/v1");
    }

    #[test]
    fn endpoints_can_be_added_at_runtime() {
        let prober = HttpProber::from_config(&catalog());

        assert!(!prober.add_endpoint("no-url", &ProviderConfig::with_cost(0.01)));
        assert!(!prober.can_probe("no-url"));

        let config = ProviderConfig {
            base_url: Some("http://127.0.0.1:9/".parse().unwrap()),
            probe_model: Some("tiny".to_owned()),
            ..ProviderConfig::with_cost(0.01)
        };
        assert!(prober.add_endpoint("late", &config));
        assert!(prober.can_probe("late"));
        assert_eq!(prober.probe_targets(), vec!["late".to_owned(), "local".to_owned()]);
        assert_eq!(prober.endpoints.get("late").unwrap().model.as_deref(), Some("tiny"));
    }

    #[tokio::test]
    async fn probing_unknown_endpoint_is_unavailable() {
        let prober = HttpProber::from_config(&catalog());
        let err = prober.probe("catalog-only", "ping").await.unwrap_err();
        assert!(matches!(err, HealthError::ProbeUnavailable { .. }));
    }
}
