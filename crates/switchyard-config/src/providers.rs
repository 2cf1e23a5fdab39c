use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Catalog and connection data for a single model provider
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// OpenAI-compatible base URL used for probes
    #[serde(default)]
    pub base_url: Option<Url>,
    /// API key for probe authentication
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Catalog cost in USD per 1k tokens
    #[serde(default)]
    pub cost_per_1k_tokens: f64,
    /// Catalog rate limit in requests per minute
    #[serde(default)]
    pub rate_limit_rpm: Option<u32>,
    /// Model used for completion probes; list-models ping when unset
    #[serde(default)]
    pub probe_model: Option<String>,
}

impl ProviderConfig {
    /// A provider with only catalog cost set
    pub const fn with_cost(cost_per_1k_tokens: f64) -> Self {
        Self {
            base_url: None,
            api_key: None,
            cost_per_1k_tokens,
            rate_limit_rpm: None,
            probe_model: None,
        }
    }
}
