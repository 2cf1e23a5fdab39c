use serde::Deserialize;
use switchyard_core::{ChainEntry, FallbackChainConfig, RoutingStrategy};

/// A fallback chain declared in the configuration file
///
/// ```toml
/// [[chains]]
/// primary = "openai"
/// strategy = "cost"
/// fallbacks = [{ provider = "anthropic", weight = 30 }]
/// primary_weight = 70
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainSeed {
    pub primary: String,
    #[serde(default = "default_primary_weight")]
    pub primary_weight: u32,
    #[serde(default)]
    pub fallbacks: Vec<FallbackSeed>,
    #[serde(default)]
    pub strategy: RoutingStrategy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackSeed {
    pub provider: String,
    #[serde(default)]
    pub weight: u32,
}

impl ChainSeed {
    /// Build the chain with the primary first
    pub fn to_chain(&self) -> FallbackChainConfig {
        let entries = std::iter::once(ChainEntry::primary(&self.primary, self.primary_weight))
            .chain(
                self.fallbacks
                    .iter()
                    .map(|f| ChainEntry::fallback(&f.provider, f.weight)),
            )
            .collect();

        FallbackChainConfig::new(&self.primary, entries, self.strategy)
    }

    /// Every provider the seed references
    pub fn providers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.fallbacks.iter().map(|f| f.provider.as_str()))
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_primary_weight() -> u32 {
    100
}
