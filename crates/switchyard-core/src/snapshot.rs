use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::provider::{Provider, ProviderStatus};

/// Consistent, point-in-time view of every known provider
///
/// Keyed by provider identity so iteration order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    /// Unix milliseconds when this view was published
    pub taken_at: u64,
    pub providers: BTreeMap<String, Provider>,
}

impl HealthSnapshot {
    /// Look up a provider by name
    pub fn get(&self, name: &str) -> Option<&Provider> {
        self.providers.get(name)
    }

    /// Current status of a provider
    pub fn status(&self, name: &str) -> Option<ProviderStatus> {
        self.providers.get(name).map(|p| p.status)
    }

    /// Whether the provider is known
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Providers in identity order
    pub fn iter(&self) -> impl Iterator<Item = &Provider> {
        self.providers.values()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl FromIterator<Provider> for HealthSnapshot {
    fn from_iter<I: IntoIterator<Item = Provider>>(iter: I) -> Self {
        Self {
            taken_at: crate::unix_millis(),
            providers: iter.into_iter().map(|p| (p.name.clone(), p)).collect(),
        }
    }
}
