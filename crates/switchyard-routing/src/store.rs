//! Validated fallback chains keyed by primary provider
//!
//! Chains change only through [`ChainStore::validate_and_save`]. Saves
//! are last-write-wins per primary; saves to different primaries do not
//! contend.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use switchyard_core::{ChainAnalytics, FallbackChainConfig, Provider, ProviderStatus};
use switchyard_health::HealthMonitor;

use crate::analytics::chain_analytics;
use crate::error::ValidationError;
use crate::optimizer::{WEIGHT_TOTAL, normalize_entries};

/// Receives saved chains
pub trait ChainObserver: Send + Sync {
    fn chain_saved(&self, chain: &FallbackChainConfig, analytics: &ChainAnalytics);
}

/// Options for a single save
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveOptions {
    /// Save even if the primary is currently offline
    pub allow_offline_primary: bool,
}

/// Holds one fallback chain per primary provider
pub struct ChainStore {
    chains: DashMap<String, Arc<FallbackChainConfig>>,
    monitor: Arc<HealthMonitor>,
    observer: Option<Arc<dyn ChainObserver>>,
}

impl ChainStore {
    pub fn new(monitor: Arc<HealthMonitor>) -> Self {
        Self {
            chains: DashMap::new(),
            monitor,
            observer: None,
        }
    }

    /// Attach the observer notified after each save
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ChainObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The chain configured for a primary
    pub fn get(&self, primary: &str) -> Option<Arc<FallbackChainConfig>> {
        self.chains.get(primary).map(|chain| Arc::clone(&chain))
    }

    /// Every chain, ordered by primary
    pub fn all(&self) -> Vec<Arc<FallbackChainConfig>> {
        let mut chains: Vec<_> = self.chains.iter().map(|chain| Arc::clone(chain.value())).collect();
        chains.sort_by(|a, b| a.primary_provider.cmp(&b.primary_provider));
        chains
    }

    /// Validate a chain and store it
    ///
    /// The primary entry is moved to the front if it was submitted
    /// elsewhere, and weights are normalized to sum to 100. Weights are
    /// never re-optimized here.
    pub fn validate_and_save(
        &self,
        mut config: FallbackChainConfig,
        options: SaveOptions,
    ) -> Result<Arc<FallbackChainConfig>, ValidationError> {
        let primary = config.primary_provider.clone();

        if config.entries.is_empty() {
            return Err(ValidationError::EmptyChain { primary });
        }

        let mut flagged = config.entries.iter().enumerate().filter(|(_, e)| e.is_primary);
        let Some((position, entry)) = flagged.next() else {
            return Err(ValidationError::MissingPrimary { primary });
        };
        if flagged.next().is_some() {
            return Err(ValidationError::MultiplePrimaries { primary });
        }
        if entry.provider != primary {
            return Err(ValidationError::PrimaryMismatch {
                expected: primary,
                found: entry.provider.clone(),
            });
        }

        if position != 0 {
            tracing::debug!(primary = %primary, position, "moving primary entry to the front");
            let entry = config.entries.remove(position);
            config.entries.insert(0, entry);
        }

        let mut seen = HashSet::with_capacity(config.entries.len());
        for entry in &config.entries {
            if !seen.insert(entry.provider.as_str()) {
                return Err(ValidationError::DuplicateProvider {
                    provider: entry.provider.clone(),
                });
            }
        }

        let snapshot = self.monitor.snapshot();
        for entry in &config.entries {
            if !snapshot.contains(&entry.provider) {
                return Err(ValidationError::UnknownProvider {
                    provider: entry.provider.clone(),
                });
            }
            if entry.weight > WEIGHT_TOTAL {
                return Err(ValidationError::WeightOutOfRange {
                    provider: entry.provider.clone(),
                    weight: entry.weight,
                });
            }
        }

        if snapshot.status(&primary) == Some(ProviderStatus::Offline) && !options.allow_offline_primary {
            return Err(ValidationError::PrimaryOfflineWarning { primary });
        }

        normalize_entries(&mut config.entries);

        let saved = Arc::new(config);
        self.chains.insert(primary.clone(), Arc::clone(&saved));

        tracing::info!(
            primary = %primary,
            strategy = %saved.routing_strategy,
            entries = saved.entries.len(),
            "fallback chain saved"
        );

        if let Some(observer) = &self.observer {
            observer.chain_saved(&saved, &chain_analytics(&saved, &snapshot));
        }

        Ok(saved)
    }

    /// Known providers not already in the chain, ordered by identity
    pub fn list_available_providers(&self, chain: &FallbackChainConfig) -> Vec<Provider> {
        self.monitor
            .snapshot()
            .iter()
            .filter(|provider| !chain.contains(&provider.name))
            .cloned()
            .collect()
    }

    pub const fn monitor(&self) -> &Arc<HealthMonitor> {
        &self.monitor
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl std::fmt::Debug for ChainStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainStore")
            .field("chains", &self.chains.len())
            .finish_non_exhaustive()
    }
}
