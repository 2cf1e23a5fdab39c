//! Per-request provider selection
//!
//! Selection is an in-memory decision over one health snapshot and the
//! stored chain. It never mutates the store and never waits on I/O.

use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use switchyard_core::{FallbackChainConfig, HealthSnapshot, Provider, ProviderStatus};
use switchyard_telemetry::metrics;
use switchyard_telemetry::{Counter, KeyValue};

use crate::error::RoutingError;
use crate::store::ChainStore;

/// Eligibility rules for one decision
#[derive(Debug, Clone, Copy)]
pub struct SelectOptions {
    /// Skip offline providers
    pub exclude_offline: bool,
    /// Also skip degraded providers
    pub strict: bool,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            exclude_offline: true,
            strict: false,
        }
    }
}

impl SelectOptions {
    const fn admits(self, status: ProviderStatus) -> bool {
        match status {
            ProviderStatus::Active => true,
            ProviderStatus::Degraded => !self.strict,
            ProviderStatus::Offline => !self.exclude_offline,
        }
    }
}

/// An eligible chain entry with its share of the eligible weight
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedProvider {
    pub provider: Provider,
    pub weight: u32,
    /// Probability of selection (0 to 1)
    pub share: f64,
}

/// A selected provider and the candidates it was drawn from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub provider: Provider,
    /// Eligible entries in fallback order; always contains `provider`
    pub ranked: Vec<RankedProvider>,
}

/// Picks providers from fallback chains
pub struct RoutingEngine {
    store: Arc<ChainStore>,
    decisions: Counter<u64>,
}

impl RoutingEngine {
    pub fn new(store: Arc<ChainStore>) -> Self {
        Self {
            store,
            decisions: metrics::counter(metrics::ROUTING_DECISION_COUNT),
        }
    }

    /// Pick a provider for one request
    pub fn select_provider(&self, primary: &str, options: SelectOptions) -> Result<Provider, RoutingError> {
        self.select_with_rng(primary, options, &mut rand::rng())
    }

    /// Pick a provider using the given randomness source
    pub fn select_with_rng<R: Rng + ?Sized>(
        &self,
        primary: &str,
        options: SelectOptions,
        rng: &mut R,
    ) -> Result<Provider, RoutingError> {
        self.decide_with_rng(primary, options, rng)
            .map(|decision| decision.provider)
    }

    /// Pick a provider and rank the candidates in one pass
    pub fn decide(&self, primary: &str, options: SelectOptions) -> Result<Decision, RoutingError> {
        self.decide_with_rng(primary, options, &mut rand::rng())
    }

    /// Pick a provider and rank the candidates using the given randomness
    ///
    /// Both come from the same health snapshot, so the chosen provider is
    /// always one of the ranked entries. Weighted random selection over the
    /// eligible entries; if every eligible entry has weight 0, the first
    /// one in fallback order wins.
    pub fn decide_with_rng<R: Rng + ?Sized>(
        &self,
        primary: &str,
        options: SelectOptions,
        rng: &mut R,
    ) -> Result<Decision, RoutingError> {
        let result = self.eligible(primary, options).map(|candidates| {
            let chosen = pick(&candidates, rng);
            let ranked = ranked(candidates);
            Decision {
                provider: ranked[chosen].provider.clone(),
                ranked,
            }
        });

        match &result {
            Ok(decision) => {
                tracing::debug!(
                    primary,
                    provider = %decision.provider.name,
                    status = %decision.provider.status,
                    candidates = decision.ranked.len(),
                    "provider selected"
                );
                self.decisions.add(1, &[KeyValue::new("outcome", "selected")]);
            }
            Err(e) => {
                tracing::warn!(primary, error = %e, "no provider selected");
                let outcome = if e.is_retryable() { "unavailable" } else { "no_chain" };
                self.decisions.add(1, &[KeyValue::new("outcome", outcome)]);
            }
        }

        result
    }

    /// Eligible providers in fallback order with their selection shares
    pub fn rank(&self, primary: &str, options: SelectOptions) -> Result<Vec<RankedProvider>, RoutingError> {
        let candidates = self.eligible(primary, options)?;
        Ok(ranked(candidates))
    }

    pub const fn store(&self) -> &Arc<ChainStore> {
        &self.store
    }

    /// Eligible `(provider, weight)` pairs in fallback order, from one snapshot
    fn eligible(&self, primary: &str, options: SelectOptions) -> Result<Vec<(Provider, u32)>, RoutingError> {
        let chain = self.store.get(primary).ok_or_else(|| RoutingError::ChainNotFound {
            primary: primary.to_owned(),
        })?;

        let snapshot = self.store.monitor().snapshot();
        let candidates = eligible_entries(&chain, &snapshot, options);

        if candidates.is_empty() {
            return Err(RoutingError::AllProvidersUnavailable {
                primary: primary.to_owned(),
            });
        }

        Ok(candidates)
    }
}

impl std::fmt::Debug for RoutingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingEngine").field("store", &self.store).finish_non_exhaustive()
    }
}

/// Index of the weighted random pick among non-empty candidates
fn pick<R: Rng + ?Sized>(candidates: &[(Provider, u32)], rng: &mut R) -> usize {
    let total: u32 = candidates.iter().map(|(_, weight)| weight).sum();
    if total == 0 {
        return 0;
    }

    let mut roll = rng.random_range(0..total);
    candidates
        .iter()
        .position(|(_, weight)| {
            if roll < *weight {
                true
            } else {
                roll -= weight;
                false
            }
        })
        .unwrap_or(0)
}

fn ranked(candidates: Vec<(Provider, u32)>) -> Vec<RankedProvider> {
    let total: u32 = candidates.iter().map(|(_, weight)| weight).sum();

    candidates
        .into_iter()
        .enumerate()
        .map(|(position, (provider, weight))| {
            let share = if total > 0 {
                f64::from(weight) / f64::from(total)
            } else if position == 0 {
                // zero-weight chains route to the first eligible entry
                1.0
            } else {
                0.0
            };
            RankedProvider {
                provider,
                weight,
                share,
            }
        })
        .collect()
}

/// Entries whose provider is known and admitted by the options
fn eligible_entries(
    chain: &FallbackChainConfig,
    snapshot: &HealthSnapshot,
    options: SelectOptions,
) -> Vec<(Provider, u32)> {
    chain
        .entries
        .iter()
        .filter_map(|entry| {
            let provider = snapshot.get(&entry.provider)?;
            options
                .admits(provider.status)
                .then(|| (provider.clone(), entry.weight))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use switchyard_config::HealthMonitorConfig;
    use switchyard_core::{ChainEntry, RoutingStrategy};
    use switchyard_health::{HealthMonitor, Outcome};

    use super::*;
    use crate::store::SaveOptions;

    struct Fixture {
        monitor: Arc<HealthMonitor>,
        engine: RoutingEngine,
    }

    impl Fixture {
        fn new(entries: Vec<ChainEntry>) -> Self {
            let monitor = HealthMonitor::new(HealthMonitorConfig {
                offline_consecutive_failures: 3,
                ..HealthMonitorConfig::default()
            });
            for name in ["a", "b", "c"] {
                monitor.register_provider(name, 0.01, None);
            }
            let monitor = Arc::new(monitor);

            let store = ChainStore::new(Arc::clone(&monitor));
            store
                .validate_and_save(
                    FallbackChainConfig::new("a", entries, RoutingStrategy::Balanced),
                    SaveOptions::default(),
                )
                .unwrap();

            Self {
                monitor,
                engine: RoutingEngine::new(Arc::new(store)),
            }
        }

        fn take_offline(&self, provider: &str) {
            for _ in 0..3 {
                self.monitor.record_outcome(provider, Outcome::failure(10.0));
            }
        }

        fn degrade(&self, provider: &str) {
            self.monitor.record_outcome(provider, Outcome::success(10.0));
            self.monitor.record_outcome(provider, Outcome::failure(10.0));
        }

        fn recover(&self, provider: &str) {
            for _ in 0..20 {
                self.monitor.record_outcome(provider, Outcome::success(10.0));
            }
        }

        fn tally(&self, options: SelectOptions, rounds: usize) -> HashMap<String, usize> {
            let mut rng = StdRng::seed_from_u64(7);
            let mut counts = HashMap::new();
            for _ in 0..rounds {
                let provider = self.engine.select_with_rng("a", options, &mut rng).unwrap();
                *counts.entry(provider.name).or_default() += 1;
            }
            counts
        }
    }

    fn two_entry_chain() -> Vec<ChainEntry> {
        vec![ChainEntry::primary("a", 70), ChainEntry::fallback("b", 30)]
    }

    #[test]
    fn selection_follows_weights() {
        let fixture = Fixture::new(two_entry_chain());
        let counts = fixture.tally(SelectOptions::default(), 2000);

        let a = counts["a"];
        let b = counts["b"];
        assert_eq!(a + b, 2000);
        assert!(a > b);
        assert!((1200..1600).contains(&a), "a selected {a} times");
    }

    #[test]
    fn offline_primary_routes_only_to_fallback() {
        let fixture = Fixture::new(two_entry_chain());
        fixture.take_offline("a");

        let counts = fixture.tally(SelectOptions::default(), 500);
        assert_eq!(counts.get("a"), None);
        assert_eq!(counts["b"], 500);

        fixture.recover("a");
        let counts = fixture.tally(SelectOptions::default(), 500);
        assert!(counts.get("a").copied().unwrap_or(0) > 0);
    }

    #[test]
    fn all_offline_is_an_error() {
        let fixture = Fixture::new(two_entry_chain());
        fixture.take_offline("a");
        fixture.take_offline("b");

        let err = fixture
            .engine
            .select_provider("a", SelectOptions::default())
            .unwrap_err();
        assert_eq!(err, RoutingError::AllProvidersUnavailable {
            primary: "a".to_owned()
        });
        assert!(err.is_retryable());
    }

    #[test]
    fn offline_allowed_when_not_excluded() {
        let fixture = Fixture::new(two_entry_chain());
        fixture.take_offline("a");
        fixture.take_offline("b");

        let options = SelectOptions {
            exclude_offline: false,
            strict: false,
        };
        assert!(fixture.engine.select_provider("a", options).is_ok());
    }

    #[test]
    fn strict_mode_skips_degraded() {
        let fixture = Fixture::new(two_entry_chain());
        fixture.degrade("a");

        let strict = SelectOptions {
            strict: true,
            ..SelectOptions::default()
        };
        assert_eq!(fixture.tally(strict, 200)["b"], 200);

        let relaxed = fixture.tally(SelectOptions::default(), 200);
        assert!(relaxed.contains_key("a"));
    }

    #[test]
    fn zero_weight_routes_to_first_eligible() {
        let fixture = Fixture::new(vec![
            ChainEntry::primary("a", 100),
            ChainEntry::fallback("b", 0),
            ChainEntry::fallback("c", 0),
        ]);
        fixture.take_offline("a");

        let counts = fixture.tally(SelectOptions::default(), 50);
        assert_eq!(counts["b"], 50);
    }

    #[test]
    fn missing_chain_is_not_found() {
        let fixture = Fixture::new(two_entry_chain());
        let err = fixture
            .engine
            .select_provider("b", SelectOptions::default())
            .unwrap_err();
        assert!(matches!(err, RoutingError::ChainNotFound { .. }));
    }

    #[test]
    fn rank_lists_eligible_in_fallback_order() {
        let fixture = Fixture::new(vec![
            ChainEntry::primary("a", 50),
            ChainEntry::fallback("b", 30),
            ChainEntry::fallback("c", 20),
        ]);
        fixture.take_offline("b");

        let ranked = fixture.engine.rank("a", SelectOptions::default()).unwrap();
        let names: Vec<&str> = ranked.iter().map(|r| r.provider.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert!((ranked[0].share - 50.0 / 70.0).abs() < 1e-9);
        assert!((ranked.iter().map(|r| r.share).sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn decision_picks_from_its_own_ranking() {
        let fixture = Fixture::new(vec![
            ChainEntry::primary("a", 50),
            ChainEntry::fallback("b", 30),
            ChainEntry::fallback("c", 20),
        ]);
        fixture.take_offline("a");

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let decision = fixture
                .engine
                .decide_with_rng("a", SelectOptions::default(), &mut rng)
                .unwrap();
            let names: Vec<&str> = decision.ranked.iter().map(|r| r.provider.name.as_str()).collect();
            assert_eq!(names, vec!["b", "c"]);
            assert!(names.contains(&decision.provider.name.as_str()));
        }
    }

    #[test]
    fn decision_reports_unavailable_instead_of_empty_ranking() {
        let fixture = Fixture::new(two_entry_chain());
        fixture.take_offline("a");
        fixture.take_offline("b");

        let err = fixture.engine.decide("a", SelectOptions::default()).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn selection_does_not_mutate_store() {
        let fixture = Fixture::new(two_entry_chain());
        let before = fixture.engine.store().get("a").unwrap();
        fixture.tally(SelectOptions::default(), 100);
        assert_eq!(fixture.engine.store().get("a").unwrap(), before);
    }
}
