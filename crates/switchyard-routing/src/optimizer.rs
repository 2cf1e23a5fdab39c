//! Strategy-driven weight distributions
//!
//! Every function here is pure: identical inputs always produce identical
//! weights, and nothing is saved.

use switchyard_config::OptimizerCoefficients;
use switchyard_core::{ChainEntry, FallbackChainConfig, HealthSnapshot, RoutingStrategy};

/// Total that normalized chain weights always sum to
pub const WEIGHT_TOTAL: u32 = 100;

/// Compute entry weights for a chain under a strategy
///
/// `balanced` and `custom` keep the configured weights. The other
/// strategies derive a raw weight per entry from the snapshot, floor it,
/// then normalize to [`WEIGHT_TOTAL`]. Providers missing from the snapshot
/// get the floor weight.
pub fn optimize(
    chain: &FallbackChainConfig,
    strategy: RoutingStrategy,
    snapshot: &HealthSnapshot,
    coefficients: &OptimizerCoefficients,
) -> Vec<ChainEntry> {
    if !strategy.recomputes_weights() {
        return chain.entries.clone();
    }

    let raw: Vec<f64> = chain
        .entries
        .iter()
        .map(|entry| {
            snapshot
                .get(&entry.provider)
                .map_or(coefficients.weight_floor, |provider| match strategy {
                    RoutingStrategy::Cost => (100.0 - provider.cost_per_1k_tokens * coefficients.cost_scale)
                        .max(coefficients.weight_floor),
                    RoutingStrategy::Latency => (100.0 - provider.avg_latency_ms / coefficients.latency_divisor)
                        .max(coefficients.weight_floor),
                    _ => provider.success_rate.max(0.0),
                })
        })
        .collect();

    chain
        .entries
        .iter()
        .zip(normalize(&raw))
        .map(|(entry, weight)| ChainEntry {
            weight,
            ..entry.clone()
        })
        .collect()
}

/// Scale raw weights to integers summing to exactly [`WEIGHT_TOTAL`]
///
/// Each weight is `round(raw / sum * 100)`. The rounding residual is
/// applied to the largest weight (first on ties). Non-positive or
/// non-finite totals fall back to equal shares.
pub fn normalize(raw: &[f64]) -> Vec<u32> {
    if raw.is_empty() {
        return Vec::new();
    }

    let sanitized: Vec<f64> = raw
        .iter()
        .map(|w| if w.is_finite() { w.max(0.0) } else { 0.0 })
        .collect();
    let sum: f64 = sanitized.iter().sum();

    let mut weights: Vec<i64> = if sum > 0.0 {
        sanitized
            .iter()
            .map(|w| round_to_int(w / sum * f64::from(WEIGHT_TOTAL)))
            .collect()
    } else {
        let share = i64::from(WEIGHT_TOTAL) / i64::try_from(raw.len()).unwrap_or(i64::MAX);
        vec![share; raw.len()]
    };

    let mut residual = i64::from(WEIGHT_TOTAL) - weights.iter().sum::<i64>();
    while residual != 0 {
        // Largest weight that can still absorb the residual
        let Some(index) = largest_index(&weights, residual > 0) else {
            break;
        };
        let step = if residual > 0 { residual } else { residual.max(-weights[index]) };
        weights[index] += step;
        residual -= step;
    }

    weights
        .into_iter()
        .map(|w| u32::try_from(w).unwrap_or(0))
        .collect()
}

/// Normalize configured weights on save
///
/// Weights that already sum to [`WEIGHT_TOTAL`] are left untouched so that
/// re-saving an unchanged chain is a no-op.
pub fn normalize_entries(entries: &mut [ChainEntry]) {
    let total: u32 = entries.iter().map(|e| e.weight).sum();
    if total == WEIGHT_TOTAL {
        return;
    }

    let raw: Vec<f64> = entries.iter().map(|e| f64::from(e.weight)).collect();
    for (entry, weight) in entries.iter_mut().zip(normalize(&raw)) {
        entry.weight = weight;
    }
}

fn largest_index(weights: &[i64], growing: bool) -> Option<usize> {
    weights
        .iter()
        .enumerate()
        .filter(|(_, w)| growing || **w > 0)
        // max_by_key returns the last maximum; reverse so ties pick the first
        .rev()
        .max_by_key(|(_, w)| **w)
        .map(|(i, _)| i)
}

#[allow(clippy::cast_possible_truncation)]
fn round_to_int(value: f64) -> i64 {
    value.round() as i64
}

#[cfg(test)]
mod tests {
    use switchyard_core::{Provider, ProviderStatus};

    use super::*;

    fn provider(name: &str, cost: f64, latency: f64, success_rate: f64) -> Provider {
        Provider {
            avg_latency_ms: latency,
            success_rate,
            total_requests: 10,
            ..Provider::new(name, cost)
        }
    }

    fn chain(names: &[&str]) -> FallbackChainConfig {
        let entries = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                if i == 0 {
                    ChainEntry::primary(*name, 50)
                } else {
                    ChainEntry::fallback(*name, 50)
                }
            })
            .collect();
        FallbackChainConfig::new(names[0], entries, RoutingStrategy::Balanced)
    }

    fn weights(entries: &[ChainEntry]) -> Vec<u32> {
        entries.iter().map(|e| e.weight).collect()
    }

    #[test]
    fn cheaper_provider_gets_more_weight() {
        let snapshot: HealthSnapshot = [
            provider("a", 0.03, 500.0, 99.0),
            provider("b", 0.0015, 500.0, 99.0),
        ]
        .into_iter()
        .collect();

        let entries = optimize(
            &chain(&["a", "b"]),
            RoutingStrategy::Cost,
            &snapshot,
            &OptimizerCoefficients::default(),
        );

        // a floors at 10, b scores 85
        assert_eq!(weights(&entries), vec![11, 89]);
        assert!(entries[0].is_primary);
        assert_eq!(entries[1].provider, "b");
    }

    #[test]
    fn faster_provider_gets_more_weight() {
        let snapshot: HealthSnapshot = [
            provider("a", 0.01, 250.0, 99.0),
            provider("b", 0.01, 2500.0, 99.0),
        ]
        .into_iter()
        .collect();

        let entries = optimize(
            &chain(&["a", "b"]),
            RoutingStrategy::Latency,
            &snapshot,
            &OptimizerCoefficients::default(),
        );

        // 95 against 50
        assert_eq!(weights(&entries), vec![66, 34]);
    }

    #[test]
    fn reliability_follows_success_rate_order() {
        let snapshot: HealthSnapshot = [
            provider("a", 0.01, 100.0, 72.0),
            provider("b", 0.01, 100.0, 99.5),
            provider("c", 0.01, 100.0, 85.0),
            provider("d", 0.01, 100.0, 40.0),
        ]
        .into_iter()
        .collect();

        let entries = optimize(
            &chain(&["a", "b", "c", "d"]),
            RoutingStrategy::Reliability,
            &snapshot,
            &OptimizerCoefficients::default(),
        );

        let by_weight = |i: usize, j: usize| entries[i].weight.cmp(&entries[j].weight);
        let by_rate = |i: usize, j: usize| {
            let rate = |k: usize| snapshot.get(&entries[k].provider).unwrap().success_rate;
            rate(i).partial_cmp(&rate(j)).unwrap()
        };
        for i in 0..entries.len() {
            for j in 0..entries.len() {
                if by_rate(i, j).is_gt() {
                    assert!(by_weight(i, j).is_ge());
                }
            }
        }
        assert_eq!(entries.iter().map(|e| e.weight).sum::<u32>(), 100);
    }

    #[test]
    fn optimize_is_deterministic() {
        let snapshot: HealthSnapshot = [
            provider("a", 0.002, 300.0, 97.0),
            provider("b", 0.004, 900.0, 91.0),
            provider("c", 0.006, 1200.0, 88.0),
        ]
        .into_iter()
        .collect();
        let chain = chain(&["a", "b", "c"]);
        let coefficients = OptimizerCoefficients::default();

        for strategy in [RoutingStrategy::Cost, RoutingStrategy::Latency, RoutingStrategy::Reliability] {
            let first = optimize(&chain, strategy, &snapshot, &coefficients);
            let second = optimize(&chain, strategy, &snapshot, &coefficients);
            assert_eq!(first, second);
            assert_eq!(first.iter().map(|e| e.weight).sum::<u32>(), 100);
        }
    }

    #[test]
    fn balanced_and_custom_keep_weights() {
        let mut chain = chain(&["a", "b"]);
        chain.entries[0].weight = 80;
        chain.entries[1].weight = 20;
        let snapshot = HealthSnapshot::default();

        for strategy in [RoutingStrategy::Balanced, RoutingStrategy::Custom] {
            let entries = optimize(&chain, strategy, &snapshot, &OptimizerCoefficients::default());
            assert_eq!(entries, chain.entries);
        }
    }

    #[test]
    fn unknown_provider_gets_floor() {
        let snapshot: HealthSnapshot = [provider("a", 0.0, 100.0, 100.0)].into_iter().collect();

        let entries = optimize(
            &chain(&["a", "ghost"]),
            RoutingStrategy::Cost,
            &snapshot,
            &OptimizerCoefficients::default(),
        );
        // 100 against 10
        assert_eq!(weights(&entries), vec![91, 9]);
    }

    #[test]
    fn coefficients_are_tunable() {
        let snapshot: HealthSnapshot = [
            provider("a", 0.03, 100.0, 100.0),
            provider("b", 0.0015, 100.0, 100.0),
        ]
        .into_iter()
        .collect();
        let coefficients = OptimizerCoefficients {
            cost_scale: 1000.0,
            latency_divisor: 50.0,
            weight_floor: 0.0,
        };

        let entries = optimize(&chain(&["a", "b"]), RoutingStrategy::Cost, &snapshot, &coefficients);
        // 70 against 98.5
        assert_eq!(weights(&entries), vec![42, 58]);
    }

    #[test]
    fn residual_goes_to_largest() {
        assert_eq!(normalize(&[1.0, 1.0, 1.0]), vec![34, 33, 33]);
        assert_eq!(normalize(&[1.0, 2.0, 1.0, 2.0]), vec![17, 33, 17, 33]);
        assert_eq!(normalize(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.0]), vec![15, 17, 17, 17, 17, 17]);
    }

    #[test]
    fn degenerate_inputs_split_evenly() {
        assert_eq!(normalize(&[0.0, 0.0]), vec![50, 50]);
        assert_eq!(normalize(&[f64::NAN, -3.0, 0.0]), vec![34, 33, 33]);
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn normalize_entries_leaves_exact_totals_alone() {
        let mut entries = vec![ChainEntry::primary("a", 70), ChainEntry::fallback("b", 30)];
        normalize_entries(&mut entries);
        assert_eq!(weights(&entries), vec![70, 30]);

        let mut entries = vec![ChainEntry::primary("a", 60), ChainEntry::fallback("b", 60)];
        normalize_entries(&mut entries);
        assert_eq!(weights(&entries), vec![50, 50]);
    }

    #[test]
    fn offline_status_does_not_affect_weights() {
        let mut offline = provider("a", 0.002, 300.0, 97.0);
        offline.status = ProviderStatus::Offline;
        let snapshot: HealthSnapshot = [offline, provider("b", 0.002, 300.0, 97.0)].into_iter().collect();

        let entries = optimize(
            &chain(&["a", "b"]),
            RoutingStrategy::Cost,
            &snapshot,
            &OptimizerCoefficients::default(),
        );
        assert_eq!(weights(&entries), vec![50, 50]);
    }
}
