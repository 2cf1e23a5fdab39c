use switchyard_core::{ChainAnalytics, EntryAnalytics, FallbackChainConfig, HealthSnapshot, ProviderStatus};

/// Weighted expectations of a chain under the given health snapshot
///
/// Each expectation is the weight-averaged value across entries. Entries
/// missing from the snapshot are reported offline with zeroed metrics.
/// A chain whose weights sum to zero averages entries equally.
pub fn chain_analytics(chain: &FallbackChainConfig, snapshot: &HealthSnapshot) -> ChainAnalytics {
    let entries: Vec<EntryAnalytics> = chain
        .entries
        .iter()
        .map(|entry| match snapshot.get(&entry.provider) {
            Some(provider) => EntryAnalytics {
                provider: entry.provider.clone(),
                weight: entry.weight,
                status: provider.status,
                cost_per_1k_tokens: provider.cost_per_1k_tokens,
                avg_latency_ms: provider.avg_latency_ms,
                success_rate: provider.success_rate,
            },
            None => EntryAnalytics {
                provider: entry.provider.clone(),
                weight: entry.weight,
                status: ProviderStatus::Offline,
                cost_per_1k_tokens: 0.0,
                avg_latency_ms: 0.0,
                success_rate: 0.0,
            },
        })
        .collect();

    let total_weight: f64 = entries.iter().map(|e| f64::from(e.weight)).sum();
    let share = |entry: &EntryAnalytics| {
        if total_weight > 0.0 {
            f64::from(entry.weight) / total_weight
        } else {
            1.0 / usize_to_f64(entries.len())
        }
    };
    let expect = |metric: fn(&EntryAnalytics) -> f64| entries.iter().map(|e| share(e) * metric(e)).sum::<f64>();

    ChainAnalytics {
        primary_provider: chain.primary_provider.clone(),
        expected_cost_per_1k_tokens: expect(|e| e.cost_per_1k_tokens),
        expected_latency_ms: expect(|e| e.avg_latency_ms),
        expected_success_rate: expect(|e| e.success_rate),
        entries,
    }
}

#[allow(clippy::cast_precision_loss)]
const fn usize_to_f64(value: usize) -> f64 {
    value as f64
}
