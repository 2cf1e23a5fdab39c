//! Rolling provider health with snapshot publication
//!
//! Each provider's record sits behind its own `DashMap` entry lock, so
//! outcomes for one provider apply in arrival order while different
//! providers update independently. After every change the monitor swaps
//! in a fresh [`HealthSnapshot`]; readers never see a half-applied update.

use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use switchyard_config::{HealthMonitorConfig, ProviderConfig};
use switchyard_core::{HealthSnapshot, Provider, ProviderStatus, unix_millis};
use switchyard_telemetry::metrics;
use switchyard_telemetry::{Counter, KeyValue};

use crate::outcome::Outcome;

/// Receives provider status transitions
///
/// Called while the provider's record is locked, so transitions for a
/// single provider arrive in order. Implementations must not block or
/// call back into the monitor.
pub trait HealthObserver: Send + Sync {
    fn provider_status_changed(&self, provider: &Provider, previous: ProviderStatus);
}

/// Mutable bookkeeping behind one provider's public view
#[derive(Debug, Clone)]
struct ProviderRecord {
    view: Provider,
    /// Unix millis of the first failure in the current failure streak
    failing_since: Option<u64>,
}

impl ProviderRecord {
    const fn new(view: Provider) -> Self {
        Self {
            view,
            failing_since: None,
        }
    }
}

/// Tracks per-provider health from call outcomes and probes
pub struct HealthMonitor {
    records: DashMap<String, ProviderRecord>,
    published: ArcSwap<HealthSnapshot>,
    config: HealthMonitorConfig,
    observer: Option<Arc<dyn HealthObserver>>,
    outcomes: Counter<u64>,
    dropped: Counter<u64>,
}

impl HealthMonitor {
    /// Create a monitor with no known providers
    pub fn new(config: HealthMonitorConfig) -> Self {
        Self {
            records: DashMap::new(),
            published: ArcSwap::from_pointee(HealthSnapshot::default()),
            config,
            observer: None,
            outcomes: metrics::counter(metrics::HEALTH_OUTCOME_COUNT),
            dropped: metrics::counter(metrics::HEALTH_OUTCOME_DROPPED),
        }
    }

    /// Create a monitor seeded with the configured provider catalog
    pub fn from_catalog<'a>(
        config: HealthMonitorConfig,
        providers: impl IntoIterator<Item = (&'a String, &'a ProviderConfig)>,
    ) -> Self {
        let monitor = Self::new(config);
        for (name, provider) in providers {
            monitor.register_provider(name, provider.cost_per_1k_tokens, provider.rate_limit_rpm);
        }
        monitor
    }

    /// Attach the observer notified on status transitions
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn HealthObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Add a provider to the catalog
    ///
    /// Returns `false` if the provider is already known; its record is
    /// left untouched.
    pub fn register_provider(&self, name: &str, cost_per_1k_tokens: f64, rate_limit_rpm: Option<u32>) -> bool {
        let Entry::Vacant(slot) = self.records.entry(name.to_owned()) else {
            return false;
        };

        let view = Provider::new(name, cost_per_1k_tokens).with_rate_limit(rate_limit_rpm);
        let record = slot.insert(ProviderRecord::new(view));
        self.publish(&record.view);

        tracing::info!(provider = %name, cost_per_1k_tokens, "provider registered");
        true
    }

    /// Ingest the outcome of one call
    ///
    /// Malformed signals and unknown providers are logged and dropped;
    /// this never fails toward the caller. Returns the updated view when
    /// the outcome was applied.
    pub fn record_outcome(&self, provider: &str, outcome: Outcome) -> Option<Provider> {
        if let Some(defect) = outcome.defect() {
            tracing::warn!(provider, defect, ?outcome, "dropping malformed outcome signal");
            self.dropped.add(1, &[KeyValue::new("reason", "malformed")]);
            return None;
        }

        let Some(mut record) = self.records.get_mut(provider) else {
            tracing::warn!(provider, "dropping outcome for unknown provider");
            self.dropped.add(1, &[KeyValue::new("reason", "unknown_provider")]);
            return None;
        };

        let now = unix_millis();
        let previous = record.view.status;
        self.apply(&mut record, outcome, now);
        record.view.status = classify(&record.view, record.failing_since, &self.config, now);

        self.publish(&record.view);
        if record.view.status != previous {
            self.notify(&record.view, previous);
        }

        self.outcomes.add(1, &[KeyValue::new("success", outcome.success)]);
        Some(record.view.clone())
    }

    /// Re-classify every provider against the clock
    ///
    /// Catches staleness for providers that stopped receiving signals.
    /// Returns the providers whose status changed.
    pub fn refresh(&self) -> Vec<Provider> {
        self.refresh_at(unix_millis())
    }

    /// Re-classify every provider as of `now` (unix millis)
    pub fn refresh_at(&self, now: u64) -> Vec<Provider> {
        let mut changed = Vec::new();

        for mut record in self.records.iter_mut() {
            let previous = record.view.status;
            let status = classify(&record.view, record.failing_since, &self.config, now);
            if status == previous {
                continue;
            }

            record.view.status = status;
            self.publish(&record.view);
            self.notify(&record.view, previous);
            changed.push(record.view.clone());
        }

        changed
    }

    /// Current status of a provider, evaluated now
    pub fn classify(&self, provider: &str) -> Option<ProviderStatus> {
        let record = self.records.get(provider)?;
        Some(classify(&record.view, record.failing_since, &self.config, unix_millis()))
    }

    /// Immutable view of every provider
    pub fn snapshot(&self) -> Arc<HealthSnapshot> {
        self.published.load_full()
    }

    /// Published view of a single provider
    pub fn provider(&self, name: &str) -> Option<Provider> {
        self.published.load().get(name).cloned()
    }

    pub fn contains(&self, provider: &str) -> bool {
        self.records.contains_key(provider)
    }

    pub const fn config(&self) -> &HealthMonitorConfig {
        &self.config
    }

    fn apply(&self, record: &mut ProviderRecord, outcome: Outcome, now: u64) {
        let view = &mut record.view;
        let first_sample = view.total_requests == 0;

        view.total_requests += 1;
        view.total_cost += outcome.cost_incurred;

        let sample = if outcome.success { 100.0 } else { 0.0 };
        view.success_rate = ewma(view.success_rate, sample, self.config.success_rate_alpha).clamp(0.0, 100.0);

        view.avg_latency_ms = if first_sample {
            outcome.latency_ms
        } else {
            ewma(view.avg_latency_ms, outcome.latency_ms, self.config.latency_alpha)
        };

        if outcome.success {
            view.consecutive_failures = 0;
            view.last_success_timestamp = Some(now);
            record.failing_since = None;
        } else {
            view.error_count += 1;
            view.consecutive_failures = view.consecutive_failures.saturating_add(1);
            if record.failing_since.is_none() {
                record.failing_since = Some(now);
            }
        }
    }

    /// Swap in a snapshot containing the provider's latest view
    fn publish(&self, view: &Provider) {
        self.published.rcu(|current| {
            let mut next = HealthSnapshot::clone(current);
            next.taken_at = unix_millis();
            next.providers.insert(view.name.clone(), view.clone());
            next
        });
    }

    fn notify(&self, view: &Provider, previous: ProviderStatus) {
        match view.status {
            ProviderStatus::Active => tracing::info!(
                provider = %view.name,
                %previous,
                "provider recovered"
            ),
            status => tracing::warn!(
                provider = %view.name,
                %previous,
                %status,
                success_rate = view.success_rate,
                avg_latency_ms = view.avg_latency_ms,
                consecutive_failures = view.consecutive_failures,
                "provider health changed"
            ),
        }

        if let Some(observer) = &self.observer {
            observer.provider_status_changed(view, previous);
        }
    }
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("providers", &self.records.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Classify a provider from its metrics
///
/// - `offline`: the failure streak reached the threshold, or it has
///   lasted the whole staleness window without a success
/// - `degraded`: success rate below the threshold, or average latency
///   above the SLA ceiling
/// - `active`: otherwise, including providers never observed
pub fn classify(
    provider: &Provider,
    failing_since: Option<u64>,
    config: &HealthMonitorConfig,
    now: u64,
) -> ProviderStatus {
    if provider.total_requests == 0 {
        return ProviderStatus::Active;
    }

    if provider.consecutive_failures >= config.offline_consecutive_failures {
        return ProviderStatus::Offline;
    }

    let staleness_ms = config.staleness_seconds.saturating_mul(1000);
    if let Some(since) = failing_since
        && now.saturating_sub(since) >= staleness_ms
    {
        return ProviderStatus::Offline;
    }

    if provider.success_rate < config.degraded_success_rate || provider.avg_latency_ms > config.latency_ceiling_ms() {
        return ProviderStatus::Degraded;
    }

    ProviderStatus::Active
}

fn ewma(current: f64, sample: f64, alpha: f64) -> f64 {
    alpha.mul_add(sample, (1.0 - alpha) * current)
}
