//! Provider test calls and background probe loops

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use switchyard_config::{ProviderConfig, ValidationConfig};
use switchyard_core::Provider;
use switchyard_telemetry::metrics;
use switchyard_telemetry::{Histogram, KeyValue};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::HealthError;
use crate::monitor::HealthMonitor;
use crate::outcome::Outcome;
use crate::probe::Prober;

/// Result of a single provider test call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub healthy: bool,
    pub latency_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs bounded test calls and feeds their outcomes to the monitor
pub struct ValidationService {
    monitor: Arc<HealthMonitor>,
    prober: Arc<dyn Prober>,
    timeout: Duration,
    sample_message: String,
    probe_duration: Histogram<f64>,
}

impl ValidationService {
    pub fn new(monitor: Arc<HealthMonitor>, prober: Arc<dyn Prober>, config: &ValidationConfig) -> Self {
        Self {
            monitor,
            prober,
            timeout: config.timeout(),
            sample_message: config.sample_message.clone(),
            probe_duration: metrics::duration_histogram(metrics::HEALTH_PROBE_DURATION),
        }
    }

    /// Test a provider now
    ///
    /// A failed or timed-out call is a result, not an error: it is recorded
    /// like any other failure and reported with `healthy: false`. Errors are
    /// reserved for providers that are unknown or cannot be probed.
    pub async fn test_provider(&self, provider: &str, sample_message: Option<&str>) -> Result<TestResult, HealthError> {
        if !self.monitor.contains(provider) {
            return Err(HealthError::UnknownProvider {
                provider: provider.to_owned(),
            });
        }

        if !self.prober.can_probe(provider) {
            return Err(HealthError::ProbeUnavailable {
                provider: provider.to_owned(),
            });
        }

        let sample = sample_message.unwrap_or(&self.sample_message);
        let start = Instant::now();

        let error = match tokio::time::timeout(self.timeout, self.prober.probe(provider, sample)).await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(_) => Some(HealthError::ProbeTimeout {
                provider: provider.to_owned(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        };

        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        metrics::record_duration(&self.probe_duration, start, &[
            KeyValue::new("provider", provider.to_owned()),
            KeyValue::new("healthy", error.is_none()),
        ]);

        let outcome = if error.is_none() {
            Outcome::success(latency_ms)
        } else {
            Outcome::failure(latency_ms)
        };
        self.monitor.record_outcome(provider, outcome);

        if let Some(e) = &error {
            tracing::warn!(provider, latency_ms, error = %e, "provider test failed");
        } else {
            tracing::debug!(provider, latency_ms, "provider test passed");
        }

        Ok(TestResult {
            healthy: error.is_none(),
            latency_ms,
            error: error.map(|e| e.to_string()),
        })
    }

    /// Add a provider to the running catalog
    ///
    /// The provider starts `active` with no observations. When the config
    /// carries a base URL it becomes testable right away, so onboarding is
    /// a registration followed by [`Self::test_provider`].
    pub fn onboard(&self, name: &str, config: &ProviderConfig) -> Result<Provider, HealthError> {
        if name.trim().is_empty() || name.trim() != name {
            return Err(HealthError::InvalidProvider(format!("name {name:?} is not a provider name")));
        }

        if !config.cost_per_1k_tokens.is_finite() || config.cost_per_1k_tokens < 0.0 {
            return Err(HealthError::InvalidProvider(format!(
                "cost_per_1k_tokens must be a non-negative number, got {}",
                config.cost_per_1k_tokens
            )));
        }

        if !self
            .monitor
            .register_provider(name, config.cost_per_1k_tokens, config.rate_limit_rpm)
        {
            return Err(HealthError::ProviderExists {
                provider: name.to_owned(),
            });
        }

        let probeable = self.prober.add_endpoint(name, config);
        tracing::info!(provider = name, probeable, "provider onboarded");

        self.monitor.provider(name).ok_or_else(|| HealthError::UnknownProvider {
            provider: name.to_owned(),
        })
    }

    pub fn can_test(&self, provider: &str) -> bool {
        self.monitor.contains(provider) && self.prober.can_probe(provider)
    }

    pub fn monitor(&self) -> &Arc<HealthMonitor> {
        &self.monitor
    }

    /// Providers the background loops should probe
    pub fn probe_targets(&self) -> Vec<String> {
        self.prober
            .probe_targets()
            .into_iter()
            .filter(|p| self.monitor.contains(p))
            .collect()
    }
}

impl std::fmt::Debug for ValidationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationService")
            .field("timeout", &self.timeout)
            .field("sample_message", &self.sample_message)
            .finish_non_exhaustive()
    }
}

/// Spawn one probe loop per probeable provider
///
/// Each loop probes on its own interval so a hung provider never delays
/// the others. Loops exit when `shutdown` is cancelled.
pub fn spawn_probe_loops(
    service: Arc<ValidationService>,
    interval: Duration,
    shutdown: CancellationToken,
) -> Vec<JoinHandle<()>> {
    service
        .probe_targets()
        .into_iter()
        .map(|provider| spawn_probe_loop(Arc::clone(&service), provider, interval, shutdown.clone()))
        .collect()
}

/// Spawn the probe loop for a single provider
pub fn spawn_probe_loop(
    service: Arc<ValidationService>,
    provider: String,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                () = shutdown.cancelled() => break,
                result = service.test_provider(&provider, None) => {
                    if let Err(e) = result {
                        tracing::debug!(provider = %provider, error = %e, "probe skipped");
                    }
                }
            }
        }

        tracing::debug!(provider = %provider, "probe loop stopped");
    })
}
