use std::sync::{Arc, OnceLock};
use std::time::Duration;

use anyhow::Context;
use switchyard_config::Config;
use switchyard_events::UpdateBroadcaster;
use switchyard_health::{HealthMonitor, HttpProber, Prober, ValidationService, spawn_probe_loop};
use switchyard_routing::{ChainStore, RoutingEngine, SaveOptions, SelectOptions};
use tokio_util::sync::CancellationToken;

/// Cadence and lifetime of the background probe loops
#[derive(Debug, Clone)]
pub struct ProbeSchedule {
    pub interval: Duration,
    pub shutdown: CancellationToken,
}

/// Engine components shared by every handler and background task
pub struct AppState {
    pub monitor: Arc<HealthMonitor>,
    pub store: Arc<ChainStore>,
    pub engine: Arc<RoutingEngine>,
    pub validation: Arc<ValidationService>,
    pub broadcaster: Arc<UpdateBroadcaster>,
    /// Strict mode applied when a route request does not say
    pub strict_default: bool,
    pub optimizer: switchyard_config::OptimizerCoefficients,
    pub keep_alive: Duration,
    /// Set once background probing starts
    pub probe_schedule: OnceLock<ProbeSchedule>,
}

impl AppState {
    /// Wire the engine from configuration, probing over HTTP
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let prober: Arc<dyn Prober> = Arc::new(HttpProber::from_config(&config.providers));
        Self::with_prober(config, prober)
    }

    /// Wire the engine with a custom prober
    ///
    /// Chains from the configuration are saved through the regular
    /// validation path with the offline-primary override set.
    pub fn with_prober(config: &Config, prober: Arc<dyn Prober>) -> anyhow::Result<Self> {
        let broadcaster = Arc::new(UpdateBroadcaster::new(config.events.queue_capacity));

        let monitor = Arc::new(
            HealthMonitor::from_catalog(config.health.clone(), &config.providers).with_observer(broadcaster.clone()),
        );

        let validation = Arc::new(ValidationService::new(
            Arc::clone(&monitor),
            prober,
            &config.validation,
        ));

        let store = Arc::new(ChainStore::new(Arc::clone(&monitor)).with_observer(broadcaster.clone()));
        for seed in &config.chains {
            store
                .validate_and_save(seed.to_chain(), SaveOptions {
                    allow_offline_primary: true,
                })
                .with_context(|| format!("invalid chain for primary {}", seed.primary))?;
        }

        let engine = Arc::new(RoutingEngine::new(Arc::clone(&store)));

        tracing::info!(
            providers = monitor.snapshot().len(),
            chains = store.len(),
            "routing engine initialized"
        );

        Ok(Self {
            monitor,
            store,
            engine,
            validation,
            broadcaster,
            strict_default: config.routing.strict,
            optimizer: config.routing.coefficients,
            keep_alive: Duration::from_secs(config.events.keep_alive_seconds.max(1)),
            probe_schedule: OnceLock::new(),
        })
    }

    /// Start probing a provider onboarded after startup
    ///
    /// No-op until background probing runs, or when the provider has no
    /// probe endpoint.
    pub fn schedule_probes(&self, provider: &str) -> bool {
        let Some(schedule) = self.probe_schedule.get() else {
            return false;
        };
        if !self.validation.can_test(provider) {
            return false;
        }

        // Detached; the loop exits with the server's shutdown token
        drop(spawn_probe_loop(
            Arc::clone(&self.validation),
            provider.to_owned(),
            schedule.interval,
            schedule.shutdown.clone(),
        ));
        true
    }

    /// Selection options with the configured strict default
    pub const fn select_options(&self, exclude_offline: bool, strict: Option<bool>) -> SelectOptions {
        SelectOptions {
            exclude_offline,
            strict: match strict {
                Some(strict) => strict,
                None => self.strict_default,
            },
        }
    }
}
