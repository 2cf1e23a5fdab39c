//! Periodic re-classification of every known provider

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::monitor::HealthMonitor;

/// Re-classify the whole catalog on a fixed interval
///
/// Providers that stop receiving outcomes are only caught by the clock,
/// so this loop runs for every provider whether or not it can be tested.
/// Exits when `shutdown` is cancelled.
pub fn spawn_refresh_loop(
    monitor: Arc<HealthMonitor>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let changed = monitor.refresh();
                    if !changed.is_empty() {
                        tracing::debug!(changed = changed.len(), "health refresh reclassified providers");
                    }
                }
            }
        }

        tracing::debug!("health refresh loop stopped");
    })
}

#[cfg(test)]
mod tests {
    use switchyard_config::HealthMonitorConfig;
    use switchyard_core::ProviderStatus;

    use super::*;
    use crate::outcome::Outcome;

    #[tokio::test]
    async fn loop_takes_silent_failing_provider_offline() {
        let monitor = Arc::new(HealthMonitor::new(HealthMonitorConfig {
            staleness_seconds: 1,
            ..HealthMonitorConfig::default()
        }));
        monitor.register_provider("catalog-only", 0.01, None);
        monitor.register_provider("quiet", 0.01, None);

        let view = monitor.record_outcome("catalog-only", Outcome::failure(10.0)).unwrap();
        assert_eq!(view.status, ProviderStatus::Degraded);

        let shutdown = CancellationToken::new();
        let handle = spawn_refresh_loop(Arc::clone(&monitor), Duration::from_millis(20), shutdown.clone());

        let offline = tokio::time::timeout(Duration::from_secs(5), async {
            while monitor.snapshot().status("catalog-only") != Some(ProviderStatus::Offline) {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await;

        shutdown.cancel();
        handle.await.unwrap();

        assert!(offline.is_ok(), "stale provider never went offline");
        assert_eq!(monitor.snapshot().status("quiet"), Some(ProviderStatus::Active));
    }
}
