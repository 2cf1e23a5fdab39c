//! Periodic tasks that run alongside the HTTP server

use std::sync::Arc;
use std::time::Duration;

use switchyard_core::UpdateEvent;
use switchyard_events::UpdateBroadcaster;
use switchyard_routing::{ChainStore, chain_analytics};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Periodically publish weighted analytics for every chain
///
/// Health drifts between saves, so dashboards get refreshed
/// expectations on a fixed cadence.
pub fn spawn_analytics_loop(
    store: Arc<ChainStore>,
    broadcaster: Arc<UpdateBroadcaster>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Skip the immediate first tick; saves already published analytics
        ticker.tick().await;

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => publish_analytics(&store, &broadcaster),
            }
        }

        tracing::debug!("analytics loop stopped");
    })
}

/// Publish one `cost_analytics_update` per chain
pub fn publish_analytics(store: &ChainStore, broadcaster: &UpdateBroadcaster) {
    let snapshot = store.monitor().snapshot();
    for chain in store.all() {
        broadcaster.publish(UpdateEvent::CostAnalyticsUpdate(chain_analytics(&chain, &snapshot)));
    }
}
