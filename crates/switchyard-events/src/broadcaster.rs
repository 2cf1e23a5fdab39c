use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use switchyard_core::{ChainAnalytics, FallbackChainConfig, Provider, ProviderStatus, UpdateEvent};
use switchyard_health::HealthObserver;
use switchyard_routing::ChainObserver;
use switchyard_telemetry::metrics;
use switchyard_telemetry::{Counter, KeyValue};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Counters shared between the broadcaster and its subscriptions
struct Shared {
    subscribers: AtomicUsize,
    next_id: AtomicU64,
    dropped: AtomicU64,
    dropped_counter: Counter<u64>,
}

/// Pushes update events to every subscriber
///
/// Each subscriber has its own bounded queue of `capacity` events.
pub struct UpdateBroadcaster {
    sender: broadcast::Sender<UpdateEvent>,
    shared: Arc<Shared>,
}

impl UpdateBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            shared: Arc::new(Shared {
                subscribers: AtomicUsize::new(0),
                next_id: AtomicU64::new(1),
                dropped: AtomicU64::new(0),
                dropped_counter: metrics::counter(metrics::EVENTS_DROPPED),
            }),
        }
    }

    /// Publish an event to all current subscribers
    ///
    /// Never blocks. Returns the number of subscribers the event was
    /// queued for.
    pub fn publish(&self, event: UpdateEvent) -> usize {
        let kind = event.kind();
        let subject = event.subject().to_owned();

        // An error only means there are no subscribers right now
        if let Ok(receivers) = self.sender.send(event) {
            tracing::debug!(%kind, subject, receivers, "update published");
            receivers
        } else {
            tracing::trace!(%kind, subject, "update published with no subscribers");
            0
        }
    }

    /// Start receiving events published from now on
    pub fn subscribe(&self) -> Subscription {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let active = self.shared.subscribers.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(subscriber = id, active, "subscriber connected");

        Subscription {
            id,
            receiver: self.sender.subscribe(),
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.load(Ordering::Relaxed)
    }

    /// Events lost by lagging subscribers since startup
    pub fn dropped_events(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for UpdateBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateBroadcaster")
            .field("subscribers", &self.subscriber_count())
            .field("dropped", &self.dropped_events())
            .finish()
    }
}

impl HealthObserver for UpdateBroadcaster {
    fn provider_status_changed(&self, provider: &Provider, _previous: ProviderStatus) {
        self.publish(UpdateEvent::ProviderHealthUpdate(provider.clone()));
    }
}

impl ChainObserver for UpdateBroadcaster {
    fn chain_saved(&self, chain: &FallbackChainConfig, analytics: &ChainAnalytics) {
        self.publish(UpdateEvent::ChainUpdate(chain.clone()));
        self.publish(UpdateEvent::CostAnalyticsUpdate(analytics.clone()));
    }
}

/// One subscriber's view of the update stream
///
/// Dropping the subscription disconnects it.
pub struct Subscription {
    id: u64,
    receiver: broadcast::Receiver<UpdateEvent>,
    shared: Arc<Shared>,
}

impl Subscription {
    /// Wait for the next event
    ///
    /// If this subscriber fell behind, the oldest events are skipped and
    /// counted. Returns `None` once the broadcaster is gone.
    pub async fn next(&mut self) -> Option<UpdateEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    self.shared.dropped.fetch_add(skipped, Ordering::Relaxed);
                    self.shared
                        .dropped_counter
                        .add(skipped, &[KeyValue::new("reason", "lagged")]);
                    tracing::warn!(subscriber = self.id, skipped, "subscriber lagging, oldest updates dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let active = self.shared.subscribers.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
        tracing::info!(subscriber = self.id, active, "subscriber disconnected");
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish_non_exhaustive()
    }
}
