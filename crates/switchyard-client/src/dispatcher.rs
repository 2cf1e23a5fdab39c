//! Routing of update events to registered handlers

use std::collections::HashMap;
use std::fmt;

use switchyard_core::{EventKind, UpdateEvent};

type Handler = Box<dyn Fn(&UpdateEvent) + Send + Sync>;

/// Maps each event kind to the handlers interested in it
///
/// Events are dispatched synchronously in the order they are handed in,
/// so updates about one provider reach handlers in arrival order.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<EventKind, Vec<Handler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> &mut Self
    where
        F: Fn(&UpdateEvent) + Send + Sync + 'static,
    {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
        self
    }

    /// Hand an event to every handler registered for its kind
    ///
    /// Returns how many handlers ran.
    pub fn dispatch(&self, event: &UpdateEvent) -> usize {
        let Some(handlers) = self.handlers.get(&event.kind()) else {
            tracing::trace!(kind = %event.kind(), "no handler for update");
            return 0;
        };

        for handler in handlers {
            handler(event);
        }
        handlers.len()
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<_> = self.handlers.keys().collect();
        f.debug_struct("EventDispatcher").field("kinds", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use switchyard_core::{ChainEntry, FallbackChainConfig, Provider, ProviderStatus, RoutingStrategy};

    use super::*;

    fn health(name: &str, status: ProviderStatus) -> UpdateEvent {
        UpdateEvent::ProviderHealthUpdate(Provider {
            status,
            ..Provider::new(name, 0.01)
        })
    }

    #[test]
    fn handlers_see_only_their_kind_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();

        let sink = Arc::clone(&seen);
        dispatcher.on(EventKind::ProviderHealthUpdate, move |event| {
            if let UpdateEvent::ProviderHealthUpdate(provider) = event {
                sink.lock().unwrap().push(provider.status);
            }
        });

        dispatcher.dispatch(&health("openai", ProviderStatus::Degraded));
        let chain = UpdateEvent::ChainUpdate(FallbackChainConfig::new(
            "openai",
            vec![ChainEntry::primary("openai", 100)],
            RoutingStrategy::Balanced,
        ));
        assert_eq!(dispatcher.dispatch(&chain), 0);
        dispatcher.dispatch(&health("openai", ProviderStatus::Offline));
        dispatcher.dispatch(&health("openai", ProviderStatus::Active));

        assert_eq!(*seen.lock().unwrap(), vec![
            ProviderStatus::Degraded,
            ProviderStatus::Offline,
            ProviderStatus::Active,
        ]);
    }

    #[test]
    fn multiple_handlers_per_kind() {
        let count = Arc::new(Mutex::new(0));
        let mut dispatcher = EventDispatcher::new();

        for _ in 0..2 {
            let count = Arc::clone(&count);
            dispatcher.on(EventKind::ProviderHealthUpdate, move |_| *count.lock().unwrap() += 1);
        }

        assert_eq!(dispatcher.dispatch(&health("openai", ProviderStatus::Active)), 2);
        assert_eq!(*count.lock().unwrap(), 2);
    }
}
