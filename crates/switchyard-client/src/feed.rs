//! Reconnecting update feed with a polling fallback
//!
//! The feed consumes the push stream while it is up. When it drops, the
//! feed reconnects with exponential backoff. The backoff only starts over
//! once a stream has delivered an event or outlived the longest delay, so
//! a server that accepts and immediately closes the stream still runs the
//! retries out. Once they are spent it polls the provider and chain
//! endpoints on a fixed interval and dispatches the results as the same
//! typed events, trying to restore the push stream on every poll tick.

use std::time::Duration;

use futures::StreamExt;
use switchyard_core::UpdateEvent;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::client::{EventStream, SwitchyardClient};
use crate::dispatcher::EventDispatcher;
use crate::error::ClientError;

/// Timing of reconnect attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect attempt
    pub initial_delay: Duration,
    /// Factor applied to the delay after each failed attempt
    pub multiplier: u32,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Reconnect attempts before falling back to polling
    pub max_retries: u32,
    /// Interval between polls once retries are exhausted
    pub poll_interval: Duration,
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (0-indexed)
    pub fn delay(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(self.multiplier.saturating_pow(attempt))
            .min(self.max_delay)
    }
}

impl Default for ReconnectPolicy {
    /// 1s doubling up to 30s, 5 retries, then poll every 5 minutes
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            multiplier: 2,
            max_delay: Duration::from_secs(30),
            max_retries: 5,
            poll_interval: Duration::from_secs(300),
        }
    }
}

/// Backoff state across reconnect attempts
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: ReconnectPolicy,
    attempt: u32,
}

impl Backoff {
    pub const fn new(policy: ReconnectPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// Delay before the next attempt, or `None` once retries are spent
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.policy.max_retries {
            return None;
        }
        let delay = self.policy.delay(self.attempt);
        self.attempt += 1;
        Some(delay)
    }

    /// Start over after a successful connection
    pub const fn reset(&mut self) {
        self.attempt = 0;
    }

    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    pub const fn is_exhausted(&self) -> bool {
        self.attempt >= self.policy.max_retries
    }
}

/// Keeps a dispatcher fed from a switchyard server
#[derive(Debug, Clone)]
pub struct UpdateFeed {
    client: SwitchyardClient,
    policy: ReconnectPolicy,
}

impl UpdateFeed {
    pub fn new(client: SwitchyardClient) -> Self {
        Self {
            client,
            policy: ReconnectPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run until `shutdown` is cancelled
    pub async fn run(&self, dispatcher: &EventDispatcher, shutdown: &CancellationToken) {
        let mut backoff = Backoff::new(self.policy.clone());

        loop {
            let connected = tokio::select! {
                () = shutdown.cancelled() => break,
                result = self.client.subscribe() => result,
            };

            match connected {
                Ok(stream) => {
                    if backoff.attempt() > 0 {
                        tracing::info!(attempts = backoff.attempt(), "update stream reconnected");
                    }

                    let connected_at = Instant::now();
                    let delivered = self.consume(stream, dispatcher, shutdown).await;

                    // A stream that closes right away does not count as recovered
                    if delivered > 0 || connected_at.elapsed() >= self.policy.max_delay {
                        backoff.reset();
                    } else {
                        tracing::debug!(attempt = backoff.attempt(), "update stream closed before delivering");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt = backoff.attempt(), "update stream unavailable");
                }
            }

            if shutdown.is_cancelled() {
                break;
            }

            let wait = if let Some(delay) = backoff.next_delay() {
                delay
            } else {
                tracing::info!(
                    interval_secs = self.policy.poll_interval.as_secs(),
                    "reconnect retries exhausted, polling for updates"
                );
                self.poll(dispatcher).await;
                self.policy.poll_interval
            };

            tokio::select! {
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(wait) => {}
            }
        }

        tracing::debug!("update feed stopped");
    }

    /// Fetch current state once and dispatch it as update events
    ///
    /// Reads the same provider and chain endpoints that back the push
    /// stream, so handlers cannot tell polled updates from pushed ones.
    pub async fn poll(&self, dispatcher: &EventDispatcher) -> usize {
        let mut dispatched = 0;

        match self.client.providers().await {
            Ok(providers) => {
                for provider in providers {
                    dispatcher.dispatch(&UpdateEvent::ProviderHealthUpdate(provider));
                    dispatched += 1;
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to poll providers"),
        }

        match self.client.chains().await {
            Ok(chains) => {
                for chain in chains {
                    dispatcher.dispatch(&UpdateEvent::ChainUpdate(chain));
                    dispatched += 1;
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to poll chains"),
        }

        dispatched
    }

    /// Dispatch pushed events until the stream ends or shutdown
    ///
    /// Returns how many events were delivered.
    async fn consume(&self, mut stream: EventStream, dispatcher: &EventDispatcher, shutdown: &CancellationToken) -> usize {
        let mut delivered = 0;

        loop {
            let next = tokio::select! {
                () = shutdown.cancelled() => return delivered,
                next = stream.next() => next,
            };

            match next {
                Some(Ok(event)) => {
                    dispatcher.dispatch(&event);
                    delivered += 1;
                }
                Some(Err(ClientError::Parse(message))) => {
                    tracing::warn!(%message, "skipping malformed update");
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, base_url = %self.client.base_url(), "update stream broke");
                    return delivered;
                }
                None => {
                    tracing::warn!(base_url = %self.client.base_url(), "update stream closed");
                    return delivered;
                }
            }
        }
    }
}
