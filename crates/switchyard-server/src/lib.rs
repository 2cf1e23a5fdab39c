//! HTTP surface for switchyard
//!
//! Exposes provider health, fallback chains, routing decisions and the
//! live update stream, and runs the background health refresh, probe and
//! analytics loops.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod background;
mod error;
mod health;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use switchyard_config::Config;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::{AppState, ProbeSchedule};

/// Assembled server with all routes and background tasks
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
    state: Arc<AppState>,
    probe_interval: Duration,
    refresh_interval: Duration,
    analytics_interval: Duration,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configured chain fails validation
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let state = Arc::new(AppState::from_config(&config)?);
        Ok(Self::with_state(&config, state))
    }

    /// Build the server around already wired engine components
    pub fn with_state(config: &Config, state: Arc<AppState>) -> Self {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let mut app = Router::new();

        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        app = app.merge(routes::api_router(Arc::clone(&state)));
        app = app.layer(TraceLayer::new_for_http());

        Self {
            router: app,
            listen_address,
            state,
            probe_interval: Duration::from_secs(config.health.probe_interval_seconds),
            refresh_interval: Duration::from_secs(config.health.refresh_interval_seconds),
            analytics_interval: Duration::from_secs(config.events.analytics_interval_seconds),
        }
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    #[must_use]
    pub const fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Start the health refresh, probe and analytics loops
    ///
    /// The refresh loop always runs. A zero probe or analytics interval
    /// disables that loop. Every task stops when `shutdown` is cancelled.
    #[must_use]
    pub fn spawn_background(&self, shutdown: &CancellationToken) -> Vec<JoinHandle<()>> {
        let mut handles = vec![switchyard_health::spawn_refresh_loop(
            Arc::clone(&self.state.monitor),
            self.refresh_interval.max(Duration::from_secs(1)),
            shutdown.clone(),
        )];

        if !self.probe_interval.is_zero() {
            let schedule = ProbeSchedule {
                interval: self.probe_interval,
                shutdown: shutdown.clone(),
            };
            if self.state.probe_schedule.set(schedule).is_err() {
                tracing::warn!("background probes already started for this state");
            }
            handles.extend(switchyard_health::spawn_probe_loops(
                Arc::clone(&self.state.validation),
                self.probe_interval,
                shutdown.clone(),
            ));
        }

        if !self.analytics_interval.is_zero() {
            handles.push(background::spawn_analytics_loop(
                Arc::clone(&self.state.store),
                Arc::clone(&self.state.broadcaster),
                self.analytics_interval,
                shutdown.clone(),
            ));
        }

        tracing::debug!(tasks = handles.len(), "background tasks started");
        handles
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let background = self.spawn_background(&shutdown);

        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        let signal = shutdown.clone();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                signal.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        shutdown.cancel();
        for handle in background {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "background task ended abnormally");
            }
        }

        Ok(())
    }
}
