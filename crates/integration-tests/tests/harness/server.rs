//! Test server wrapper that starts switchyard on a random port

use std::net::SocketAddr;

use switchyard_client::SwitchyardClient;
use switchyard_config::Config;
use switchyard_server::Server;
use tokio_util::sync::CancellationToken;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: SwitchyardClient,
}

impl TestServer {
    /// Start a test server with the given configuration
    ///
    /// Binds to port 0 and starts the background probe and analytics loops
    /// configured in `config`.
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let server = Server::new(config)?;
        let shutdown = CancellationToken::new();
        let _background = server.spawn_background(&shutdown);
        let shutdown_clone = shutdown.clone();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, server.into_router())
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        let client = SwitchyardClient::new(&format!("http://{addr}"))?;

        Ok(Self { addr, shutdown, client })
    }

    /// Full URL of a path on the running server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Typed client pointed at the server
    pub fn client(&self) -> &SwitchyardClient {
        &self.client
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
