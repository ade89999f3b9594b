mod cors;
mod health;

use std::net::SocketAddr;

use axum::Router;
use clipdeck_config::Config;
use tower_http::trace::TraceLayer;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// Capability routers are only mounted when configured: `/tts` and
    /// `/asr` need at least one provider, the upload routes need
    /// `tiktok.enabled`.
    ///
    /// # Errors
    ///
    /// Returns an error if a capability fails to initialize
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8000)));

        let mut app = Router::new();

        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        if !config.tts.providers.is_empty() {
            let tts_state = tts::build_server(config)?;
            app = app.merge(tts::endpoint_router().with_state(tts_state));
        }

        if !config.stt.providers.is_empty() {
            let stt_state = stt::build_server(config)?;
            app = app.merge(stt::endpoint_router().with_state(stt_state));
        }

        if config.tiktok.enabled {
            let tiktok_state = tiktok::build_server(config)?;
            app = app.merge(tiktok::endpoint_router().with_state(tiktok_state));
        }

        app = app.layer(TraceLayer::new_for_http());

        if let Some(ref cors_config) = config.server.cors {
            app = app.layer(cors::cors_layer(cors_config));
        }

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
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
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
