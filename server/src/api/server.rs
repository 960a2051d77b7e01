//! API server initialization

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use super::middleware;
use super::routes::{health, metrics, queries};
use crate::core::ShutdownService;
use crate::core::config::ServerConfig;
use crate::data::metric_store::MetricsRegistry;
use crate::data::state::SharedIngestState;

pub struct ApiServer {
    config: ServerConfig,
    registry: MetricsRegistry,
    ingest: SharedIngestState,
    shutdown: ShutdownService,
}

impl ApiServer {
    pub fn new(
        config: ServerConfig,
        registry: MetricsRegistry,
        ingest: SharedIngestState,
        shutdown: ShutdownService,
    ) -> Self {
        Self {
            config,
            registry,
            ingest,
            shutdown,
        }
    }

    /// Bind the listener, then serve in the background until the shutdown
    /// signal fires. Binding errors are returned to the caller.
    pub async fn start(self) -> Result<JoinHandle<()>> {
        let Self {
            config,
            registry,
            ingest,
            shutdown,
        } = self;

        let listener = TcpListener::bind((config.host.as_str(), config.port))
            .await
            .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
        tracing::info!(
            host = %config.host,
            port = config.port,
            "Metrics server listening"
        );

        let serve = axum::serve(listener, router(registry, ingest))
            .with_graceful_shutdown(shutdown.wait());

        Ok(tokio::spawn(async move {
            if let Err(e) = serve.await {
                tracing::error!(error = %e, "Metrics server error");
            }
            tracing::debug!("Metrics server stopped");
        }))
    }
}

/// Full application router
pub fn router(registry: MetricsRegistry, ingest: SharedIngestState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health::health))
        .merge(metrics::routes(registry))
        .merge(queries::routes(ingest))
        .fallback(middleware::handle_404)
        .layer(TraceLayer::new_for_http())
}
