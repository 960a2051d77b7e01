//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::core::cli::{self, CliConfig};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::metric_store::MetricsRegistry;
use crate::data::mongo::MongoProfileSource;
use crate::data::source::ProfileSource;
use crate::data::state::{IngestState, SharedIngestState};
use crate::domain::{CleanupSweeper, DatabaseScanner, EntryProcessor, PollLoop};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub ingest: SharedIngestState,
    pub registry: MetricsRegistry,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::info!(version = env!("CARGO_PKG_VERSION"), "{} starting", APP_NAME);

        let cli_config = cli::parse();
        let app = Self::init(&cli_config)?;
        app.start().await
    }

    fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli);
        let state = IngestState::new(config.ingest.max_stored_queries)
            .context("Failed to initialize metrics registry")?;
        let registry = state.registry();

        Ok(Self {
            shutdown: ShutdownService::new(),
            config,
            ingest: state.into_shared(),
            registry,
        })
    }

    fn init_logging() {
        let default_filter = format!("info,{}_server=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start(self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        self.shutdown.install_signal_handlers();

        self.start_background_tasks().await;

        let server = ApiServer::new(
            self.config.server.clone(),
            self.registry.clone(),
            self.ingest.clone(),
            self.shutdown.clone(),
        );
        let server_handle = match server.start().await {
            Ok(handle) => handle,
            Err(e) => {
                self.shutdown.shutdown().await;
                return Err(e);
            }
        };
        self.shutdown.register(server_handle).await;

        let result = self.monitor().await;
        self.shutdown.shutdown().await;
        result
    }

    /// Spawn the cleanup sweeper
    async fn start_background_tasks(&self) {
        let sweeper = CleanupSweeper::new(
            self.ingest.clone(),
            self.config.ingest.metric_ttl,
            self.config.ingest.cleanup_interval,
        );
        self.shutdown
            .register(sweeper.start(self.shutdown.subscribe()))
            .await;

        tracing::debug!("Background tasks started");
    }

    /// Connect to MongoDB and poll until shutdown. A failed connection is
    /// fatal and is returned to the caller.
    async fn monitor(&self) -> Result<()> {
        let mongo = &self.config.mongo;
        tracing::info!(endpoint = %mongo.display_target(), "Starting query monitoring");

        let connected = tokio::select! {
            result = MongoProfileSource::connect(mongo) => result,
            _ = self.shutdown.wait() => {
                tracing::debug!("Shutdown before MongoDB connection was established");
                return Ok(());
            }
        };

        let source: Arc<dyn ProfileSource> = match connected {
            Ok(source) => Arc::new(source),
            Err(e) => {
                tracing::error!(error = %e, "Error connecting to MongoDB");
                return Err(e).context("MongoDB connection failed");
            }
        };

        let ingest = &self.config.ingest;
        let scanner = DatabaseScanner::new(
            source.clone(),
            EntryProcessor::new(ingest.ignored_collections.iter().cloned()),
            self.ingest.clone(),
        );
        let poll_loop = PollLoop::new(
            source,
            scanner,
            ingest.system_databases.iter().cloned(),
            ingest.polling_interval,
        );

        poll_loop.run(self.shutdown.subscribe()).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataError;

    fn app_with_uri(uri: &str) -> CoreApp {
        let cli = CliConfig {
            mongo_uri: Some(uri.to_string()),
            ..Default::default()
        };
        CoreApp::init(&cli).unwrap()
    }

    #[tokio::test]
    async fn test_monitor_fails_when_mongodb_unreachable() {
        let app = app_with_uri("mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200");

        let err = tokio::time::timeout(std::time::Duration::from_secs(10), app.monitor())
            .await
            .expect("connection attempt did not give up")
            .unwrap_err();

        assert!(err.to_string().contains("MongoDB connection failed"));
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::Connection { .. })
        ));
        assert!(app.ingest.lock().metrics().is_empty());
    }

    #[tokio::test]
    async fn test_monitor_returns_ok_on_shutdown_before_connect() {
        let app = app_with_uri("mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=30000");
        app.shutdown.trigger();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), app.monitor())
            .await
            .expect("monitor ignored shutdown");
        assert!(result.is_ok());
    }
}
