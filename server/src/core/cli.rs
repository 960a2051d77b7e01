use clap::Parser;

use super::constants::{
    ENV_CLEANUP_INTERVAL_MS, ENV_HOST, ENV_IGNORED_COLLECTIONS, ENV_MAX_STORED_QUERIES,
    ENV_METRIC_TTL_MS, ENV_MONGO_HOST, ENV_MONGO_PASSWORD, ENV_MONGO_PORT, ENV_MONGO_URI,
    ENV_MONGO_USERNAME, ENV_POLLING_INTERVAL_MS, ENV_PORT, ENV_SYSTEM_DATABASES,
};

/// Every setting is read as raw text and parsed leniently by `AppConfig::load`,
/// so a malformed value can never abort startup.
#[derive(Parser)]
#[command(name = "profwatch")]
#[command(
    version,
    about = "Exports MongoDB profiler entries as Prometheus metrics",
    long_about = None
)]
pub struct Cli {
    /// Metrics listen host
    #[arg(long, short = 'H', env = ENV_HOST)]
    pub host: Option<String>,

    /// Metrics listen port
    #[arg(long, short = 'p', env = ENV_PORT)]
    pub port: Option<String>,

    /// Full MongoDB connection string (overrides host/port/credentials)
    #[arg(long, env = ENV_MONGO_URI)]
    pub mongo_uri: Option<String>,

    /// MongoDB host
    #[arg(long, env = ENV_MONGO_HOST)]
    pub mongo_host: Option<String>,

    /// MongoDB port
    #[arg(long, env = ENV_MONGO_PORT)]
    pub mongo_port: Option<String>,

    /// MongoDB username
    #[arg(long, env = ENV_MONGO_USERNAME)]
    pub mongo_username: Option<String>,

    /// MongoDB password
    #[arg(long, env = ENV_MONGO_PASSWORD, hide_env_values = true)]
    pub mongo_password: Option<String>,

    /// Comma-separated `database.collection` pairs to ignore
    #[arg(long, env = ENV_IGNORED_COLLECTIONS)]
    pub ignored_collections: Option<String>,

    /// Comma-separated database names that are never scanned
    #[arg(long, env = ENV_SYSTEM_DATABASES)]
    pub system_databases: Option<String>,

    /// Delay between poll iterations in milliseconds
    #[arg(long, env = ENV_POLLING_INTERVAL_MS)]
    pub polling_interval_ms: Option<String>,

    /// Age in milliseconds after which an exported series is dropped
    #[arg(long, env = ENV_METRIC_TTL_MS)]
    pub metric_ttl_ms: Option<String>,

    /// Interval of the expired-series sweep in milliseconds
    #[arg(long, env = ENV_CLEANUP_INTERVAL_MS)]
    pub cleanup_interval_ms: Option<String>,

    /// Number of recent query facts kept for inspection
    #[arg(long, env = ENV_MAX_STORED_QUERIES)]
    pub max_stored_queries: Option<String>,
}

/// Configuration derived from CLI arguments and their env fallbacks
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<String>,
    pub mongo_uri: Option<String>,
    pub mongo_host: Option<String>,
    pub mongo_port: Option<String>,
    pub mongo_username: Option<String>,
    pub mongo_password: Option<String>,
    pub ignored_collections: Option<String>,
    pub system_databases: Option<String>,
    pub polling_interval_ms: Option<String>,
    pub metric_ttl_ms: Option<String>,
    pub cleanup_interval_ms: Option<String>,
    pub max_stored_queries: Option<String>,
}

/// Parse CLI arguments into a config
pub fn parse() -> CliConfig {
    let cli = Cli::parse();
    CliConfig {
        host: cli.host,
        port: cli.port,
        mongo_uri: cli.mongo_uri,
        mongo_host: cli.mongo_host,
        mongo_port: cli.mongo_port,
        mongo_username: cli.mongo_username,
        mongo_password: cli.mongo_password,
        ignored_collections: cli.ignored_collections,
        system_databases: cli.system_databases,
        polling_interval_ms: cli.polling_interval_ms,
        metric_ttl_ms: cli.metric_ttl_ms,
        cleanup_interval_ms: cli.cleanup_interval_ms,
        max_stored_queries: cli.max_stored_queries,
    }
}
