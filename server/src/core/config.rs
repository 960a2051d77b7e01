use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::cli::CliConfig;
use super::constants::{
    DEFAULT_CLEANUP_INTERVAL_MS, DEFAULT_HOST, DEFAULT_MAX_STORED_QUERIES, DEFAULT_METRIC_TTL_MS,
    DEFAULT_MONGO_HOST, DEFAULT_MONGO_PORT, DEFAULT_POLLING_INTERVAL_MS, DEFAULT_PORT,
    DEFAULT_SYSTEM_DATABASES, ENV_CLEANUP_INTERVAL_MS, ENV_MAX_STORED_QUERIES, ENV_METRIC_TTL_MS,
    ENV_MONGO_PORT, ENV_POLLING_INTERVAL_MS, ENV_PORT,
};

// =============================================================================
// Runtime Config Structs
// =============================================================================

/// HTTP server configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// MongoDB connection configuration (final/runtime)
#[derive(Clone)]
pub struct MongoConfig {
    /// Full connection string; when set, host/port/credentials are ignored
    pub uri: Option<String>,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

// Manual impl keeps the password out of debug logs
impl fmt::Debug for MongoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoConfig")
            .field("uri", &self.uri.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl MongoConfig {
    /// Connection string handed to the driver.
    ///
    /// A custom URI gets a trailing `/` when it has no path yet; the composed
    /// form never embeds credentials (they are applied as driver options).
    pub fn connection_uri(&self) -> String {
        match &self.uri {
            Some(uri) => {
                let after_scheme = uri.split_once("://").map_or(uri.as_str(), |(_, rest)| rest);
                if after_scheme.contains('/') {
                    uri.clone()
                } else {
                    format!("{}/", uri)
                }
            }
            None => format!("mongodb://{}:{}/", self.host, self.port),
        }
    }

    /// Loggable description of the connection target (never includes secrets)
    pub fn display_target(&self) -> String {
        match &self.uri {
            Some(_) => "custom URI".to_string(),
            None => format!("{}:{}", self.host, self.port),
        }
    }
}

/// Ingestion engine configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// `database.collection` pairs that never produce a series
    pub ignored_collections: Vec<String>,
    /// Databases skipped before scanning
    pub system_databases: Vec<String>,
    pub polling_interval: Duration,
    pub metric_ttl: Duration,
    pub cleanup_interval: Duration,
    pub max_stored_queries: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            ignored_collections: Vec::new(),
            system_databases: DEFAULT_SYSTEM_DATABASES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            polling_interval: Duration::from_millis(DEFAULT_POLLING_INTERVAL_MS),
            metric_ttl: Duration::from_millis(DEFAULT_METRIC_TTL_MS),
            cleanup_interval: Duration::from_millis(DEFAULT_CLEANUP_INTERVAL_MS),
            max_stored_queries: DEFAULT_MAX_STORED_QUERIES,
        }
    }
}

impl IngestConfig {
    /// Whether exported series expire before the next poll could see them
    pub fn expires_between_polls(&self) -> bool {
        self.polling_interval >= self.metric_ttl
    }
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub mongo: MongoConfig,
    pub ingest: IngestConfig,
}

impl AppConfig {
    /// Build the configuration from CLI arguments (which include env var
    /// fallbacks via clap).
    ///
    /// Never fails: absent, empty or malformed values fall back to the
    /// built-in defaults with a warning.
    pub fn load(cli: &CliConfig) -> Self {
        tracing::debug!("Loading application configuration");

        let host = non_empty(cli.host.as_deref()).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or_default(ENV_PORT, cli.port.as_deref(), DEFAULT_PORT, |p| *p > 0);

        let mongo = MongoConfig {
            uri: non_empty(cli.mongo_uri.as_deref()),
            host: non_empty(cli.mongo_host.as_deref())
                .unwrap_or_else(|| DEFAULT_MONGO_HOST.to_string()),
            port: parse_or_default(
                ENV_MONGO_PORT,
                cli.mongo_port.as_deref(),
                DEFAULT_MONGO_PORT,
                |p| *p > 0,
            ),
            username: non_empty(cli.mongo_username.as_deref()),
            password: cli.mongo_password.clone().filter(|p| !p.is_empty()),
        };

        let defaults = IngestConfig::default();
        let ingest = IngestConfig {
            ignored_collections: cli
                .ignored_collections
                .as_deref()
                .map(split_list)
                .unwrap_or(defaults.ignored_collections),
            system_databases: cli
                .system_databases
                .as_deref()
                .map(split_list)
                .filter(|dbs| !dbs.is_empty())
                .unwrap_or(defaults.system_databases),
            polling_interval: Duration::from_millis(parse_or_default(
                ENV_POLLING_INTERVAL_MS,
                cli.polling_interval_ms.as_deref(),
                DEFAULT_POLLING_INTERVAL_MS,
                |ms| *ms > 0,
            )),
            metric_ttl: Duration::from_millis(parse_or_default(
                ENV_METRIC_TTL_MS,
                cli.metric_ttl_ms.as_deref(),
                DEFAULT_METRIC_TTL_MS,
                |ms| *ms > 0,
            )),
            cleanup_interval: Duration::from_millis(parse_or_default(
                ENV_CLEANUP_INTERVAL_MS,
                cli.cleanup_interval_ms.as_deref(),
                DEFAULT_CLEANUP_INTERVAL_MS,
                |ms| *ms > 0,
            )),
            max_stored_queries: parse_or_default(
                ENV_MAX_STORED_QUERIES,
                cli.max_stored_queries.as_deref(),
                DEFAULT_MAX_STORED_QUERIES,
                |n| *n > 0,
            ),
        };

        if ingest.expires_between_polls() {
            tracing::warn!(
                polling_interval_ms = ingest.polling_interval.as_millis() as u64,
                metric_ttl_ms = ingest.metric_ttl.as_millis() as u64,
                "Polling interval is not shorter than the metric TTL, series expire between polls"
            );
        }

        let config = Self {
            server: ServerConfig { host, port },
            mongo,
            ingest,
        };
        tracing::debug!(config = ?config, "Configuration loaded");
        config
    }
}

/// Trimmed value, `None` when absent or blank
fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Split a comma-separated list, trimming items and dropping empty ones
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `raw` as `T`, falling back to `default` when absent, malformed or
/// rejected by `accept`.
fn parse_or_default<T>(name: &str, raw: Option<&str>, default: T, accept: impl Fn(&T) -> bool) -> T
where
    T: FromStr + fmt::Display + Copy,
{
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(value) if accept(&value) => value,
        _ => {
            tracing::warn!(
                setting = name,
                value = raw,
                default = %default,
                "Invalid configuration value, using default"
            );
            default
        }
    }
}
