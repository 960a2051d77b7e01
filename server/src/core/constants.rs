// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "Profwatch";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "profwatch";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for the metrics listen host
pub const ENV_HOST: &str = "HOST";

/// Environment variable for the metrics listen port
pub const ENV_PORT: &str = "PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "PROFWATCH_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default listen host (all interfaces, scraped from outside the container)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 2233;

// =============================================================================
// Environment Variables - MongoDB
// =============================================================================

/// Full connection string; takes precedence over host/port/credentials
pub const ENV_MONGO_URI: &str = "MONGO_URI";

pub const ENV_MONGO_HOST: &str = "MONGO_HOST";
pub const ENV_MONGO_PORT: &str = "MONGO_PORT";
pub const ENV_MONGO_USERNAME: &str = "MONGO_USERNAME";
pub const ENV_MONGO_PASSWORD: &str = "MONGO_PASSWORD";

/// Comma-separated `database.collection` pairs that are never exported
pub const ENV_IGNORED_COLLECTIONS: &str = "IGNORED_COLLECTIONS";

/// Comma-separated database names skipped by the poll loop
pub const ENV_SYSTEM_DATABASES: &str = "SYSTEM_DATABASES";

// =============================================================================
// MongoDB Defaults
// =============================================================================

pub const DEFAULT_MONGO_HOST: &str = "mongodb";
pub const DEFAULT_MONGO_PORT: u16 = 27017;

/// Databases that never carry application profiling data
pub const DEFAULT_SYSTEM_DATABASES: &[&str] = &["admin", "local", "config"];

/// Name of the built-in profiling collection
pub const PROFILE_COLLECTION: &str = "system.profile";

// =============================================================================
// Environment Variables - Ingestion
// =============================================================================

pub const ENV_POLLING_INTERVAL_MS: &str = "POLLING_INTERVAL_MS";
pub const ENV_METRIC_TTL_MS: &str = "METRIC_TTL_MS";
pub const ENV_CLEANUP_INTERVAL_MS: &str = "CLEANUP_INTERVAL_MS";
pub const ENV_MAX_STORED_QUERIES: &str = "MAX_STORED_QUERIES";

// =============================================================================
// Ingestion Defaults
// =============================================================================

/// Delay between two poll iterations (10 seconds)
pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 10_000;

/// Age after which an emitted series is evicted (1 hour)
pub const DEFAULT_METRIC_TTL_MS: u64 = 3_600_000;

/// Interval of the cleanup sweeper (5 minutes)
pub const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 300_000;

/// Capacity of the recent-queries ring
pub const DEFAULT_MAX_STORED_QUERIES: usize = 1000;

// =============================================================================
// Extraction Limits
// =============================================================================

/// Maximum characters of the serialized query/update/command payload
pub const QUERY_DETAILS_MAX_CHARS: usize = 1000;

/// Maximum characters of the serialized execution plan
pub const EXECUTION_PLAN_MAX_CHARS: usize = 1500;

/// Suffix appended to truncated payloads
pub const TRUNCATION_MARKER: &str = "...";

/// Placeholder for absent optional fields
pub const NOT_AVAILABLE: &str = "N/A";

/// Placeholder for absent namespace parts, operation kinds and query shapes
pub const UNKNOWN: &str = "unknown";

// =============================================================================
// Metrics
// =============================================================================

pub const QUERY_DETAILS_METRIC: &str = "mongodb_query_details";
pub const QUERY_DETAILS_HELP: &str = "Details of individual queries in MongoDB";

/// Label names of the query details gauge, in exposition order
pub const QUERY_DETAILS_LABELS: &[&str] = &[
    "query_id",
    "database",
    "collection",
    "operation_type",
    "millis",
    "docs_examined",
    "keys_examined",
    "plan_summary",
    "query_pattern",
    "timestamp",
];

// =============================================================================
// Shutdown
// =============================================================================

/// Maximum time to wait for background tasks during shutdown
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;
