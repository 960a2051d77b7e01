//! Data layer
//!
//! - `source` - Read-only profile source trait
//! - `mongo` - MongoDB implementation of the profile source
//! - `types` - Record identity, query facts and series labels
//! - `metric_store` - Prometheus gauge with label-subset removal, scrape registry
//! - `expiry` - Last-emission index driving TTL eviction
//! - `recent` - Bounded ring of recent query facts
//! - `state` - Shared ingestion state behind a single lock
//! - `error` - Error types for the data layer

pub mod error;
pub mod expiry;
pub mod metric_store;
pub mod mongo;
pub mod recent;
pub mod source;
pub mod state;
pub mod types;

pub use error::{DataError, MetricsError};
pub use metric_store::{MetricsRegistry, QueryMetricStore};
pub use mongo::MongoProfileSource;
pub use source::ProfileSource;
pub use state::{IngestState, SharedIngestState};
pub use types::{QueryFact, QueryLabels, RecordIdentity};
