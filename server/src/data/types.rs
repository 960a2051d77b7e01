//! Shared data types for the ingestion engine
//!
//! - [`RecordIdentity`]: dedup and expiry key of a profiling entry
//! - [`QueryFact`]: normalized, immutable projection of one profiling entry
//! - [`QueryLabels`]: label tuple of the exported query series

use std::fmt;

use serde::Serialize;

/// Dedup key of a profiling entry: `(queryHash | "none", event millis)`.
///
/// Entries without a parseable timestamp share the `none` millis slot, so a
/// re-scanned timestamp-less entry is still recognised as already seen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordIdentity {
    pub query_hash: Option<String>,
    pub ts_millis: Option<i64>,
}

impl RecordIdentity {
    pub fn new(query_hash: Option<String>, ts_millis: Option<i64>) -> Self {
        Self {
            query_hash,
            ts_millis,
        }
    }
}

impl fmt::Display for RecordIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hash = self.query_hash.as_deref().unwrap_or("none");
        match self.ts_millis {
            Some(ms) => write!(f, "{}-{}", hash, ms),
            None => write!(f, "{}-none", hash),
        }
    }
}

/// Normalized query execution fact, created once per distinct identity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFact {
    pub id: String,
    /// ISO 8601 event time (millisecond precision)
    pub timestamp: String,
    pub database: String,
    pub collection: String,
    pub operation: String,
    /// Serialized, length-capped operation payload
    pub query: String,
    pub millis: i64,
    pub docs_examined: i64,
    pub keys_examined: i64,
    pub plan_summary: String,
    pub user: String,
    pub client: String,
    pub write_conflicts: i64,
    pub locks: String,
    pub protocol: String,
    pub cursor_exhausted: bool,
    pub num_yield: i64,
    /// Serialized, length-capped execution statistics
    pub execution_plan: String,
    pub originating_command: String,
    pub response_length: i64,
}

/// Label tuple of one `mongodb_query_details` series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryLabels {
    pub query_id: String,
    pub database: String,
    pub collection: String,
    pub operation_type: String,
    pub millis: String,
    pub docs_examined: String,
    pub keys_examined: String,
    pub plan_summary: String,
    pub query_pattern: String,
    pub timestamp: String,
}

impl QueryLabels {
    /// Label values in the order of `QUERY_DETAILS_LABELS`
    pub fn values(&self) -> [&str; 10] {
        [
            &self.query_id,
            &self.database,
            &self.collection,
            &self.operation_type,
            &self.millis,
            &self.docs_examined,
            &self.keys_examined,
            &self.plan_summary,
            &self.query_pattern,
            &self.timestamp,
        ]
    }
}
