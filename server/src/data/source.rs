//! Profile source trait
//!
//! The read-only boundary to the monitored database. The ingestion engine only
//! ever enumerates databases and reads their profiling collections; it never
//! writes.

use async_trait::async_trait;
use mongodb::bson::Document;

use super::error::DataError;

#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Names of all databases visible to the monitoring user
    async fn list_database_names(&self) -> Result<Vec<String>, DataError>;

    /// Current profiling level (`was` of `{profile: -1}`), `None` when unreported
    async fn profiling_level(&self, db: &str) -> Result<Option<i64>, DataError>;

    /// Whether `system.profile` exists in `db`
    async fn has_profile_collection(&self, db: &str) -> Result<bool, DataError>;

    /// Number of entries currently in `system.profile`
    async fn count_profile_entries(&self, db: &str) -> Result<u64, DataError>;

    /// Every entry currently in `system.profile`, in natural order
    async fn read_profile_entries(&self, db: &str) -> Result<Vec<Document>, DataError>;
}
