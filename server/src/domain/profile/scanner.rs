//! Per-database scan of the profiling collection

use std::sync::Arc;

use chrono::Utc;

use super::processor::EntryProcessor;
use crate::data::error::DataError;
use crate::data::source::ProfileSource;
use crate::data::state::SharedIngestState;

pub struct DatabaseScanner {
    source: Arc<dyn ProfileSource>,
    processor: EntryProcessor,
    state: SharedIngestState,
}

impl DatabaseScanner {
    pub fn new(
        source: Arc<dyn ProfileSource>,
        processor: EntryProcessor,
        state: SharedIngestState,
    ) -> Self {
        Self {
            source,
            processor,
            state,
        }
    }

    /// Process every entry currently in `db`'s profiling collection and
    /// return how many were new. Errors are logged and count as zero.
    pub async fn scan(&self, db: &str) -> usize {
        match self.try_scan(db).await {
            Ok(processed) => processed,
            Err(e) => {
                tracing::error!(db, error = %e, "Error processing database");
                0
            }
        }
    }

    async fn try_scan(&self, db: &str) -> Result<usize, DataError> {
        tracing::debug!(db, "Checking database");

        let level = self.source.profiling_level(db).await?;
        match level {
            Some(level) => tracing::debug!(db, level, "Profiling level"),
            None => tracing::debug!(db, level = "unknown", "Profiling level"),
        }

        if !self.source.has_profile_collection(db).await? {
            tracing::debug!(db, "No system.profile found");
            self.state.lock().mark_scanned(db, Utc::now());
            return Ok(0);
        }

        let count = self.source.count_profile_entries(db).await?;
        tracing::debug!(db, count, "Found entries in system.profile");

        let entries = self.source.read_profile_entries(db).await?;
        let now = Utc::now();

        let processed = {
            let mut state = self.state.lock();
            let mut processed = 0;
            for entry in &entries {
                if let Some(fact) = self.processor.process(db, entry, &mut state, now) {
                    state.push_recent(fact);
                    processed += 1;
                }
            }
            state.mark_scanned(db, now);
            processed
        };

        if processed > 0 {
            tracing::info!(db, processed, "Processed new profiling entries");
        } else {
            tracing::debug!(db, processed, "Processed new profiling entries");
        }
        Ok(processed)
    }
}
