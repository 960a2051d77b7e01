//! Shared ingestion state
//!
//! The seen set, metric store, expiry index and recent-queries ring are
//! mutated together, so they live in one struct behind one lock. The scrape
//! path never takes this lock: it gathers from the [`MetricsRegistry`], which
//! shares the gauge with the metric store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::error::MetricsError;
use super::expiry::ExpiryIndex;
use super::metric_store::{MetricsRegistry, QueryMetricStore};
use super::recent::RecentQueries;
use super::types::{QueryFact, QueryLabels, RecordIdentity};
use crate::utils::time::elapsed_since;

pub type SharedIngestState = Arc<Mutex<IngestState>>;

/// Outcome of one eviction pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EvictionStats {
    pub series_removed: usize,
    pub seen_pruned: usize,
}

/// Where and when a seen identity was last observed
#[derive(Debug, Clone)]
struct Sighting {
    database: String,
    observed_at: DateTime<Utc>,
}

pub struct IngestState {
    seen: HashMap<RecordIdentity, Sighting>,
    /// Database -> instant of its last successful full scan
    scanned: HashMap<String, DateTime<Utc>>,
    expiry: ExpiryIndex,
    metrics: QueryMetricStore,
    registry: MetricsRegistry,
    recent: RecentQueries,
}

impl IngestState {
    pub fn new(max_stored_queries: usize) -> Result<Self, MetricsError> {
        let metrics = QueryMetricStore::new()?;
        let registry = MetricsRegistry::new(&metrics)?;
        Ok(Self {
            seen: HashMap::new(),
            scanned: HashMap::new(),
            expiry: ExpiryIndex::new(),
            metrics,
            registry,
            recent: RecentQueries::new(max_stored_queries),
        })
    }

    pub fn into_shared(self) -> SharedIngestState {
        Arc::new(Mutex::new(self))
    }

    /// Registry handle for the scrape path
    pub fn registry(&self) -> MetricsRegistry {
        self.registry.clone()
    }

    /// Refresh the observation time of an already-seen identity.
    ///
    /// Returns `false` when the identity has not been seen yet (nothing is
    /// recorded in that case).
    pub fn observe_seen(&mut self, identity: &RecordIdentity, now: DateTime<Utc>) -> bool {
        match self.seen.get_mut(identity) {
            Some(sighting) => {
                sighting.observed_at = now;
                true
            }
            None => false,
        }
    }

    /// Mark `identity` seen in `database` and export its series with value 1
    pub fn emit(
        &mut self,
        database: &str,
        identity: RecordIdentity,
        labels: QueryLabels,
        now: DateTime<Utc>,
    ) {
        self.seen.insert(
            identity.clone(),
            Sighting {
                database: database.to_string(),
                observed_at: now,
            },
        );
        self.metrics.upsert(labels, 1.0);
        self.expiry.touch(identity, now);
    }

    /// Record that every entry of `database` was read at `at`
    pub fn mark_scanned(&mut self, database: &str, at: DateTime<Utc>) {
        self.scanned.insert(database.to_string(), at);
    }

    pub fn last_scanned(&self, database: &str) -> Option<DateTime<Utc>> {
        self.scanned.get(database).copied()
    }

    pub fn push_recent(&mut self, fact: QueryFact) {
        self.recent.push(fact);
    }

    /// Identities whose series is older than `ttl` at `now`
    pub fn expired_identities(&self, now: DateTime<Utc>, ttl: Duration) -> Vec<RecordIdentity> {
        self.expiry.expired(now, ttl)
    }

    /// Remove the series of every candidate that is still expired, then drop
    /// seen entries that have left their profiling collection.
    ///
    /// Candidates come from an earlier snapshot; a candidate refreshed since
    /// then is kept. A seen entry is dropped only when it was not observed
    /// within `ttl` and its database has been fully scanned since, so failing
    /// or infrequent scans never make a record eligible for re-emission.
    pub fn evict(
        &mut self,
        candidates: &[RecordIdentity],
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> EvictionStats {
        let mut stats = EvictionStats::default();

        for identity in candidates {
            if !self.expiry.is_expired(identity, now, ttl) {
                continue;
            }
            self.expiry.remove(identity);
            if self.metrics.remove(&identity.to_string()) {
                stats.series_removed += 1;
            }
        }

        let before = self.seen.len();
        let scanned = &self.scanned;
        self.seen.retain(|_, sighting| {
            let stale = elapsed_since(sighting.observed_at, now) > ttl;
            let gone = scanned
                .get(&sighting.database)
                .is_some_and(|at| *at > sighting.observed_at);
            !(stale && gone)
        });
        stats.seen_pruned = before - self.seen.len();

        stats
    }

    pub fn metrics(&self) -> &QueryMetricStore {
        &self.metrics
    }

    pub fn expiry(&self) -> &ExpiryIndex {
        &self.expiry
    }

    pub fn recent(&self) -> &RecentQueries {
        &self.recent
    }

    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_seen(&self, identity: &RecordIdentity) -> bool {
        self.seen.contains_key(identity)
    }
}
