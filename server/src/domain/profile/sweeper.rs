//! Periodic eviction of series older than the metric TTL

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::data::state::{EvictionStats, SharedIngestState};

pub struct CleanupSweeper {
    state: SharedIngestState,
    ttl: Duration,
    interval: Duration,
}

impl CleanupSweeper {
    pub fn new(state: SharedIngestState, ttl: Duration, interval: Duration) -> Self {
        Self {
            state,
            ttl,
            interval,
        }
    }

    /// Evict every series older than the TTL at `now`.
    ///
    /// Candidates are snapshotted first and re-checked under a second lock,
    /// so the poll loop can emit or refresh entries in between.
    pub fn sweep(&self, now: DateTime<Utc>) -> EvictionStats {
        let candidates = self.state.lock().expired_identities(now, self.ttl);
        let stats = self.state.lock().evict(&candidates, now, self.ttl);

        tracing::info!(
            removed = stats.series_removed,
            seen_pruned = stats.seen_pruned,
            "Cleaned up old metrics"
        );
        stats
    }

    /// Sweep every `interval` (first run one interval after start) until
    /// shutdown.
    pub fn start(self, mut shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval_at(Instant::now() + self.interval, self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    result = shutdown_rx.changed() => {
                        if result.is_err() || *shutdown_rx.borrow() {
                            tracing::debug!("Cleanup sweeper shutting down");
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        self.sweep(Utc::now());
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::data::source::testing::MemoryProfileSource;
    use crate::data::state::IngestState;
    use crate::data::types::{QueryLabels, RecordIdentity};
    use crate::domain::profile::{DatabaseScanner, EntryProcessor};
    use mongodb::bson::{DateTime as BsonDateTime, doc};

    const TTL: Duration = Duration::from_secs(3600);

    fn seeded(at: DateTime<Utc>) -> SharedIngestState {
        let state = IngestState::new(10).unwrap().into_shared();
        let entry = doc! {
            "op": "query",
            "ns": "shop.orders",
            "queryHash": "ABCD",
            "ts": BsonDateTime::from_millis(1_704_067_200_000),
        };
        EntryProcessor::new(Vec::<String>::new())
            .process("shop", &entry, &mut state.lock(), at)
            .unwrap();
        state
    }

    #[test]
    fn test_series_present_just_before_ttl() {
        let t0 = Utc::now();
        let state = seeded(t0);
        let sweeper = CleanupSweeper::new(state.clone(), TTL, Duration::from_secs(300));

        let stats = sweeper.sweep(t0 + chrono::Duration::seconds(3599));
        assert_eq!(stats.series_removed, 0);
        assert_eq!(state.lock().metrics().len(), 1);
    }

    #[test]
    fn test_series_absent_just_after_ttl() {
        let t0 = Utc::now();
        let state = seeded(t0);
        let sweeper = CleanupSweeper::new(state.clone(), TTL, Duration::from_secs(300));

        let stats = sweeper.sweep(t0 + chrono::Duration::seconds(3601));
        assert_eq!(stats.series_removed, 1);
        let state = state.lock();
        assert!(state.metrics().is_empty());
        assert!(state.expiry().is_empty());
    }

    #[test]
    fn test_evicted_entry_still_in_profile_is_not_reemitted() {
        let t0 = Utc::now();
        let state = seeded(t0);
        let sweeper = CleanupSweeper::new(state.clone(), TTL, Duration::from_secs(300));

        // observed again by a scan shortly before expiry
        let entry = doc! {
            "op": "query",
            "ns": "shop.orders",
            "queryHash": "ABCD",
            "ts": BsonDateTime::from_millis(1_704_067_200_000),
        };
        let processor = EntryProcessor::new(Vec::<String>::new());
        let t1 = t0 + chrono::Duration::seconds(3500);
        assert!(processor.process("shop", &entry, &mut state.lock(), t1).is_none());

        sweeper.sweep(t0 + chrono::Duration::seconds(3601));
        assert!(state.lock().metrics().is_empty());

        let t2 = t0 + chrono::Duration::seconds(3700);
        assert!(processor.process("shop", &entry, &mut state.lock(), t2).is_none());
        assert!(state.lock().metrics().is_empty());
    }

    #[test]
    fn test_sweep_keeps_fresh_entries() {
        let t0 = Utc::now();
        let state = seeded(t0);
        let fresh = RecordIdentity::new(Some("FRESH".to_string()), Some(1));
        let t1 = t0 + chrono::Duration::seconds(3000);
        state.lock().emit(
            "shop",
            fresh.clone(),
            QueryLabels {
                query_id: fresh.to_string(),
                database: "shop".to_string(),
                collection: "carts".to_string(),
                operation_type: "insert".to_string(),
                millis: "0".to_string(),
                docs_examined: "0".to_string(),
                keys_examined: "0".to_string(),
                plan_summary: "none".to_string(),
                query_pattern: "unknown".to_string(),
                timestamp: "1970-01-01T00:00:00.001Z".to_string(),
            },
            t1,
        );

        let sweeper = CleanupSweeper::new(state.clone(), TTL, Duration::from_secs(300));
        let stats = sweeper.sweep(t0 + chrono::Duration::seconds(3700));
        assert_eq!(stats.series_removed, 1);
        assert_eq!(state.lock().metrics().get("FRESH-1"), Some(1.0));
    }

    fn scanned_setup() -> (
        Arc<MemoryProfileSource>,
        DatabaseScanner,
        CleanupSweeper,
        SharedIngestState,
    ) {
        let source = Arc::new(
            MemoryProfileSource::new().with_profile("shop", vec![profile_entry("ABCD", 1)]),
        );
        let state = IngestState::new(10).unwrap().into_shared();
        let scanner = DatabaseScanner::new(
            source.clone(),
            EntryProcessor::new(Vec::<String>::new()),
            state.clone(),
        );
        let sweeper = CleanupSweeper::new(state.clone(), TTL, Duration::from_secs(300));
        (source, scanner, sweeper, state)
    }

    fn profile_entry(hash: &str, ms: i64) -> mongodb::bson::Document {
        doc! {
            "op": "query",
            "ns": "shop.orders",
            "queryHash": hash,
            "ts": BsonDateTime::from_millis(ms),
        }
    }

    #[tokio::test]
    async fn test_no_reemit_after_scan_outage_longer_than_ttl() {
        let (source, scanner, sweeper, state) = scanned_setup();
        assert_eq!(scanner.scan("shop").await, 1);

        source.set_failing("shop", true);
        assert_eq!(scanner.scan("shop").await, 0);

        let stats = sweeper.sweep(Utc::now() + chrono::Duration::seconds(7200));
        assert_eq!(stats.series_removed, 1);
        assert_eq!(stats.seen_pruned, 0);

        source.set_failing("shop", false);
        assert_eq!(scanner.scan("shop").await, 0);
        assert!(state.lock().metrics().is_empty());
        assert_eq!(state.lock().recent().len(), 1);
    }

    #[tokio::test]
    async fn test_no_reemit_when_polling_slower_than_ttl() {
        let (_source, scanner, sweeper, state) = scanned_setup();
        assert_eq!(scanner.scan("shop").await, 1);

        // several sweeps run before the next poll
        let now = Utc::now();
        sweeper.sweep(now + chrono::Duration::seconds(3601));
        sweeper.sweep(now + chrono::Duration::seconds(7300));

        assert_eq!(scanner.scan("shop").await, 0);
        assert_eq!(state.lock().seen_len(), 1);
    }

    #[tokio::test]
    async fn test_rotated_out_entries_are_forgotten() {
        let (source, scanner, sweeper, state) = scanned_setup();
        assert_eq!(scanner.scan("shop").await, 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        source.replace("shop", vec![profile_entry("EFGH", 2)]);
        assert_eq!(scanner.scan("shop").await, 1);

        let stats = sweeper.sweep(Utc::now() + chrono::Duration::seconds(7200));
        assert_eq!(stats.seen_pruned, 1);
        assert_eq!(state.lock().seen_len(), 1);
    }

    #[tokio::test]
    async fn test_task_stops_on_shutdown() {
        let state = IngestState::new(10).unwrap().into_shared();
        let sweeper = CleanupSweeper::new(state, TTL, Duration::from_millis(10));
        let (tx, rx) = watch::channel(false);

        let handle = sweeper.start(rx);
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
