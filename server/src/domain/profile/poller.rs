//! Poll loop: scans every non-system database on a fixed interval

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::scanner::DatabaseScanner;
use crate::data::error::DataError;
use crate::data::source::ProfileSource;

pub struct PollLoop {
    source: Arc<dyn ProfileSource>,
    scanner: DatabaseScanner,
    system_databases: HashSet<String>,
    interval: Duration,
}

impl PollLoop {
    pub fn new(
        source: Arc<dyn ProfileSource>,
        scanner: DatabaseScanner,
        system_databases: impl IntoIterator<Item = String>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            scanner,
            system_databases: system_databases.into_iter().collect(),
            interval,
        }
    }

    /// One iteration: scan every non-system database and return the number
    /// of new entries. Only the database listing can fail; per-database
    /// errors are absorbed by the scanner.
    pub async fn run_once(&self) -> Result<usize, DataError> {
        let databases = self.source.list_database_names().await?;

        let mut total = 0;
        for db in databases
            .iter()
            .filter(|db| !self.system_databases.contains(db.as_str()))
        {
            total += self.scanner.scan(db).await;
        }
        Ok(total)
    }

    /// Poll until shutdown is signalled. Iteration failures are logged and
    /// retried on the next tick.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            tracing::debug!("Looking for queries");
            let started = Instant::now();
            match self.run_once().await {
                Ok(total) => tracing::info!(
                    total,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Poll iteration complete"
                ),
                Err(e) => tracing::error!(error = %e, "Poll iteration failed"),
            }

            tokio::select! {
                biased;
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        tracing::debug!("Poll loop shutdown complete");
    }

    pub fn start(self, shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown_rx).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::source::testing::MemoryProfileSource;
    use crate::data::state::{IngestState, SharedIngestState};
    use crate::domain::profile::EntryProcessor;
    use mongodb::bson::{DateTime as BsonDateTime, Document, doc};

    fn entry(ns: &str, ms: i64) -> Document {
        doc! { "op": "query", "ns": ns, "ts": BsonDateTime::from_millis(ms) }
    }

    fn poll_loop(source: Arc<MemoryProfileSource>, interval: Duration) -> (PollLoop, SharedIngestState) {
        let state = IngestState::new(100).unwrap().into_shared();
        let scanner = DatabaseScanner::new(
            source.clone(),
            EntryProcessor::new(Vec::<String>::new()),
            state.clone(),
        );
        let system = ["admin", "local", "config"].map(String::from);
        (PollLoop::new(source, scanner, system, interval), state)
    }

    #[tokio::test]
    async fn test_system_databases_never_scanned() {
        let source = Arc::new(
            MemoryProfileSource::new()
                .with_profile("admin", vec![entry("admin.users", 1)])
                .with_profile("local", vec![entry("local.oplog", 2)])
                .with_profile("shop", vec![entry("shop.orders", 3)]),
        );
        let (poller, state) = poll_loop(source.clone(), Duration::from_secs(60));

        assert_eq!(poller.run_once().await.unwrap(), 1);
        assert_eq!(source.reads(), vec!["shop".to_string()]);
        let state = state.lock();
        let recent = state.recent().latest(10);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].database, "shop");
    }

    #[tokio::test]
    async fn test_failing_database_is_isolated() {
        let source = Arc::new(
            MemoryProfileSource::new()
                .with_profile("billing", vec![entry("billing.invoices", 1)])
                .with_profile("shop", vec![entry("shop.orders", 2)])
                .failing("billing"),
        );
        let (poller, _) = poll_loop(source.clone(), Duration::from_secs(60));

        assert_eq!(poller.run_once().await.unwrap(), 1);
        assert_eq!(source.reads(), vec!["shop".to_string()]);
    }

    #[tokio::test]
    async fn test_listing_failure_is_an_error() {
        let source = Arc::new(MemoryProfileSource::new().with_profile("shop", vec![]));
        source.set_fail_listing(true);
        let (poller, _) = poll_loop(source, Duration::from_secs(60));

        assert!(poller.run_once().await.is_err());
    }

    #[tokio::test]
    async fn test_sums_across_databases() {
        let source = Arc::new(
            MemoryProfileSource::new()
                .with_profile("billing", vec![entry("billing.invoices", 1)])
                .with_profile("shop", vec![entry("shop.orders", 2), entry("shop.carts", 3)])
                .without_profile("empty"),
        );
        let (poller, _) = poll_loop(source, Duration::from_secs(60));

        assert_eq!(poller.run_once().await.unwrap(), 3);
        assert_eq!(poller.run_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let source = Arc::new(MemoryProfileSource::new().with_profile("shop", vec![entry("shop.orders", 1)]));
        let (poller, state) = poll_loop(source.clone(), Duration::from_millis(10));
        let (tx, rx) = watch::channel(false);

        let handle = poller.start(rx);
        tokio::time::sleep(Duration::from_millis(50)).await;
        source.append("shop", vec![entry("shop.orders", 2)]);
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("poll loop did not stop")
            .unwrap();
        assert_eq!(state.lock().metrics().len(), 2);
        assert!(source.reads().len() >= 2);
    }

    #[tokio::test]
    async fn test_run_does_not_start_after_shutdown() {
        let source = Arc::new(MemoryProfileSource::new().with_profile("shop", vec![entry("shop.orders", 1)]));
        let (poller, _) = poll_loop(source.clone(), Duration::from_millis(10));
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        poller.run(rx).await;
        assert!(source.reads().is_empty());
    }
}
