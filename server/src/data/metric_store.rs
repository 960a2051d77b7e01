//! Prometheus-backed metric store
//!
//! [`QueryMetricStore`] owns the `mongodb_query_details` gauge and remembers
//! the full label tuple of every series it created, so a series can be removed
//! by its `query_id` alone. [`MetricsRegistry`] renders the exposition text on
//! scrape without touching the ingestion lock.

use std::collections::HashMap;

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use super::error::MetricsError;
use super::types::QueryLabels;
use crate::core::constants::{QUERY_DETAILS_HELP, QUERY_DETAILS_LABELS, QUERY_DETAILS_METRIC};

/// Query details gauge plus the label index needed for subset removal
pub struct QueryMetricStore {
    gauge: GaugeVec,
    series: HashMap<String, QueryLabels>,
}

impl QueryMetricStore {
    pub fn new() -> Result<Self, MetricsError> {
        let gauge = GaugeVec::new(
            Opts::new(QUERY_DETAILS_METRIC, QUERY_DETAILS_HELP),
            QUERY_DETAILS_LABELS,
        )?;
        Ok(Self {
            gauge,
            series: HashMap::new(),
        })
    }

    /// Set the series for `labels` to `value`.
    ///
    /// A series already exported under the same `query_id` with a different
    /// label tuple is replaced, keeping one series per query id.
    pub fn upsert(&mut self, labels: QueryLabels, value: f64) {
        if let Some(previous) = self.series.get(&labels.query_id)
            && previous != &labels
        {
            if let Err(e) = self.gauge.remove_label_values(&previous.values()) {
                tracing::warn!(
                    query_id = %labels.query_id,
                    error = %e,
                    "Replaced series missing from gauge"
                );
            }
        }
        self.gauge.with_label_values(&labels.values()).set(value);
        self.series.insert(labels.query_id.clone(), labels);
    }

    /// Remove the series whose `query_id` label matches. Returns whether one
    /// existed.
    pub fn remove(&mut self, query_id: &str) -> bool {
        match self.series.remove(query_id) {
            Some(labels) => {
                if let Err(e) = self.gauge.remove_label_values(&labels.values()) {
                    tracing::warn!(query_id, error = %e, "Series missing from gauge");
                }
                true
            }
            None => false,
        }
    }

    /// Current value of the series with this `query_id`
    pub fn get(&self, query_id: &str) -> Option<f64> {
        let labels = self.series.get(query_id)?;
        self.gauge
            .get_metric_with_label_values(&labels.values())
            .ok()
            .map(|g| g.get())
    }

    /// Label tuple of the series with this `query_id`
    pub fn labels(&self, query_id: &str) -> Option<&QueryLabels> {
        self.series.get(query_id)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    fn collector(&self) -> Box<GaugeVec> {
        Box::new(self.gauge.clone())
    }
}

/// Registry exposed on `/metrics`
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
}

impl MetricsRegistry {
    /// Register the query gauge and, on Linux, the process collector
    /// (CPU, memory, file descriptors, start time).
    pub fn new(store: &QueryMetricStore) -> Result<Self, MetricsError> {
        let registry = Registry::new();
        registry.register(store.collector())?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self { registry })
    }

    /// Render the registry in the Prometheus text format
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Content type of [`encode`](Self::encode) output
    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}
