//! Entry processor: raw profiling entry -> query fact + exported series

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use mongodb::bson::Document;

use super::extract::{
    client, event_time, execution_plan, first_nonzero, int_field, json_field, namespace,
    operation_kind, query_details, query_pattern, record_identity, str_field,
};
use super::operation::Operation;
use crate::core::constants::NOT_AVAILABLE;
use crate::data::state::IngestState;
use crate::data::types::{QueryFact, QueryLabels};
use crate::utils::time::to_iso_millis;

/// `plan_summary` label value when the entry has none
const NO_PLAN_LABEL: &str = "none";

pub struct EntryProcessor {
    /// `database.collection` pairs that never produce a series
    ignored: HashSet<String>,
}

impl EntryProcessor {
    pub fn new<I, S>(ignored: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignored: ignored.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_ignored(&self, database: &str, collection: &str) -> bool {
        self.ignored
            .contains(&format!("{}.{}", database, collection))
    }

    /// Turn one profiling entry read from `source_db` into a fact, exporting
    /// its series.
    ///
    /// Returns `None` when the entry was already emitted (its observation
    /// time is refreshed) or belongs to an ignored namespace. Ignored entries
    /// are not marked seen. Never fails: malformed fields end up as defaults
    /// or sentinels.
    pub fn process(
        &self,
        source_db: &str,
        entry: &Document,
        state: &mut IngestState,
        now: DateTime<Utc>,
    ) -> Option<QueryFact> {
        let event_time = event_time(entry);
        let identity = record_identity(entry, event_time);

        if state.observe_seen(&identity, now) {
            return None;
        }

        let (database, collection) = namespace(entry);
        if self.is_ignored(&database, &collection) {
            return None;
        }

        let operation = operation_kind(entry);
        let millis = int_field(entry, "millis");
        let docs_examined = first_nonzero(entry, &["nreturned", "docsExamined"]);
        let keys_examined = int_field(entry, "keysExamined");
        let plan_summary = str_field(entry, "planSummary");
        let timestamp = to_iso_millis(event_time.unwrap_or(now));
        let id = identity.to_string();

        let labels = QueryLabels {
            query_id: id.clone(),
            database: database.clone(),
            collection: collection.clone(),
            operation_type: operation.clone(),
            millis: millis.to_string(),
            docs_examined: docs_examined.to_string(),
            keys_examined: keys_examined.to_string(),
            plan_summary: plan_summary.unwrap_or(NO_PLAN_LABEL).to_string(),
            query_pattern: query_pattern(entry),
            timestamp: timestamp.clone(),
        };

        let fact = QueryFact {
            id,
            timestamp,
            database,
            collection,
            query: query_details(&Operation::from_entry(&operation, entry)),
            operation,
            millis,
            docs_examined,
            keys_examined,
            plan_summary: plan_summary.unwrap_or(NOT_AVAILABLE).to_string(),
            user: str_field(entry, "user").unwrap_or(NOT_AVAILABLE).to_string(),
            client: client(entry),
            write_conflicts: int_field(entry, "writeConflicts"),
            locks: json_field(entry, "locks"),
            protocol: str_field(entry, "protocol")
                .unwrap_or(NOT_AVAILABLE)
                .to_string(),
            cursor_exhausted: entry.get_bool("cursorExhausted").unwrap_or(false),
            num_yield: int_field(entry, "numYield"),
            execution_plan: execution_plan(entry),
            originating_command: json_field(entry, "originatingCommand"),
            response_length: int_field(entry, "responseLength"),
        };

        state.emit(source_db, identity, labels, now);
        Some(fact)
    }
}
