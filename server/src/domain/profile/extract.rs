//! Field extraction from raw profiling entries
//!
//! Profiling entries are loosely typed: fields may be missing, null, or of an
//! unexpected BSON type. Every helper here degrades to a default or sentinel
//! value instead of failing.

use chrono::{DateTime, Utc};
use mongodb::bson::{Bson, Document};

use super::operation::Operation;
use crate::core::constants::{
    EXECUTION_PLAN_MAX_CHARS, NOT_AVAILABLE, QUERY_DETAILS_MAX_CHARS, UNKNOWN,
};
use crate::data::types::RecordIdentity;
use crate::utils::json::{bson_as_i64, bson_to_json, bson_to_json_string, bson_to_pretty_json};
use crate::utils::string::truncate_with_marker;
use crate::utils::time::{millis_to_datetime, parse_iso_timestamp};

/// Query pattern when the filter or command cannot be serialized
const PATTERN_ERROR: &str = "error";

const DETAILS_ERROR_PREFIX: &str = "Error processing details";
const PLAN_ERROR: &str = "Error processing execution plan";

/// Whether a value counts as set: null, undefined, `false`, zero and the
/// empty string do not.
pub fn is_truthy(value: &Bson) -> bool {
    match value {
        Bson::Null | Bson::Undefined => false,
        Bson::Boolean(b) => *b,
        Bson::Int32(v) => *v != 0,
        Bson::Int64(v) => *v != 0,
        Bson::Double(v) => *v != 0.0 && !v.is_nan(),
        Bson::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// First of `keys` whose value is set
pub fn first_truthy<'a>(entry: &'a Document, keys: &[&str]) -> Option<&'a Bson> {
    keys.iter()
        .filter_map(|key| entry.get(*key))
        .find(|value| is_truthy(value))
}

/// First non-zero integer among `keys`, else 0
pub fn first_nonzero(entry: &Document, keys: &[&str]) -> i64 {
    keys.iter()
        .filter_map(|key| entry.get(*key).and_then(bson_as_i64))
        .find(|v| *v != 0)
        .unwrap_or(0)
}

/// Integer field, 0 when absent or not numeric
pub fn int_field(entry: &Document, key: &str) -> i64 {
    first_nonzero(entry, &[key])
}

/// Non-empty string field
pub fn str_field<'a>(entry: &'a Document, key: &str) -> Option<&'a str> {
    entry.get_str(key).ok().filter(|s| !s.is_empty())
}

/// First two dot-separated segments of `ns` as `(database, collection)`.
///
/// Later segments are dropped, so `media.fs.files` is collection `fs`.
/// Missing or empty parts are `unknown`.
pub fn namespace(entry: &Document) -> (String, String) {
    let mut parts = str_field(entry, "ns").unwrap_or_default().split('.');
    let mut part = || match parts.next() {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => UNKNOWN.to_string(),
    };
    let db = part();
    (db, part())
}

/// Operation kind (`op`), `unknown` when absent
pub fn operation_kind(entry: &Document) -> String {
    str_field(entry, "op").unwrap_or(UNKNOWN).to_string()
}

/// Event time of the entry.
///
/// Accepts a native BSON date, a BSON timestamp, or an extended JSON
/// `{"$date": ..}` wrapper holding epoch millis, `{"$numberLong": ..}` or an
/// ISO 8601 string.
pub fn event_time(entry: &Document) -> Option<DateTime<Utc>> {
    match entry.get("ts")? {
        Bson::DateTime(dt) => millis_to_datetime(dt.timestamp_millis()),
        Bson::Timestamp(ts) => millis_to_datetime(i64::from(ts.time) * 1000),
        Bson::Document(wrapper) => match wrapper.get("$date")? {
            Bson::String(s) => parse_iso_timestamp(s),
            Bson::Document(long) => long
                .get_str("$numberLong")
                .ok()?
                .parse()
                .ok()
                .and_then(millis_to_datetime),
            other => bson_as_i64(other).and_then(millis_to_datetime),
        },
        _ => None,
    }
}

/// Dedup identity: `queryHash` (if any) plus event millis (if any)
pub fn record_identity(entry: &Document, event_time: Option<DateTime<Utc>>) -> RecordIdentity {
    RecordIdentity::new(
        str_field(entry, "queryHash").map(str::to_string),
        event_time.map(|t| t.timestamp_millis()),
    )
}

/// Serialized operation payload, capped at [`QUERY_DETAILS_MAX_CHARS`]
pub fn query_details(operation: &Operation<'_>) -> String {
    match serde_json::to_string(&operation.payload()) {
        Ok(text) => truncate_with_marker(text, QUERY_DETAILS_MAX_CHARS),
        Err(e) => format!("{}: {}", DETAILS_ERROR_PREFIX, e),
    }
}

/// Indented `execStats`, capped at [`EXECUTION_PLAN_MAX_CHARS`]
pub fn execution_plan(entry: &Document) -> String {
    let Some(stats) = entry.get("execStats").filter(|v| is_truthy(v)) else {
        return NOT_AVAILABLE.to_string();
    };
    match bson_to_pretty_json(stats) {
        Ok(text) => truncate_with_marker(text, EXECUTION_PLAN_MAX_CHARS),
        Err(_) => PLAN_ERROR.to_string(),
    }
}

/// Query-shape fingerprint used to group similar queries.
///
/// The filter (`query`, else `filter`) when either is a document, else the
/// command body, else `unknown`.
pub fn query_pattern(entry: &Document) -> String {
    let has_filter = ["query", "filter"].iter().any(|key| {
        matches!(
            entry.get(*key),
            Some(Bson::Document(_) | Bson::Array(_) | Bson::Null)
        )
    });

    let serialized = if has_filter {
        let filter = first_truthy(entry, &["query", "filter"]);
        match filter {
            Some(value) => bson_to_json_string(value),
            None => Ok("{}".to_string()),
        }
    } else if let Some(command) = first_truthy(entry, &["command"]) {
        bson_to_json_string(command)
    } else {
        return UNKNOWN.to_string();
    };

    serialized.unwrap_or_else(|_| PATTERN_ERROR.to_string())
}

/// Compact JSON of an optional sub-document, `N/A` when absent
pub fn json_field(entry: &Document, key: &str) -> String {
    entry
        .get(key)
        .filter(|v| is_truthy(v))
        .and_then(|v| bson_to_json_string(v).ok())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Client address, else serialized client metadata, else `N/A`
pub fn client(entry: &Document) -> String {
    match first_truthy(entry, &["client", "clientMetadata"]) {
        Some(Bson::String(s)) => s.clone(),
        Some(other) => bson_to_json(other).to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{DateTime as BsonDateTime, Timestamp, doc};

    const T0: i64 = 1_704_067_200_000;

    #[test]
    fn test_namespace_split() {
        assert_eq!(
            namespace(&doc! { "ns": "shop.orders" }),
            ("shop".to_string(), "orders".to_string())
        );
        assert_eq!(
            namespace(&doc! { "ns": "shop.system.profile" }),
            ("shop".to_string(), "system".to_string())
        );
        assert_eq!(
            namespace(&doc! { "ns": "media.fs.files" }),
            ("media".to_string(), "fs".to_string())
        );
        assert_eq!(
            namespace(&doc! { "ns": ".orders" }),
            ("unknown".to_string(), "orders".to_string())
        );
        assert_eq!(
            namespace(&doc! { "ns": "shop" }),
            ("shop".to_string(), "unknown".to_string())
        );
        assert_eq!(
            namespace(&doc! {}),
            ("unknown".to_string(), "unknown".to_string())
        );
        assert_eq!(
            namespace(&doc! { "ns": 5 }),
            ("unknown".to_string(), "unknown".to_string())
        );
    }

    #[test]
    fn test_operation_kind_default() {
        assert_eq!(operation_kind(&doc! { "op": "insert" }), "insert");
        assert_eq!(operation_kind(&doc! {}), "unknown");
        assert_eq!(operation_kind(&doc! { "op": "" }), "unknown");
    }

    #[test]
    fn test_event_time_encodings() {
        let native = doc! { "ts": BsonDateTime::from_millis(T0) };
        assert_eq!(event_time(&native).unwrap().timestamp_millis(), T0);

        let wrapped = doc! { "ts": { "$date": T0 } };
        assert_eq!(event_time(&wrapped).unwrap().timestamp_millis(), T0);

        let long = doc! { "ts": { "$date": { "$numberLong": T0.to_string() } } };
        assert_eq!(event_time(&long).unwrap().timestamp_millis(), T0);

        let iso = doc! { "ts": { "$date": "2024-01-01T00:00:00.000Z" } };
        assert_eq!(event_time(&iso).unwrap().timestamp_millis(), T0);

        let ts = doc! { "ts": Timestamp { time: 1_704_067_200, increment: 1 } };
        assert_eq!(event_time(&ts).unwrap().timestamp_millis(), T0);
    }

    #[test]
    fn test_event_time_unparseable() {
        assert!(event_time(&doc! {}).is_none());
        assert!(event_time(&doc! { "ts": "yesterday" }).is_none());
        assert!(event_time(&doc! { "ts": { "$date": "not a date" } }).is_none());
        assert!(event_time(&doc! { "ts": { "other": 1 } }).is_none());
    }

    #[test]
    fn test_record_identity() {
        let entry = doc! { "queryHash": "ABCD", "ts": BsonDateTime::from_millis(T0) };
        let id = record_identity(&entry, event_time(&entry));
        assert_eq!(id.to_string(), format!("ABCD-{}", T0));

        let id = record_identity(&doc! {}, None);
        assert_eq!(id.to_string(), "none-none");
    }

    #[test]
    fn test_first_nonzero_skips_zero() {
        let entry = doc! { "nreturned": 0, "docsExamined": 12 };
        assert_eq!(first_nonzero(&entry, &["nreturned", "docsExamined"]), 12);

        let entry = doc! { "nreturned": 3_i64, "docsExamined": 12 };
        assert_eq!(first_nonzero(&entry, &["nreturned", "docsExamined"]), 3);

        assert_eq!(first_nonzero(&doc! {}, &["nreturned"]), 0);
        assert_eq!(int_field(&doc! { "millis": "slow" }, "millis"), 0);
        assert_eq!(int_field(&doc! { "millis": 4.7 }, "millis"), 4);
    }

    #[test]
    fn test_query_details_truncates_long_payload() {
        let long = "x".repeat(2000);
        let entry = doc! { "op": "insert", "o": { "blob": long } };
        let details = query_details(&Operation::from_entry("insert", &entry));
        assert_eq!(details.chars().count(), QUERY_DETAILS_MAX_CHARS + 3);
        assert!(details.ends_with("..."));
        assert!(details.starts_with(r#"{"blob":"xxx"#));
    }

    #[test]
    fn test_query_details_short_payload_verbatim() {
        let entry = doc! { "op": "query", "query": { "status": "open" } };
        let details = query_details(&Operation::from_entry("query", &entry));
        assert_eq!(details, r#"{"status":"open"}"#);
    }

    #[test]
    fn test_execution_plan() {
        assert_eq!(execution_plan(&doc! {}), "N/A");

        let entry = doc! { "execStats": { "stage": "COLLSCAN" } };
        assert_eq!(execution_plan(&entry), "{\n  \"stage\": \"COLLSCAN\"\n}");

        let entry = doc! { "execStats": { "blob": "y".repeat(3000) } };
        let plan = execution_plan(&entry);
        assert_eq!(plan.chars().count(), EXECUTION_PLAN_MAX_CHARS + 3);
        assert!(plan.ends_with("..."));
    }

    #[test]
    fn test_query_pattern_sources() {
        let entry = doc! { "query": { "status": "open" }, "command": { "find": "orders" } };
        assert_eq!(query_pattern(&entry), r#"{"status":"open"}"#);

        let entry = doc! { "filter": { "a": 1 } };
        assert_eq!(query_pattern(&entry), r#"{"a":1}"#);

        let entry = doc! { "query": Bson::Null };
        assert_eq!(query_pattern(&entry), "{}");

        let entry = doc! { "command": { "find": "orders", "filter": {} } };
        assert_eq!(query_pattern(&entry), r#"{"find":"orders","filter":{}}"#);

        assert_eq!(query_pattern(&doc! { "op": "insert" }), "unknown");
        assert_eq!(query_pattern(&doc! { "query": "text" }), "unknown");
    }

    #[test]
    fn test_json_field_and_client() {
        let entry = doc! {
            "locks": { "Global": { "acquireCount": { "r": 1 } } },
            "clientMetadata": { "driver": "node" },
        };
        assert_eq!(
            json_field(&entry, "locks"),
            r#"{"Global":{"acquireCount":{"r":1}}}"#
        );
        assert_eq!(json_field(&entry, "originatingCommand"), "N/A");
        assert_eq!(client(&entry), r#"{"driver":"node"}"#);

        assert_eq!(client(&doc! { "client": "10.0.0.5" }), "10.0.0.5");
        assert_eq!(client(&doc! {}), "N/A");
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&Bson::Null));
        assert!(!is_truthy(&Bson::Int32(0)));
        assert!(!is_truthy(&Bson::String(String::new())));
        assert!(!is_truthy(&Bson::Boolean(false)));
        assert!(is_truthy(&Bson::Document(doc! {})));
        assert!(is_truthy(&Bson::Int64(-1)));
    }
}
