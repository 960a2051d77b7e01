//! JSON utility functions for BSON payloads

use mongodb::bson::Bson;
use serde_json::Value as JsonValue;

/// Converts BSON to relaxed extended JSON (dates as `{"$date": ..}`, plain
/// numbers for int32/int64/double).
pub fn bson_to_json(value: &Bson) -> JsonValue {
    value.clone().into_relaxed_extjson()
}

/// Compact JSON text of a BSON value
pub fn bson_to_json_string(value: &Bson) -> Result<String, serde_json::Error> {
    serde_json::to_string(&bson_to_json(value))
}

/// Indented JSON text of a BSON value (two-space indent)
pub fn bson_to_pretty_json(value: &Bson) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&bson_to_json(value))
}

/// Numeric BSON as i64 (doubles truncated), `None` for anything else
pub fn bson_as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) if v.is_finite() => Some(*v as i64),
        _ => None,
    }
}
