//! Operation-specific payload of a profiling entry
//!
//! Each profiled operation kind carries its interesting body in a different
//! field. [`Operation`] names exactly which fields every kind reads; fields
//! that are absent or falsy serialize as `{}`.

use mongodb::bson::{Bson, Document};
use serde_json::{Map, Value as JsonValue};

use super::extract::first_truthy;
use crate::utils::json::bson_to_json;

#[derive(Debug, Clone, PartialEq)]
pub enum Operation<'a> {
    /// `query` / `find`: the filter document (`query`, else `filter`)
    Query { filter: Option<&'a Bson> },
    /// `update`: the selector plus the update document (`updateObj`, else `u`)
    Update {
        query: Option<&'a Bson>,
        update: Option<&'a Bson>,
    },
    /// `insert`: the inserted document (`o`)
    Insert { document: Option<&'a Bson> },
    /// `command` / `getmore`: the command body
    Command { body: Option<&'a Bson> },
    /// Anything else: the whole profiling entry
    Other { entry: &'a Document },
}

impl<'a> Operation<'a> {
    pub fn from_entry(kind: &str, entry: &'a Document) -> Self {
        match kind {
            "query" | "find" => Self::Query {
                filter: first_truthy(entry, &["query", "filter"]),
            },
            "update" => Self::Update {
                query: first_truthy(entry, &["query", "filter"]),
                update: first_truthy(entry, &["updateObj", "u"]),
            },
            "insert" => Self::Insert {
                document: first_truthy(entry, &["o"]),
            },
            "command" | "getmore" => Self::Command {
                body: first_truthy(entry, &["command"]),
            },
            _ => Self::Other { entry },
        }
    }

    /// JSON payload exported as the query details of a fact
    pub fn payload(&self) -> JsonValue {
        match self {
            Self::Query { filter } => or_empty(*filter),
            Self::Update { query, update } => {
                let mut pair = Map::new();
                pair.insert("query".to_string(), or_empty(*query));
                pair.insert("update".to_string(), or_empty(*update));
                JsonValue::Object(pair)
            }
            Self::Insert { document } => or_empty(*document),
            Self::Command { body } => or_empty(*body),
            Self::Other { entry } => bson_to_json(&Bson::Document((*entry).clone())),
        }
    }
}

fn or_empty(value: Option<&Bson>) -> JsonValue {
    value.map_or_else(|| JsonValue::Object(Map::new()), bson_to_json)
}
