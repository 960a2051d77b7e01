//! Expiry index: record identity -> instant the series was last (re)emitted

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::types::RecordIdentity;
use crate::utils::time::elapsed_since;

#[derive(Debug, Default)]
pub struct ExpiryIndex {
    entries: HashMap<RecordIdentity, DateTime<Utc>>,
}

impl ExpiryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `at` as the last emission time of `identity`
    pub fn touch(&mut self, identity: RecordIdentity, at: DateTime<Utc>) {
        self.entries.insert(identity, at);
    }

    pub fn remove(&mut self, identity: &RecordIdentity) -> Option<DateTime<Utc>> {
        self.entries.remove(identity)
    }

    pub fn last_touched(&self, identity: &RecordIdentity) -> Option<DateTime<Utc>> {
        self.entries.get(identity).copied()
    }

    /// Whether `identity` is tracked and older than `ttl` at `now`
    pub fn is_expired(&self, identity: &RecordIdentity, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.entries
            .get(identity)
            .is_some_and(|at| elapsed_since(*at, now) > ttl)
    }

    /// Snapshot of every identity older than `ttl` at `now`
    pub fn expired(&self, now: DateTime<Utc>, ttl: Duration) -> Vec<RecordIdentity> {
        self.entries
            .iter()
            .filter(|(_, at)| elapsed_since(**at, now) > ttl)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
