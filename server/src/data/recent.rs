//! Bounded ring of recently emitted query facts, newest first

use std::collections::VecDeque;

use super::types::QueryFact;

#[derive(Debug)]
pub struct RecentQueries {
    entries: VecDeque<QueryFact>,
    capacity: usize,
}

impl RecentQueries {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert at the front, dropping the oldest facts beyond capacity
    pub fn push(&mut self, fact: QueryFact) {
        self.entries.push_front(fact);
        self.entries.truncate(self.capacity);
    }

    /// Up to `limit` facts, newest first
    pub fn latest(&self, limit: usize) -> Vec<QueryFact> {
        self.entries.iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
