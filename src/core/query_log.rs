//! QueryLog: append-only record of a session's accepted queries

use serde::Serialize;

use crate::types::{Metrics, QueryRecord, Trends};

/// Ordered, append-only list of query records. Insertion order is
/// display order; records are never edited or removed.
#[derive(Debug, Default, Clone, Serialize)]
pub struct QueryLog {
    records: Vec<QueryRecord>,
}

impl QueryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record. Empty (or whitespace-only) text is a no-op and
    /// returns `None`.
    pub fn append(&mut self, text: &str, metrics: Metrics) -> Option<&QueryRecord> {
        if text.trim().is_empty() {
            return None;
        }
        self.records.push(QueryRecord::new(text, metrics));
        self.records.last()
    }

    /// All records in insertion order
    pub fn as_table(&self) -> &[QueryRecord] {
        &self.records
    }

    pub fn latest(&self) -> Option<&QueryRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// μ / entropy / variance series over query index
    pub fn trends(&self) -> Trends {
        Trends {
            mu: self.records.iter().map(|r| r.mu).collect(),
            entropy: self.records.iter().map(|r| r.entropy).collect(),
            variance: self.records.iter().map(|r| r.variance).collect(),
        }
    }
}
