//! In-memory history backend
//!
//! Not durable: everything is lost when the process exits.

use dashmap::DashMap;
use std::sync::Arc;

use super::{HistoryStore, StoreError};
use crate::types::{Alert, MessageEntry};

/// Concurrent map from identifier to alert sequence.
///
/// Each value is a whole sequence behind an `Arc`, replaced in one step on
/// `set`, so readers see either the old or the new sequence and never a mix.
/// `list` walks the shards without a global lock and may or may not observe a
/// racing `set`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: DashMap<String, Arc<Vec<Alert>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HistoryStore for InMemoryStore {
    fn get(&self, id: &str) -> Result<Vec<Alert>, StoreError> {
        self.entries
            .get(id)
            .map(|entry| entry.value().as_ref().clone())
            .ok_or_else(|| StoreError::not_found(id))
    }

    fn set(&self, id: &str, alerts: &[Alert]) -> Result<(), StoreError> {
        self.entries.insert(id.to_string(), Arc::new(alerts.to_vec()));
        Ok(())
    }

    fn list(&self) -> Result<Vec<MessageEntry>, StoreError> {
        let snapshot: Vec<(String, Arc<Vec<Alert>>)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        Ok(snapshot
            .into_iter()
            .map(|(id, alerts)| MessageEntry {
                id,
                alerts: alerts.as_ref().clone(),
            })
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}
