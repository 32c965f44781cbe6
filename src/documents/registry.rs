//! In-memory registry mapping store identifiers to their records.
//!
//! Nothing is persisted: the registry starts empty on every process start.

use crate::documents::StoreRecord;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Entries {
    records: HashMap<String, (u64, StoreRecord)>,
    next_seq: u64,
}

/// Flat map of live stores keyed by `store_id`.
#[derive(Default)]
pub struct StoreRegistry {
    inner: RwLock<Entries>,
}

impl StoreRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record, replacing any previous record with the same identifier.
    pub async fn insert(&self, record: StoreRecord) {
        let mut guard = self.inner.write().await;
        let seq = guard.next_seq;
        guard.next_seq += 1;
        guard
            .records
            .insert(record.store_id.clone(), (seq, record));
    }

    /// Look up a record by identifier.
    pub async fn get(&self, store_id: &str) -> Option<StoreRecord> {
        let guard = self.inner.read().await;
        guard.records.get(store_id).map(|(_, record)| record.clone())
    }

    /// Remove and return a record.
    pub async fn remove(&self, store_id: &str) -> Option<StoreRecord> {
        let mut guard = self.inner.write().await;
        guard.records.remove(store_id).map(|(_, record)| record)
    }

    /// All live records in registration order.
    pub async fn list(&self) -> Vec<StoreRecord> {
        let guard = self.inner.read().await;
        let mut entries: Vec<_> = guard.records.values().collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries
            .into_iter()
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// Number of live records.
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    /// Whether no store is registered.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
