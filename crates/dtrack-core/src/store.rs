//! Persistence collaborator
//!
//! The service never talks to a backend directly; it goes through
//! [`TrackerStore`]. [`InMemoryStore`] backs tests and local tooling and also
//! serves as the [`SequenceSource`] for the rows inserted through it.

use crate::error::StoreError;
use async_trait::async_trait;
use dtrack_model::{DeliverableId, DeliverableRecord, Gate, ProgressEntry, Record};
use dtrack_sequence::{
    InMemorySequenceSource, SequenceFilter, SequenceQuery, SequenceSource, SourceError,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Backend operations the service depends on
#[async_trait]
pub trait TrackerStore: Send + Sync {
    /// Fetch one deliverable
    async fn load_deliverable(
        &self,
        id: &DeliverableId,
    ) -> Result<Option<DeliverableRecord>, StoreError>;

    /// Persist a deliverable, replacing the stored row
    async fn save_deliverable(&self, record: &DeliverableRecord) -> Result<(), StoreError>;

    /// Fetch every known gate
    async fn load_gates(&self) -> Result<Vec<Gate>, StoreError>;

    /// Fetch the progress entries recorded for a deliverable
    async fn load_progress_entries(
        &self,
        id: &DeliverableId,
    ) -> Result<Vec<ProgressEntry>, StoreError>;

    /// Append a row to a collection
    async fn insert_record(&self, collection: &str, record: Record) -> Result<(), StoreError>;

    /// Delete rows matching `filter`; returns how many were removed
    async fn remove_records(
        &self,
        collection: &str,
        filter: &SequenceFilter,
    ) -> Result<usize, StoreError>;
}

/// Store held entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    deliverables: RwLock<HashMap<DeliverableId, DeliverableRecord>>,
    gates: RwLock<Vec<Gate>>,
    entries: RwLock<HashMap<DeliverableId, Vec<ProgressEntry>>>,
    collections: InMemorySequenceSource,
    gate_loads: AtomicUsize,
}

impl InMemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the gate list
    pub fn set_gates(&self, gates: impl IntoIterator<Item = Gate>) {
        *self.gates.write() = gates.into_iter().collect();
    }

    /// Insert or replace a deliverable
    pub fn put_deliverable(&self, record: DeliverableRecord) {
        self.deliverables.write().insert(record.id.clone(), record);
    }

    /// Stored deliverable, if any
    #[must_use]
    pub fn deliverable(&self, id: &DeliverableId) -> Option<DeliverableRecord> {
        self.deliverables.read().get(id).cloned()
    }

    /// Record progress for a deliverable, replacing an entry for the same period
    pub fn record_progress(&self, id: &DeliverableId, entry: ProgressEntry) {
        let mut guard = self.entries.write();
        let entries = guard.entry(id.clone()).or_default();
        entries.retain(|e| e.period != entry.period);
        entries.push(entry);
    }

    /// Rows of a generic collection
    #[must_use]
    pub fn rows(&self, collection: &str) -> Vec<Record> {
        self.collections.rows(collection)
    }

    /// How many times gates were loaded through [`TrackerStore::load_gates`]
    #[must_use]
    pub fn gate_load_count(&self) -> usize {
        self.gate_loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrackerStore for InMemoryStore {
    async fn load_deliverable(
        &self,
        id: &DeliverableId,
    ) -> Result<Option<DeliverableRecord>, StoreError> {
        Ok(self.deliverable(id))
    }

    async fn save_deliverable(&self, record: &DeliverableRecord) -> Result<(), StoreError> {
        let mut guard = self.deliverables.write();
        match guard.get_mut(&record.id) {
            Some(stored) => {
                *stored = record.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                collection: "Deliverables".to_string(),
                key: record.id.to_string(),
            }),
        }
    }

    async fn load_gates(&self) -> Result<Vec<Gate>, StoreError> {
        self.gate_loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.gates.read().clone())
    }

    async fn load_progress_entries(
        &self,
        id: &DeliverableId,
    ) -> Result<Vec<ProgressEntry>, StoreError> {
        Ok(self.entries.read().get(id).cloned().unwrap_or_default())
    }

    async fn insert_record(&self, collection: &str, record: Record) -> Result<(), StoreError> {
        self.collections.insert(collection, record);
        Ok(())
    }

    async fn remove_records(
        &self,
        collection: &str,
        filter: &SequenceFilter,
    ) -> Result<usize, StoreError> {
        Ok(self.collections.remove_matching(collection, filter))
    }
}

#[async_trait]
impl SequenceSource for InMemoryStore {
    async fn fetch(&self, query: &SequenceQuery) -> Result<Vec<Record>, SourceError> {
        self.collections.fetch(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtrack_model::Period;
    use dtrack_test_utils::row;
    use serde_json::json;

    #[tokio::test]
    async fn save_requires_existing_row() {
        let store = InMemoryStore::new();
        let record = DeliverableRecord::new("D-1", "IFR", 10.0);

        assert!(matches!(
            store.save_deliverable(&record).await,
            Err(StoreError::NotFound { .. })
        ));

        store.put_deliverable(record.clone());
        store
            .save_deliverable(&record.clone().with_percentage(0.5))
            .await
            .unwrap();
        assert_eq!(
            store.deliverable(&record.id).unwrap().total_percentage_earned,
            0.5
        );
    }

    #[tokio::test]
    async fn progress_is_one_entry_per_period() {
        let store = InMemoryStore::new();
        let id = DeliverableId::new("D-1");
        store.record_progress(&id, ProgressEntry::new(3, 10.0));
        store.record_progress(&id, ProgressEntry::new(3, 12.0));
        store.record_progress(&id, ProgressEntry::new(4, 5.0));

        let entries = store.load_progress_entries(&id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .any(|e| e.period == Period::new(3) && e.units == 12.0));
    }

    #[tokio::test]
    async fn inserted_rows_feed_sequence_queries() {
        let store = InMemoryStore::new();
        store
            .insert_record("Areas", row(json!({ "areaNumber": "04" })))
            .await
            .unwrap();

        let rows = store
            .fetch(&SequenceQuery::latest("Areas", "areaNumber"))
            .await
            .unwrap();
        assert_eq!(rows[0]["areaNumber"], "04");

        let removed = store
            .remove_records("Areas", &SequenceFilter::eq("areaNumber", "04"))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.rows("Areas").is_empty());
    }
}
