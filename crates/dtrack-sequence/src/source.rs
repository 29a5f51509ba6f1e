//! Sequence source capability and an in-memory implementation

use crate::error::SourceError;
use crate::query::{compare_by_field, SequenceFilter, SequenceQuery};
use async_trait::async_trait;
use dtrack_model::Record;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Read-only access to a sortable remote collection
///
/// Implementations return at most `query.top` rows of `query.endpoint` that
/// satisfy `query.filter`, ordered by `query.field`.
#[async_trait]
pub trait SequenceSource: Send + Sync {
    /// Run the query
    async fn fetch(&self, query: &SequenceQuery) -> Result<Vec<Record>, SourceError>;
}

/// Named collections held in memory
///
/// Unknown collections read as empty unless the source was created with
/// [`InMemorySequenceSource::strict`].
#[derive(Debug, Default)]
pub struct InMemorySequenceSource {
    collections: RwLock<HashMap<String, Vec<Record>>>,
    strict: bool,
}

impl InMemorySequenceSource {
    /// Create empty source
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create source that rejects queries against unknown collections
    #[inline]
    #[must_use]
    pub fn strict() -> Self {
        Self {
            collections: RwLock::default(),
            strict: true,
        }
    }

    /// Register an (empty) collection
    pub fn create_collection(&self, name: impl Into<String>) {
        self.collections.write().entry(name.into()).or_default();
    }

    /// Append a row to a collection, creating it if needed
    pub fn insert(&self, collection: &str, record: Record) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(record);
    }

    /// Remove every row whose `key_field` renders as `key`; returns the count
    pub fn remove(&self, collection: &str, key_field: &str, key: &str) -> usize {
        self.remove_matching(collection, &SequenceFilter::eq(key_field, key))
    }

    /// Remove every row matching `filter`; returns the count
    pub fn remove_matching(&self, collection: &str, filter: &SequenceFilter) -> usize {
        let mut guard = self.collections.write();
        let Some(rows) = guard.get_mut(collection) else {
            return 0;
        };
        let before = rows.len();
        rows.retain(|r| !filter.matches(r));
        before - rows.len()
    }

    /// Number of rows in a collection
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections.read().get(collection).map_or(0, Vec::len)
    }

    /// Snapshot of a collection
    #[must_use]
    pub fn rows(&self, collection: &str) -> Vec<Record> {
        self.collections
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl SequenceSource for InMemorySequenceSource {
    async fn fetch(&self, query: &SequenceQuery) -> Result<Vec<Record>, SourceError> {
        let guard = self.collections.read();
        let rows = match guard.get(&query.endpoint) {
            Some(rows) => rows,
            None if self.strict => {
                return Err(SourceError::UnknownCollection(query.endpoint.clone()))
            }
            None => return Ok(Vec::new()),
        };

        let mut selected: Vec<Record> = rows
            .iter()
            .filter(|r| query.filter.as_ref().map_or(true, |f| f.matches(r)))
            .cloned()
            .collect();
        selected.sort_by(|a, b| {
            let ordering = compare_by_field(a, b, &query.field);
            if query.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        selected.truncate(query.top);
        Ok(selected)
    }
}
