//! Composition root for grid operations
//!
//! [`TrackerService`] owns the configuration, the store, the sequence source
//! and the reference cache. One instance serves every grid in a session; the
//! cache it owns is what lets concurrent grids share a single gate lookup.

use crate::cache::{ReferenceCache, ResourceKey};
use crate::config::{SequenceConfig, TrackerConfig};
use crate::error::{TrackerError, TrackerResult};
use crate::grid::{GridRequest, GridResponse};
use crate::store::{InMemoryStore, TrackerStore};
use dtrack_model::{record_field_text, DeliverableId, DeliverablePatch, GateSet, Record};
use dtrack_progress::{ProgressValidator, ValidationOutcome, ValidationRequest};
use dtrack_sequence::{FilterOp, SequenceAllocator, SequenceFilter, SequenceSource};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Cache key of the gate collection
const GATES: &str = "gates";

/// Grid operation handler
#[derive(Clone)]
pub struct TrackerService {
    config: TrackerConfig,
    store: Arc<dyn TrackerStore>,
    sequences: Arc<dyn SequenceSource>,
    cache: ReferenceCache,
    validator: ProgressValidator,
}

impl fmt::Debug for TrackerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerService")
            .field("config", &self.config)
            .field("cache", &self.cache.stats())
            .finish_non_exhaustive()
    }
}

impl TrackerService {
    /// Create service over a store and a sequence source
    #[must_use]
    pub fn new(
        config: TrackerConfig,
        store: Arc<dyn TrackerStore>,
        sequences: Arc<dyn SequenceSource>,
    ) -> Self {
        let cache = match config.cache.ttl() {
            Some(ttl) => ReferenceCache::with_ttl(config.cache.max_capacity, ttl),
            None => ReferenceCache::new(config.cache.max_capacity),
        };
        Self {
            config,
            store,
            sequences,
            cache,
            validator: ProgressValidator::new(),
        }
    }

    /// Create service backed by a fresh [`InMemoryStore`]
    ///
    /// The store is returned as well so callers can seed it.
    #[must_use]
    pub fn in_memory(config: TrackerConfig) -> (Self, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let service = Self::new(config, store.clone(), store.clone());
        (service, store)
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Reference cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &ReferenceCache {
        &self.cache
    }

    fn sequence(&self, name: &str) -> TrackerResult<&SequenceConfig> {
        self.config
            .sequences
            .get(name)
            .ok_or_else(|| TrackerError::UnknownSequence(name.to_string()))
    }

    /// Allocator for a configured sequence
    ///
    /// # Errors
    /// [`TrackerError::UnknownSequence`] for an unconfigured name and
    /// [`TrackerError::ScopeRequired`] when a scoped sequence gets no scope.
    pub fn allocator(&self, name: &str, scope: Option<&str>) -> TrackerResult<SequenceAllocator> {
        let spec = self.config.allocator_spec(name, scope)?;
        Ok(SequenceAllocator::new(Arc::clone(&self.sequences), spec))
    }

    /// Suggest the next number of a sequence
    ///
    /// # Errors
    /// See [`TrackerService::allocator`].
    pub async fn suggest_number(&self, name: &str, scope: Option<&str>) -> TrackerResult<String> {
        Ok(self.allocator(name, scope)?.compute_next().await)
    }

    /// Gate lookup, shared through the reference cache
    ///
    /// # Errors
    /// Returns an error if the store fails to load gates.
    pub async fn gates(&self) -> TrackerResult<Arc<GateSet>> {
        let store = Arc::clone(&self.store);
        let gates = self
            .cache
            .get_or_load(ResourceKey::collection(GATES), || async move {
                store.load_gates().await.map(GateSet::from)
            })
            .await?;
        Ok(gates)
    }

    /// Drop cached reference data so the next lookup reloads it
    pub async fn refresh_reference_data(&self) {
        self.cache.invalidate(&ResourceKey::collection(GATES)).await;
        tracing::debug!("reference data invalidated");
    }

    async fn validation_request(
        &self,
        id: &DeliverableId,
        patch: &DeliverablePatch,
    ) -> TrackerResult<ValidationRequest> {
        let original = self
            .store
            .load_deliverable(id)
            .await?
            .ok_or_else(|| TrackerError::DeliverableNotFound(id.clone()))?;
        // entries are always re-read; an edit may follow another period's save
        let entries = self.store.load_progress_entries(id).await?;
        Ok(ValidationRequest::new(
            original,
            patch.clone(),
            entries,
            self.config.progress.period(),
        ))
    }

    /// Judge an edit without saving it
    ///
    /// # Errors
    /// Returns an error if the deliverable is unknown or a lookup fails.
    /// Rejections are reported in the outcome, not as errors.
    pub async fn validate_edit(
        &self,
        id: &DeliverableId,
        patch: &DeliverablePatch,
    ) -> TrackerResult<ValidationOutcome> {
        let request = self.validation_request(id, patch).await?;
        let gates = self.gates().await?;
        Ok(self.validator.validate(&request, &gates))
    }

    /// Validate an edit and persist it if accepted
    ///
    /// # Errors
    /// Returns an error if the deliverable is unknown or the store fails.
    pub async fn update_deliverable(
        &self,
        id: &DeliverableId,
        patch: &DeliverablePatch,
    ) -> TrackerResult<GridResponse> {
        let request = self.validation_request(id, patch).await?;
        let gates = self.gates().await?;
        let outcome = self.validator.validate(&request, &gates);
        if !outcome.valid {
            return Ok(GridResponse::Rejected {
                error_text: outcome.error_text.unwrap_or_default(),
            });
        }

        let mut record = request.merged();
        if let Some(percentage) = outcome.percentage {
            record.total_percentage_earned = percentage;
        }
        self.store.save_deliverable(&record).await?;
        tracing::info!(
            deliverable = %record.id,
            gate = %record.gate_id,
            earned = record.total_percentage_earned,
            "deliverable updated"
        );
        Ok(GridResponse::Updated { record })
    }

    /// Store a new row and suggest the number for the row after it
    ///
    /// The sequence field is filled with a suggestion when the row lacks one.
    /// For scoped sequences the scope field is set to `scope`, replacing any
    /// value the row carried.
    ///
    /// # Errors
    /// See [`TrackerService::allocator`]; also fails if the store does.
    pub async fn insert(
        &self,
        name: &str,
        scope: Option<&str>,
        mut record: Record,
    ) -> TrackerResult<GridResponse> {
        let allocator = self.allocator(name, scope)?;
        let sequence = self.sequence(name)?;

        let number = match record_field_text(&record, &sequence.field) {
            Some(number) if !number.trim().is_empty() => number,
            _ => {
                let number = allocator.compute_next().await;
                record.insert(sequence.field.clone(), Value::String(number.clone()));
                number
            }
        };
        if let (Some(field), Some(scope)) = (&sequence.scope_field, scope) {
            // the request scope wins so the row lands where the next suggestion is read
            record.insert(field.clone(), Value::String(scope.to_string()));
        }

        self.store.insert_record(&sequence.endpoint, record).await?;
        let next_number = allocator.compute_next().await;
        tracing::debug!(sequence = name, %number, %next_number, "row inserted");
        Ok(GridResponse::Inserted {
            number,
            next_number,
        })
    }

    /// Delete the row holding `key` and refresh the suggestion
    ///
    /// # Errors
    /// See [`TrackerService::allocator`]; also fails if the store does.
    pub async fn remove(
        &self,
        name: &str,
        scope: Option<&str>,
        key: &str,
    ) -> TrackerResult<GridResponse> {
        let allocator = self.allocator(name, scope)?;
        let sequence = self.sequence(name)?;

        let mut filter = SequenceFilter::eq(sequence.field.as_str(), key);
        if let (Some(field), Some(scope)) = (&sequence.scope_field, scope) {
            filter = filter.and(field.as_str(), FilterOp::Eq, scope);
        }
        let removed = self
            .store
            .remove_records(&sequence.endpoint, &filter)
            .await?;

        let next_number = allocator.compute_next().await;
        tracing::debug!(sequence = name, key, removed, %next_number, "rows removed");
        Ok(GridResponse::Removed {
            removed,
            next_number,
        })
    }

    /// Dispatch a grid request
    ///
    /// # Errors
    /// Propagates the error of the handling operation.
    #[tracing::instrument(level = "debug", skip(self, request), fields(op = request.op()))]
    pub async fn handle(&self, request: GridRequest) -> TrackerResult<GridResponse> {
        match request {
            GridRequest::Init { sequence, scope } => {
                let number = self.suggest_number(&sequence, scope.as_deref()).await?;
                Ok(GridResponse::Defaults { number })
            }
            GridRequest::Insert {
                sequence,
                scope,
                record,
            } => self.insert(&sequence, scope.as_deref(), record).await,
            GridRequest::Update {
                deliverable_id,
                patch,
            } => self.update_deliverable(&deliverable_id, &patch).await,
            GridRequest::Remove {
                sequence,
                scope,
                key,
            } => self.remove(&sequence, scope.as_deref(), &key).await,
            GridRequest::Validate {
                deliverable_id,
                patch,
            } => {
                let outcome = self.validate_edit(&deliverable_id, &patch).await?;
                Ok(GridResponse::Validation(outcome))
            }
        }
    }
}
