//! Reference-data cache using moka
//!
//! Shares reference collections (gates, disciplines, document types, ...)
//! between all callers of one service instance. Concurrent requests for the
//! same [`ResourceKey`] are coalesced into a single in-flight load.

use crate::error::CacheError;
use moka::future::Cache;
use std::any::{type_name, Any};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// Identity of a cached resource: a collection, optionally narrowed to a scope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    /// Collection name
    pub collection: String,
    /// Scope value, e.g. a project id
    pub scope: Option<String>,
}

impl ResourceKey {
    /// Key for a whole collection
    #[inline]
    #[must_use]
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            scope: None,
        }
    }

    /// Key for a scoped slice of a collection
    #[inline]
    #[must_use]
    pub fn scoped(collection: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            scope: Some(scope.into()),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}[{scope}]", self.collection),
            None => f.write_str(&self.collection),
        }
    }
}

/// Type-erased cache of reference collections
#[derive(Debug, Clone)]
pub struct ReferenceCache {
    inner: Cache<ResourceKey, Arc<dyn Any + Send + Sync>>,
}

impl ReferenceCache {
    /// Create cache with max capacity and no expiry
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Create cache with time-based expiration
    #[inline]
    #[must_use]
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Store a value
    pub async fn insert<T: Any + Send + Sync>(&self, key: ResourceKey, value: T) {
        self.inner.insert(key, Arc::new(value)).await;
    }

    /// Fetch a value of type `T`; `None` if absent or of another type
    pub async fn get<T: Any + Send + Sync>(&self, key: &ResourceKey) -> Option<Arc<T>> {
        self.inner
            .get(key)
            .await
            .and_then(|value| value.downcast::<T>().ok())
    }

    /// Fetch a value, loading it on a miss
    ///
    /// Callers racing on the same key share one invocation of `load`; its
    /// failure is reported to all of them and nothing is cached.
    ///
    /// # Errors
    /// [`CacheError::Load`] if the loader fails, [`CacheError::TypeMismatch`]
    /// if the key already holds a value of another type.
    pub async fn get_or_load<T, E, F, Fut>(
        &self,
        key: ResourceKey,
        load: F,
    ) -> Result<Arc<T>, CacheError>
    where
        T: Any + Send + Sync,
        E: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let init = async move {
            let value = load().await?;
            tracing::debug!(type_name = type_name::<T>(), "loaded reference data");
            Ok::<_, E>(Arc::new(value) as Arc<dyn Any + Send + Sync>)
        };

        let value = self
            .inner
            .try_get_with(key.clone(), init)
            .await
            .map_err(|e| CacheError::Load {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        value
            .downcast::<T>()
            .map_err(|_| CacheError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Invalidate one entry
    #[inline]
    pub async fn invalidate(&self, key: &ResourceKey) {
        self.inner.invalidate(key).await;
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Check if key is cached
    pub async fn contains(&self, key: &ResourceKey) -> bool {
        self.inner.get(key).await.is_some()
    }

    /// Apply pending housekeeping so counts are current
    pub async fn sync(&self) {
        self.inner.run_pending_tasks().await;
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

impl Default for ReferenceCache {
    /// Create cache with default capacity (1,000 entries)
    fn default() -> Self {
        Self::new(1_000)
    }
}
