//! Request-scoped batch loaders
//!
//! Reference fields (`Issue.author`, `ProjectV2Item.content`, `node(id:)`, ...)
//! resolve one record by key. Resolved naively, a page of 50 issues costs 50
//! author queries. The loaders here collect every key requested during one
//! resolution round and fetch them with a single `WHERE id IN (...)`.
//!
//! # Architecture
//!
//! 1. A resolver calls `loader.load(key)` on the operation's [`BatchLoader`]
//! 2. async-graphql's `DataLoader` collects keys for the configured delay,
//!    dropping duplicates and answering repeats from the per-operation cache
//! 3. [`RecordLoader`] runs one [`BatchFetch::fetch_by_keys`] per batch and
//!    rebuilds the result map from each record's own key
//! 4. Each caller gets its record, `NotFound`, or the shared batch error
//!
//! A `BatchLoader` belongs to exactly one operation, so nothing cached for one
//! request is ever visible to another.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_graphql::dataloader::{DataLoader, HashMapCache, Loader};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::pagination::Keyed;
use crate::error::{ResolveError, StoreError, StoreResult};

// ============================================================================
// Batch fetch capability
// ============================================================================

/// Fetch many records by key in one round trip.
///
/// The result may be in any order and may omit keys that do not exist.
#[async_trait]
pub trait BatchFetch: Send + Sync + 'static {
    type Record: Keyed + Clone + Send + Sync + 'static;

    /// Entity name used in logs and not-found errors.
    fn entity(&self) -> &'static str;

    async fn fetch_by_keys(&self, keys: &[String]) -> StoreResult<Vec<Self::Record>>;
}

#[async_trait]
impl<F: BatchFetch> BatchFetch for Arc<F> {
    type Record = F::Record;

    fn entity(&self) -> &'static str {
        (**self).entity()
    }

    async fn fetch_by_keys(&self, keys: &[String]) -> StoreResult<Vec<Self::Record>> {
        (**self).fetch_by_keys(keys).await
    }
}

// ============================================================================
// Record Loader
// ============================================================================

/// `DataLoader` adapter over a [`BatchFetch`].
pub struct RecordLoader<F> {
    fetch: F,
    cancel: CancellationToken,
}

impl<F: BatchFetch> RecordLoader<F> {
    pub fn new(fetch: F, cancel: CancellationToken) -> Self {
        Self { fetch, cancel }
    }
}

impl<F: BatchFetch> Loader<String> for RecordLoader<F> {
    type Value = F::Record;
    type Error = Arc<StoreError>;

    async fn load(&self, keys: &[String]) -> Result<HashMap<String, Self::Value>, Self::Error> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let entity = self.fetch.entity();
        tracing::debug!(entity, key_count = keys.len(), "Batch loading {} records", entity);

        let records = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                // Callers already resolved to Cancelled; nothing reads this batch.
                tracing::debug!(entity, "Batch load abandoned, operation cancelled");
                return Ok(HashMap::new());
            }
            result = self.fetch.fetch_by_keys(keys) => result.map_err(|e| {
                tracing::warn!(entity, error = %e, "Batch load failed");
                Arc::new(e)
            })?,
        };

        let requested: HashSet<&str> = keys.iter().map(String::as_str).collect();
        let fetched = records.len();
        let result: HashMap<String, F::Record> = records
            .into_iter()
            .filter(|record| requested.contains(record.key()))
            .map(|record| (record.key().to_string(), record))
            .collect();

        tracing::debug!(
            entity,
            requested = keys.len(),
            fetched,
            found = result.len(),
            "Batch load complete"
        );

        Ok(result)
    }
}

// ============================================================================
// Batch Loader
// ============================================================================

/// Coalescing window and batch size for every loader of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderSettings {
    pub delay: Duration,
    pub max_batch_size: usize,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1),
            max_batch_size: 500,
        }
    }
}

/// Single-key lookups, batched and cached for the lifetime of one operation.
pub struct BatchLoader<F: BatchFetch> {
    inner: DataLoader<RecordLoader<F>, HashMapCache>,
    entity: &'static str,
    cancel: CancellationToken,
}

impl<F: BatchFetch> BatchLoader<F> {
    pub fn new(fetch: F, settings: LoaderSettings, cancel: CancellationToken) -> Self {
        let entity = fetch.entity();
        let inner = DataLoader::with_cache(
            RecordLoader::new(fetch, cancel.clone()),
            tokio::spawn,
            HashMapCache::default(),
        )
        .delay(settings.delay)
        .max_batch_size(settings.max_batch_size);

        Self {
            inner,
            entity,
            cancel,
        }
    }

    /// Resolve one record.
    ///
    /// Every caller of the same key in the same batch gets the same outcome.
    pub async fn load(&self, key: impl Into<String>) -> Result<F::Record, ResolveError> {
        let key = key.into();

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ResolveError::Cancelled),
            result = self.inner.load_one(key.clone()) => match result {
                Ok(Some(record)) => Ok(record),
                Ok(None) => Err(ResolveError::not_found(self.entity, key)),
                Err(err) => Err(ResolveError::Upstream(err)),
            },
        }
    }
}
