//! Batcher built on the `async-graphql` dataloader.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_graphql::dataloader::{DataLoader, HashMapCache, Loader};
use futures::future::{self, FutureExt};
use tracing::debug;

use super::types::{BatchConfig, BatchFn};
use crate::error::{LoadError, LoadResult};

/// Bridges a positional [`BatchFn`] to the dataloader's keyed `Loader`.
struct BatchAdapter<K, V> {
    fetch: Arc<dyn BatchFn<K, V>>,
    dispatches: Arc<AtomicU64>,
}

impl<K, V> Loader<K> for BatchAdapter<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    type Value = V;
    type Error = LoadError;

    async fn load(&self, keys: &[K]) -> Result<HashMap<K, V>, LoadError> {
        let batch_id = self.dispatches.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(target: "rsdl::batch", batch_id, keys = keys.len(), "dispatching batch");

        // A panic must fail this batch only; the dataloader then leaves the
        // keys uncached, so later loads retry.
        let outcome = AssertUnwindSafe(self.fetch.load(keys))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(LoadError::Panicked {
                    message: panic_message(payload.as_ref()),
                })
            });

        let values = match outcome {
            Ok(values) if values.len() == keys.len() => values,
            Ok(values) => {
                return Err(LoadError::LengthMismatch {
                    expected: keys.len(),
                    actual: values.len(),
                })
            }
            Err(err) => {
                debug!(target: "rsdl::batch", batch_id, error = %err, "batch failed");
                return Err(err);
            }
        };

        Ok(keys.iter().cloned().zip(values).collect())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|msg| msg.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Coalesces individual key lookups into batch function calls.
///
/// All `load` calls that arrive while a batch window is open are deduplicated
/// and handed to the batch function in one call. Keys reach the batch
/// function in no particular order; the function answers positionally and
/// the batcher maps each value back to its key. With caching enabled, each
/// successfully loaded key is fetched at most once for the lifetime of the
/// batcher. Failed keys are never cached.
///
/// Cloning a `Batcher` is cheap and yields a handle to the same batches and
/// cache.
pub struct Batcher<K, V> {
    loader: Arc<DataLoader<BatchAdapter<K, V>, HashMapCache>>,
    dispatches: Arc<AtomicU64>,
    config: BatchConfig,
}

impl<K, V> Clone for Batcher<K, V> {
    fn clone(&self) -> Self {
        Self {
            loader: Arc::clone(&self.loader),
            dispatches: Arc::clone(&self.dispatches),
            config: self.config.clone(),
        }
    }
}

impl<K, V> fmt::Debug for Batcher<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batcher")
            .field("config", &self.config)
            .field("dispatches", &self.dispatches.load(Ordering::Relaxed))
            .finish()
    }
}

impl<K, V> Batcher<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a batcher with the default configuration.
    pub fn new(fetch: impl BatchFn<K, V>) -> Self {
        Self::with_config(fetch, BatchConfig::default())
    }

    /// Creates a batcher with a custom configuration.
    pub fn with_config(fetch: impl BatchFn<K, V>, config: BatchConfig) -> Self {
        Self::from_shared(Arc::new(fetch), config)
    }

    /// Creates a batcher around an already shared batch function.
    ///
    /// Batches are dispatched on the current tokio runtime.
    pub fn from_shared(fetch: Arc<dyn BatchFn<K, V>>, config: BatchConfig) -> Self {
        let dispatches = Arc::new(AtomicU64::new(0));
        let adapter = BatchAdapter {
            fetch,
            dispatches: Arc::clone(&dispatches),
        };
        let loader = DataLoader::with_cache(adapter, tokio::spawn, HashMapCache::default())
            .delay(config.delay)
            .max_batch_size(config.max_batch_size.unwrap_or(usize::MAX));
        loader.enable_all_cache(config.cache);

        Self {
            loader: Arc::new(loader),
            dispatches,
            config,
        }
    }

    /// Returns the configuration this batcher was built with.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Loads a single key.
    pub async fn load(&self, key: K) -> LoadResult<V> {
        self.loader.load_one(key).await?.ok_or(LoadError::NoValue)
    }

    /// Loads many keys, returning one result per input key in input order.
    ///
    /// Every key is enqueued before any is awaited, so they share batches.
    /// A failure in one batch does not fail keys served by another.
    pub async fn load_many<I>(&self, keys: I) -> Vec<LoadResult<V>>
    where
        I: IntoIterator<Item = K>,
    {
        future::join_all(keys.into_iter().map(|key| self.load(key))).await
    }

    /// Seeds the cache with a value, replacing any cached one.
    ///
    /// Returns `false` and does nothing if caching is disabled.
    pub async fn prime(&self, key: K, value: V) -> bool {
        if !self.config.cache {
            return false;
        }
        self.loader.feed_one(key, value).await;
        true
    }

    /// Drops every cached key so later loads refetch.
    pub fn clear_all(&self) {
        self.loader.clear::<K>();
    }

    /// Number of batch function calls made so far.
    pub fn dispatch_count(&self) -> u64 {
        self.dispatches.load(Ordering::Relaxed)
    }
}
