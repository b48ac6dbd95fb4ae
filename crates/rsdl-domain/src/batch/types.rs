//! Configuration and batch function contract for the batcher.

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::LoadResult;

/// Default coalescing window.
///
/// The runtime may poll sibling tasks on other worker threads, so a batch is
/// closed by a short timer rather than by a single scheduler turn.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(1);

/// Configuration for a [`Batcher`](super::Batcher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Whether resolved keys are memoized for the lifetime of the batcher.
    pub cache: bool,
    /// How long a batch stays open for more keys after its first key arrives.
    ///
    /// `Duration::ZERO` still defers dispatch to a timer tick, so loads
    /// joined in the same task share a batch.
    pub delay: Duration,
    /// Maximum keys per batch function call. `None` means unbounded.
    pub max_batch_size: Option<usize>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            cache: true,
            delay: DEFAULT_BATCH_DELAY,
            max_batch_size: None,
        }
    }
}

impl BatchConfig {
    /// Enables or disables per-key memoization.
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Sets the coalescing window.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Caps the number of keys per batch function call.
    ///
    /// A cap of zero is treated as one.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = Some(max_batch_size.max(1));
        self
    }
}

/// The user-supplied fetch invoked once per batch.
///
/// Implementations must return exactly one value per key, in key order.
/// Use [`check_and_order`](crate::reconcile::check_and_order) when the
/// backing store returns items unordered.
#[async_trait]
pub trait BatchFn<K, V>: Send + Sync + 'static {
    /// Fetches values for a deduplicated set of keys, answering positionally.
    async fn load(&self, keys: &[K]) -> LoadResult<Vec<V>>;
}

/// Adapter turning an async closure into a [`BatchFn`].
pub struct FnBatch<F, K, V> {
    f: F,
    _marker: PhantomData<fn(Vec<K>) -> V>,
}

/// Wraps an async closure taking the batch keys by value.
///
/// ```rust
/// use rsdl_domain::batch::{batch_fn, Batcher};
///
/// let doubler = Batcher::new(batch_fn(|keys: Vec<u32>| async move {
///     Ok(keys.into_iter().map(|k| k * 2).collect::<Vec<u32>>())
/// }));
/// # let _ = doubler;
/// ```
pub fn batch_fn<F, Fut, K, V>(f: F) -> FnBatch<F, K, V>
where
    F: Fn(Vec<K>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = LoadResult<Vec<V>>> + Send,
{
    FnBatch {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, K, V> BatchFn<K, V> for FnBatch<F, K, V>
where
    F: Fn(Vec<K>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = LoadResult<Vec<V>>> + Send,
    K: Clone + Send + Sync + 'static,
    V: 'static,
{
    async fn load(&self, keys: &[K]) -> LoadResult<Vec<V>> {
        (self.f)(keys.to_vec()).await
    }
}
