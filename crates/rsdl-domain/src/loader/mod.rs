//! Loader contracts.
//!
//! A loader implementation is anything that can produce a fresh
//! [`LoaderInstance`] on demand ([`LoaderProvider`]). Most implementations only
//! need to describe how to fetch a batch of keys; [`QueryLoader`] plus
//! [`QueryProvider`] derive the instance from that by wrapping the query in a
//! [`Batcher`].

use std::any::{type_name, Any};
use std::fmt::{self, Display};
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;

use crate::batch::{BatchConfig, BatchFn, Batcher};
use crate::error::LoadResult;
use crate::reconcile::{check_and_order, IntoIdentityMap};

/// Produces loader instances.
pub trait LoaderProvider: Send + Sync + 'static {
    /// Returns a new loader instance. Must not hand out a shared one.
    fn generate_loader(&self) -> LoaderInstance;
}

/// Type-erased handle to a [`Batcher`].
///
/// Loaders of different key and value types live side by side in one
/// per-request store; callers recover the typed batcher with
/// [`downcast`](Self::downcast).
#[derive(Clone)]
pub struct LoaderInstance {
    batcher: Arc<dyn Any + Send + Sync>,
    value_type: &'static str,
}

impl LoaderInstance {
    pub fn new<K, V>(batcher: Batcher<K, V>) -> Self
    where
        K: Send + Sync + 'static,
        V: Send + Sync + 'static,
    {
        Self {
            batcher: Arc::new(batcher),
            value_type: type_name::<Batcher<K, V>>(),
        }
    }

    /// Returns the typed batcher, or `None` if `K`/`V` do not match.
    pub fn downcast<K, V>(&self) -> Option<Batcher<K, V>>
    where
        K: Send + Sync + 'static,
        V: Send + Sync + 'static,
    {
        self.batcher.downcast_ref::<Batcher<K, V>>().cloned()
    }

    /// Full type name of the wrapped batcher.
    pub fn value_type(&self) -> &'static str {
        self.value_type
    }

    /// Returns `true` if both handles point at the same batcher.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.batcher, &other.batcher)
    }
}

impl fmt::Debug for LoaderInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderInstance")
            .field("value_type", &self.value_type)
            .finish()
    }
}

impl<K, V> From<Batcher<K, V>> for LoaderInstance
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn from(batcher: Batcher<K, V>) -> Self {
        Self::new(batcher)
    }
}

/// A loader described only by its batch query.
///
/// `query` receives deduplicated keys and must return one value per key in
/// key order. Identity-bearing values can use
/// [`check_and_order`](QueryLoader::check_and_order) to get there.
#[async_trait]
pub trait QueryLoader: Send + Sync + 'static {
    type Key: Eq + Hash + Clone + Send + Sync + 'static;
    type Value: Clone + Send + Sync + 'static;

    /// Fetches values for `keys`.
    async fn query(&self, keys: &[Self::Key]) -> LoadResult<Vec<Self::Value>>;

    /// Batching behaviour for instances of this loader. `None` defers to the
    /// registry-wide default.
    fn batch_config(&self) -> Option<BatchConfig> {
        None
    }

    /// Name used in error messages.
    fn name(&self) -> &str {
        short_type_name::<Self>()
    }

    /// Aligns unordered `items` to `keys`, failing with the missing keys.
    fn check_and_order<I>(
        &self,
        keys: &[Self::Key],
        items: impl IntoIdentityMap<I, Self::Value>,
    ) -> LoadResult<Vec<Self::Value>>
    where
        Self::Key: Display,
        I: Display,
    {
        check_and_order(self.name(), keys, items)
    }
}

/// Strips the module path from a type name.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    let start = base.rfind("::").map_or(0, |idx| idx + 2);
    &full[start..]
}

/// Adapts a [`QueryLoader`] into a [`LoaderProvider`].
pub struct QueryProvider<L> {
    loader: Arc<L>,
    config: BatchConfig,
}

impl<L: QueryLoader> QueryProvider<L> {
    /// Wraps `loader`, using its own batch config or `fallback`.
    pub fn new(loader: L, fallback: BatchConfig) -> Self {
        let config = loader.batch_config().unwrap_or(fallback);
        Self {
            loader: Arc::new(loader),
            config,
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }
}

impl<L: QueryLoader> LoaderProvider for QueryProvider<L> {
    fn generate_loader(&self) -> LoaderInstance {
        let fetch = QueryBatch {
            loader: Arc::clone(&self.loader),
        };
        Batcher::with_config(fetch, self.config.clone()).into()
    }
}

struct QueryBatch<L> {
    loader: Arc<L>,
}

#[async_trait]
impl<L: QueryLoader> BatchFn<L::Key, L::Value> for QueryBatch<L> {
    async fn load(&self, keys: &[L::Key]) -> LoadResult<Vec<L::Value>> {
        self.loader.query(keys).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::reconcile::Identified;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Account {
        id: String,
    }

    impl Identified for Account {
        type Id = String;

        fn identity(&self) -> &String {
            &self.id
        }
    }

    /// Returns accounts in reverse order and skips "missing-id".
    #[derive(Default)]
    struct AccountLoader {
        queries: AtomicUsize,
    }

    #[async_trait]
    impl QueryLoader for AccountLoader {
        type Key = String;
        type Value = Account;

        async fn query(&self, keys: &[String]) -> LoadResult<Vec<Account>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            let rows: Vec<Account> = keys
                .iter()
                .rev()
                .filter(|k| k.as_str() != "missing-id")
                .map(|k| Account { id: k.clone() })
                .collect();
            self.check_and_order(keys, rows)
        }
    }

    #[test]
    fn test_short_type_name_strips_module_path() {
        assert_eq!(short_type_name::<AccountLoader>(), "AccountLoader");
        assert_eq!(short_type_name::<Vec<u32>>(), "Vec<u32>");
    }

    #[test]
    fn test_downcast_requires_matching_types() {
        let batcher = Batcher::new(crate::batch::batch_fn(|keys: Vec<u32>| async move { Ok(keys) }));
        let instance = LoaderInstance::new(batcher);

        assert!(instance.downcast::<u32, u32>().is_some());
        assert!(instance.downcast::<String, u32>().is_none());
        assert!(instance.value_type().contains("Batcher"));
    }

    #[tokio::test]
    async fn test_query_provider_orders_results() {
        let provider = QueryProvider::new(AccountLoader::default(), BatchConfig::default());
        let batcher = provider
            .generate_loader()
            .downcast::<String, Account>()
            .unwrap();

        let (a, b) = tokio::join!(batcher.load("a".to_string()), batcher.load("b".to_string()));

        assert_eq!(a.unwrap().id, "a");
        assert_eq!(b.unwrap().id, "b");
        assert_eq!(provider.loader().queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_query_provider_generates_fresh_instances() {
        let provider = QueryProvider::new(AccountLoader::default(), BatchConfig::default());

        let first = provider.generate_loader();
        let second = provider.generate_loader();

        assert!(!first.ptr_eq(&second));
    }

    #[tokio::test]
    async fn test_missing_key_names_loader() {
        let provider = QueryProvider::new(AccountLoader::default(), BatchConfig::default());
        let batcher = provider
            .generate_loader()
            .downcast::<String, Account>()
            .unwrap();

        let err = batcher.load("missing-id".to_string()).await.unwrap_err();

        assert_eq!(
            err,
            LoadError::MissingKeys {
                loader: "AccountLoader".to_string(),
                keys: vec!["missing-id".to_string()],
            }
        );
    }
}
