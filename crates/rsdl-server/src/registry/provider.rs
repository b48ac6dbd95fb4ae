//! Application-wide table of loader provider factories.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use rsdl_domain::batch::BatchConfig;
use rsdl_domain::loader::{LoaderProvider, QueryLoader, QueryProvider};

use super::types::{LoaderTypeId, RegistryError, RegistryResult, RequestScope};

/// Future returned by a provider factory.
pub type ProviderFuture = BoxFuture<'static, RegistryResult<Arc<dyn LoaderProvider>>>;

type ProviderFactory = Arc<dyn Fn(RequestScope) -> ProviderFuture + Send + Sync>;

/// Maps loader type ids to factories that build a provider for one request.
///
/// Built once at start-up and shared (behind an `Arc`) by every request.
/// Factories receive the request's [`RequestScope`], so whatever they build
/// is private to that request.
///
/// ```rust,ignore
/// let registry = ProviderRegistry::new()
///     .register_query("AccountLoader", move |_scope| AccountLoader::new(db.clone()));
/// ```
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    factories: HashMap<LoaderTypeId, ProviderFactory>,
    batch_config: BatchConfig,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("type_ids", &self.type_ids())
            .field("batch_config", &self.batch_config)
            .finish()
    }
}

impl ProviderRegistry {
    /// Creates an empty registry using the default batch configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry whose query loaders batch with `config`
    /// unless they override [`QueryLoader::batch_config`].
    pub fn with_batch_config(config: BatchConfig) -> Self {
        Self {
            factories: HashMap::new(),
            batch_config: config,
        }
    }

    pub fn batch_config(&self) -> &BatchConfig {
        &self.batch_config
    }

    /// Registers an async provider factory.
    ///
    /// Registering the same id twice replaces the earlier factory.
    pub fn register<F, Fut, P>(mut self, type_id: impl Into<LoaderTypeId>, factory: F) -> Self
    where
        F: Fn(RequestScope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RegistryResult<P>> + Send + 'static,
        P: LoaderProvider,
    {
        let factory: ProviderFactory = Arc::new(move |scope| {
            let pending = factory(scope);
            async move {
                let provider = pending.await?;
                Ok(Arc::new(provider) as Arc<dyn LoaderProvider>)
            }
            .boxed()
        });
        self.factories.insert(type_id.into(), factory);
        self
    }

    /// Registers a synchronous provider factory.
    pub fn provide<F, P>(self, type_id: impl Into<LoaderTypeId>, factory: F) -> Self
    where
        F: Fn(&RequestScope) -> P + Send + Sync + 'static,
        P: LoaderProvider,
    {
        self.register(type_id, move |scope| future::ready(Ok(factory(&scope))))
    }

    /// Registers a [`QueryLoader`] factory; instances are wrapped in a batcher.
    pub fn register_query<F, L>(self, type_id: impl Into<LoaderTypeId>, factory: F) -> Self
    where
        F: Fn(&RequestScope) -> L + Send + Sync + 'static,
        L: QueryLoader,
    {
        let config = self.batch_config.clone();
        self.provide(type_id, move |scope| {
            QueryProvider::new(factory(scope), config.clone())
        })
    }

    pub fn contains(&self, type_id: &LoaderTypeId) -> bool {
        self.factories.contains_key(type_id)
    }

    /// Registered ids, sorted.
    pub fn type_ids(&self) -> Vec<LoaderTypeId> {
        let mut ids: Vec<LoaderTypeId> = self.factories.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Builds the provider registered under `type_id` for one request.
    pub async fn resolve(
        &self,
        type_id: &LoaderTypeId,
        scope: &RequestScope,
    ) -> RegistryResult<Arc<dyn LoaderProvider>> {
        let factory = self
            .factories
            .get(type_id)
            .ok_or_else(|| RegistryError::ProviderNotFound {
                type_id: type_id.to_string(),
            })?;
        factory(scope.clone()).await
    }
}
