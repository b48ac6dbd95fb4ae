//! Per-request loader store.

use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use rsdl_domain::batch::Batcher;
use rsdl_domain::loader::LoaderInstance;
use tracing::debug;

use super::provider::ProviderRegistry;
use super::types::{LoaderTypeId, NamedLoader, RegistryError, RegistryResult, RequestScope};

/// A loader resolution that every caller for the same id can await.
type SharedResolution = Shared<BoxFuture<'static, RegistryResult<LoaderInstance>>>;

/// Loader store for a single request.
///
/// Holds at most one loader instance per [`LoaderTypeId`]. Every resolution
/// step of the request that asks for the same id receives the same instance,
/// so their `load` calls land in the same batches. Dropped together with the
/// request; nothing is shared across requests.
///
/// # Concurrency
///
/// The slot for an id is claimed through the map's entry API when
/// [`get_loader`](Self::get_loader) is called, before the returned future is
/// first polled, so concurrent callers cannot race into two separate
/// resolutions. Entries are only ever added, except that a failed
/// resolution is removed again so a later call can retry.
pub struct LoaderContext {
    registry: Arc<ProviderRegistry>,
    scope: RequestScope,
    loaders: DashMap<LoaderTypeId, SharedResolution>,
}

impl fmt::Debug for LoaderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderContext")
            .field("scope", &self.scope)
            .field("loaded_types", &self.loaded_types())
            .finish()
    }
}

impl LoaderContext {
    /// Creates an empty store for the request identified by `scope`.
    pub fn new(registry: Arc<ProviderRegistry>, scope: RequestScope) -> Self {
        Self {
            registry,
            scope,
            loaders: DashMap::new(),
        }
    }

    pub fn scope(&self) -> &RequestScope {
        &self.scope
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Returns the request's loader for `type_id`, creating it on first use.
    ///
    /// The slot is claimed by this call, not by the first poll of the
    /// returned future. Every call made before the resolution settles joins
    /// it and observes the same instance. If the provider cannot be
    /// resolved, every joined caller receives the error and the slot is
    /// released, so a call made afterwards starts a fresh resolution.
    pub fn get_loader(
        &self,
        type_id: impl Into<LoaderTypeId>,
    ) -> impl Future<Output = RegistryResult<LoaderInstance>> + Send + '_ {
        let type_id = type_id.into();
        let resolution = self.claim(&type_id);

        async move {
            let outcome = resolution.clone().await;

            if let Err(err) = &outcome {
                // Only release the slot if it still holds this attempt.
                let released = self
                    .loaders
                    .remove_if(&type_id, |_, current| current.ptr_eq(&resolution))
                    .is_some();
                if released {
                    debug!(
                        target: "rsdl::registry",
                        scope = %self.scope.id(),
                        loader = %type_id,
                        error = %err,
                        "loader resolution failed"
                    );
                }
            }

            outcome
        }
    }

    /// Typed variant of [`get_loader`](Self::get_loader).
    pub fn get<K, V>(
        &self,
        type_id: impl Into<LoaderTypeId>,
    ) -> impl Future<Output = RegistryResult<Batcher<K, V>>> + Send + '_
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let type_id = type_id.into();
        let pending = self.get_loader(type_id.clone());

        async move {
            let instance = pending.await?;
            instance
                .downcast::<K, V>()
                .ok_or_else(|| RegistryError::TypeMismatch {
                    type_id: type_id.to_string(),
                    expected: type_name::<Batcher<K, V>>(),
                    actual: instance.value_type(),
                })
        }
    }

    /// Returns the request's loader for a [`NamedLoader`].
    pub fn loader<L: NamedLoader>(
        &self,
    ) -> impl Future<Output = RegistryResult<Batcher<L::Key, L::Value>>> + Send + '_ {
        self.get::<L::Key, L::Value>(L::loader_type_id())
    }

    /// Ids with a live slot (resolved or still resolving), sorted.
    pub fn loaded_types(&self) -> Vec<LoaderTypeId> {
        let mut ids: Vec<LoaderTypeId> = self
            .loaders
            .iter()
            .filter(|e| !matches!(e.value().peek(), Some(Err(_))))
            .map(|e| e.key().clone())
            .collect();
        ids.sort();
        ids
    }

    /// Returns the live resolution for `type_id` or claims the slot with a
    /// new one. Never awaits.
    fn claim(&self, type_id: &LoaderTypeId) -> SharedResolution {
        match self.loaders.entry(type_id.clone()) {
            // A settled failure not yet released by its waiters is replaced.
            Entry::Occupied(mut entry) if matches!(entry.get().peek(), Some(Err(_))) => {
                let resolution = self.resolve(type_id.clone());
                entry.insert(resolution.clone());
                resolution
            }
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let resolution = self.resolve(type_id.clone());
                entry.insert(resolution.clone());
                resolution
            }
        }
    }

    fn resolve(&self, type_id: LoaderTypeId) -> SharedResolution {
        let registry = Arc::clone(&self.registry);
        let scope = self.scope.clone();
        async move {
            let provider = registry.resolve(&type_id, &scope).await?;
            let instance = provider.generate_loader();
            debug!(
                target: "rsdl::registry",
                scope = %scope.id(),
                loader = %type_id,
                value_type = instance.value_type(),
                "loader created"
            );
            Ok(instance)
        }
        .boxed()
        .shared()
    }
}
