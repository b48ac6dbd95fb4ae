//! Handler-side accessors for request-scoped loaders.
//!
//! ```rust,ignore
//! async fn get_account(
//!     Path(id): Path<String>,
//!     accounts: Loader<AccountLoader>,
//! ) -> Result<Json<Account>, ApiError> {
//!     Ok(Json(accounts.load(id).await?))
//! }
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use rsdl_domain::batch::Batcher;
use rsdl_server::registry::{LoaderContext, NamedLoader, RegistryError};

use crate::errors::{ApiError, ErrorConfig};

/// The request's loader context, as installed by
/// [`LoaderLayer`](crate::middleware::LoaderLayer).
#[derive(Debug, Clone)]
pub struct RequestLoaders(pub Arc<LoaderContext>);

#[async_trait]
impl<S> FromRequestParts<S> for RequestLoaders
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        installed_context(parts)
            .map(RequestLoaders)
            .map_err(|err| rejection(parts, &err))
    }
}

/// Injects the request's loader for `L`, resolving it on first use.
///
/// Every extractor and [`LoaderContext::loader`] call for the same `L` within
/// one request yields the same batcher.
///
/// Dereferences to the [`Batcher`].
pub struct Loader<L: NamedLoader>(Batcher<L::Key, L::Value>, PhantomData<fn() -> L>);

impl<L: NamedLoader> Loader<L> {
    pub fn into_inner(self) -> Batcher<L::Key, L::Value> {
        self.0
    }
}

impl<L: NamedLoader> std::ops::Deref for Loader<L> {
    type Target = Batcher<L::Key, L::Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S, L> FromRequestParts<S> for Loader<L>
where
    S: Send + Sync,
    L: NamedLoader,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = installed_context(parts).map_err(|err| rejection(parts, &err))?;
        match context.loader::<L>().await {
            Ok(batcher) => Ok(Loader(batcher, PhantomData)),
            Err(err) => Err(rejection(parts, &err)),
        }
    }
}

fn installed_context(parts: &Parts) -> Result<Arc<LoaderContext>, RegistryError> {
    parts
        .extensions
        .get::<Arc<LoaderContext>>()
        .cloned()
        .ok_or(RegistryError::NotInstalled)
}

// An `ErrorConfig` extension on the router overrides the production default.
fn rejection(parts: &Parts, err: &RegistryError) -> ApiError {
    let config = parts
        .extensions
        .get::<ErrorConfig>()
        .cloned()
        .unwrap_or_else(ErrorConfig::production);
    ApiError::from_registry_error(err, &config)
}
