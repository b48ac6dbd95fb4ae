//! Identifiers, scope token and errors for the loader registry.

use std::borrow::Cow;
use std::fmt;
use std::hash::Hash;

use uuid::Uuid;

/// HTTP header carrying the caller's correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Names a loader implementation.
///
/// Used both to look up the registered provider factory and as the key of
/// the per-request loader store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoaderTypeId(Cow<'static, str>);

impl LoaderTypeId {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LoaderTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for LoaderTypeId {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for LoaderTypeId {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

/// A loader with a statically known identity and key/value types.
///
/// ```rust,ignore
/// struct AccountLoader;
///
/// impl NamedLoader for AccountLoader {
///     const TYPE_ID: &'static str = "AccountLoader";
///     type Key = String;
///     type Value = Account;
/// }
///
/// let accounts = context.loader::<AccountLoader>().await?;
/// ```
pub trait NamedLoader: 'static {
    const TYPE_ID: &'static str;
    type Key: Eq + Hash + Clone + Send + Sync + 'static;
    type Value: Clone + Send + Sync + 'static;

    fn loader_type_id() -> LoaderTypeId {
        LoaderTypeId::from_static(Self::TYPE_ID)
    }
}

/// Scoping token minted once per request.
///
/// Provider factories receive it so they can build request-scoped state.
/// Two requests never share a scope id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestScope {
    id: Uuid,
    request_id: Option<String>,
}

impl RequestScope {
    /// Mints a new scope with a random id.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id: None,
        }
    }

    /// Attaches the caller's correlation id.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The inbound `x-request-id`, if the caller sent one.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}

impl Default for RequestScope {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors raised while wiring or resolving request-scoped loaders.
///
/// All variants indicate a deployment or wiring problem rather than a
/// data problem. The type is `Clone` because every caller waiting on the same
/// resolution receives the error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The install hook did not run for this request.
    #[error("loader registry is not installed for this request; add LoaderLayer to the router globally")]
    NotInstalled,

    /// No provider is registered under the requested id.
    #[error("the loader {type_id} is not provided; register it with the provider registry")]
    ProviderNotFound { type_id: String },

    /// The provider factory failed.
    #[error("the loader {type_id} is not provided: {message}")]
    ResolutionFailed { type_id: String, message: String },

    /// The registered loader has different key/value types than requested.
    #[error("loader {type_id} produces {actual}, not {expected}")]
    TypeMismatch {
        type_id: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl RegistryError {
    /// Wraps a provider factory failure.
    pub fn resolution(type_id: &LoaderTypeId, cause: impl fmt::Display) -> Self {
        RegistryError::ResolutionFailed {
            type_id: type_id.to_string(),
            message: cause.to_string(),
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
