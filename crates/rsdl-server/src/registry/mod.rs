//! Request-scoped loader registry.
//!
//! Binds loader instances to the lifetime of one inbound request:
//!
//! 1. **Provider registry**: application-wide table from [`LoaderTypeId`] to
//!    a factory that builds a provider for a given [`RequestScope`]
//! 2. **Loader context**: per-request store, installed once per request by
//!    the host's install hook, that lazily creates and memoizes one loader
//!    per id
//!
//! ```text
//! request ──► install hook ──► LoaderContext (empty)
//!                                   │
//!   step A: get_loader("Account") ──┤ claim slot ─► resolve provider ─► generate_loader
//!   step B: get_loader("Account") ──┘ reuse slot ─────────────────────► same instance
//! ```
//!
//! Loaders are discarded with the request; there is no cross-request cache.

mod context;
mod provider;
mod types;

pub use context::LoaderContext;
pub use provider::{ProviderFuture, ProviderRegistry};
pub use types::{
    LoaderTypeId, NamedLoader, RegistryError, RegistryResult, RequestScope, REQUEST_ID_HEADER,
};
