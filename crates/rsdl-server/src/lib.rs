//! rsdl-server: Request-scoped loader registry
//!
//! This crate binds loaders to the lifetime of one request:
//! - Provider registry mapping loader ids to factories
//! - Per-request loader context with get-or-create semantics
//! - Configuration management
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 rsdl-server                 │
//! ├─────────────────────────────────────────────┤
//! │  config.rs   - Configuration management     │
//! │  registry/   - Request-scoped loaders       │
//! │    provider.rs - Provider factories         │
//! │    context.rs  - Per-request store          │
//! └─────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod registry;

// Re-exports for convenience
pub use config::{ConfigLoadError, LoaderSettings};
pub use registry::{
    LoaderContext, LoaderTypeId, NamedLoader, ProviderRegistry, RegistryError, RegistryResult,
    RequestScope,
};
