//! rsdl-domain: Core batching logic
//!
//! This crate contains the request-independent building blocks:
//! - Keyed batch cache that coalesces lookups into one fetch
//! - Ordering reconciliation of unordered fetch results
//! - Loader contracts used by the request-scoped registry
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 rsdl-domain                 │
//! ├─────────────────────────────────────────────┤
//! │  batch/     - Coalescing batcher            │
//! │  reconcile/ - Key order reconciliation      │
//! │  loader/    - Loader provider contracts     │
//! └─────────────────────────────────────────────┘
//! ```

pub mod batch;
pub mod error;
pub mod loader;
pub mod reconcile;

// Re-export commonly used types at the crate root
pub use batch::{batch_fn, BatchConfig, BatchFn, Batcher};
pub use error::{LoadError, LoadResult};
pub use loader::{LoaderInstance, LoaderProvider, QueryLoader, QueryProvider};
pub use reconcile::{check_and_order, reconcile, Identified, IdentityMap, MissingKeys};
