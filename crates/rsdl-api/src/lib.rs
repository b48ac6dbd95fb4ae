//! rsdl-api: axum/tower integration for request-scoped loaders
//!
//! This crate connects the loader registry to an HTTP host:
//! - Install hook middleware creating one loader context per request
//! - Extractors handing loaders to handlers
//! - Error classification and JSON error responses
//! - Structured logging setup
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  rsdl-api                   │
//! ├─────────────────────────────────────────────┤
//! │  middleware/    - LoaderLayer install hook  │
//! │  extract.rs     - Loader, RequestLoaders    │
//! │  errors.rs      - Error classification      │
//! │  observability/ - Structured logging        │
//! └─────────────────────────────────────────────┘
//! ```

pub mod errors;
pub mod extract;
pub mod middleware;
pub mod observability;

pub use errors::{ApiError, ErrorConfig};
pub use extract::{Loader, RequestLoaders};
pub use middleware::LoaderLayer;
