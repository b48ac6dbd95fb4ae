//! Observability infrastructure.
//!
//! Structured logging configuration for services that host request-scoped
//! loaders.

mod logging;

pub use logging::{create_json_layer, init_logging, LoggingConfig};
