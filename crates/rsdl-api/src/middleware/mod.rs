//! API middleware.
//!
//! Includes:
//! - Loader context installation (the per-request install hook)

mod loader_layer;

pub use loader_layer::{LoaderLayer, LoaderService};
