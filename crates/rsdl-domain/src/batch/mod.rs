//! Keyed batch cache.
//!
//! A [`Batcher`] collects individual `load(key)` calls issued close together,
//! hands the deduplicated keys to a [`BatchFn`] once, and fans the results
//! back out to every caller. Scheduling, dedup and caching are delegated to
//! the `async-graphql` dataloader; this module keeps the positional
//! [`BatchFn`] contract on top of it.
//!
//! # Batching window
//!
//! Tasks on a multi-threaded runtime do not share a single "tick", so a batch
//! stays open for [`BatchConfig::delay`] after its first key arrives. That
//! window is the tunable for batching granularity:
//!
//! - longer windows collect more keys per call at the cost of latency
//! - `Duration::ZERO` dispatches on the next timer tick, which is enough for
//!   futures joined within the same task
//!
//! # Failure propagation
//!
//! A failed batch function call rejects every waiter of that batch with the
//! same error. So does one returning the wrong number of values, or one that
//! panics. Failed keys are never cached, so later loads retry.

mod batcher;
mod types;

pub use batcher::Batcher;
pub use types::{batch_fn, BatchConfig, BatchFn, FnBatch, DEFAULT_BATCH_DELAY};
