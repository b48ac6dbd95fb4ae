//! Ordering reconciliation for batch results.
//!
//! Backing stores rarely return rows in the order they were asked for, and
//! silently skip ids that do not exist. A batch function must hand back
//! exactly one value per key in key order, so [`reconcile`] rebuilds that
//! alignment from an identity index and refuses to return a short or padded
//! result.
//!
//! Identities are compared by their normalized string form (see
//! [`normalize_id`]), so a key and an item id that are distinct values in
//! memory still match when they denote the same logical id.

mod identity;

use std::collections::HashSet;
use std::fmt::Display;

use thiserror::Error;

use crate::error::{LoadError, LoadResult};

pub use identity::{normalize_id, Identified, IdentityMap};

/// Keys that had no matching item, in first-seen order.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("could not find {}", .keys.join(", "))]
pub struct MissingKeys {
    pub keys: Vec<String>,
}

/// Sources the reconciler can index: a list of identified items or a
/// prebuilt [`IdentityMap`].
pub trait IntoIdentityMap<I, V> {
    fn into_identity_map(self) -> IdentityMap<I, V>;
}

impl<I, V> IntoIdentityMap<I, V> for Vec<V>
where
    I: Display + Clone,
    V: Identified<Id = I>,
{
    fn into_identity_map(self) -> IdentityMap<I, V> {
        IdentityMap::from_items(self)
    }
}

impl<I, V> IntoIdentityMap<I, V> for IdentityMap<I, V> {
    fn into_identity_map(self) -> IdentityMap<I, V> {
        self
    }
}

/// Aligns `items` to `keys`.
///
/// The result has exactly `keys.len()` entries and entry `i` is the item whose
/// identity matches `keys[i]`. Duplicate keys receive a clone of the same item.
/// If any key has no item, no partial result is returned.
pub fn reconcile<K, I, V>(
    keys: &[K],
    items: impl IntoIdentityMap<I, V>,
) -> Result<Vec<V>, MissingKeys>
where
    K: Display,
    I: Display,
    V: Clone,
{
    let index = items.into_identity_map();
    let mut ordered = Vec::with_capacity(keys.len());
    let mut missing: Vec<String> = Vec::new();
    let mut seen_missing: HashSet<String> = HashSet::new();

    for key in keys {
        match index.get(key) {
            Some(item) => ordered.push(item.clone()),
            None => {
                let id = normalize_id(key);
                if seen_missing.insert(id.clone()) {
                    missing.push(id);
                }
            }
        }
    }

    if missing.is_empty() {
        Ok(ordered)
    } else {
        Err(MissingKeys { keys: missing })
    }
}

/// [`reconcile`] for use inside a batch function.
///
/// Misses become [`LoadError::MissingKeys`] naming `loader`, which the batcher
/// then delivers to every waiter of the batch.
pub fn check_and_order<K, I, V>(
    loader: &str,
    keys: &[K],
    items: impl IntoIdentityMap<I, V>,
) -> LoadResult<Vec<V>>
where
    K: Display,
    I: Display,
    V: Clone,
{
    reconcile(keys, items).map_err(|missing| LoadError::MissingKeys {
        loader: loader.to_string(),
        keys: missing.keys,
    })
}
