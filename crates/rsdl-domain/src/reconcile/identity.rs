//! Identity-keyed map used by the ordering reconciler.

use std::collections::hash_map::{self, HashMap};
use std::fmt::{self, Display};

use serde::ser::{Serialize, SerializeMap, Serializer};

/// An item carrying a recognizable identity field.
pub trait Identified {
    /// The identity type. Compared by its `Display` form.
    type Id: Display;

    /// Returns the identity of this item.
    fn identity(&self) -> &Self::Id;
}

/// Returns the stable string form used to compare identities.
///
/// Two ids are considered equal when their normalized forms match, even if
/// they are different values (or different types) in memory.
pub fn normalize_id(id: &impl Display) -> String {
    id.to_string()
}

/// Map keyed by normalized identity that remembers the original id value.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityMap<I, V> {
    entries: HashMap<String, (I, V)>,
}

impl<I, V> Default for IdentityMap<I, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<I: Display, V> IdentityMap<I, V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from items using each item's identity.
    pub fn from_items(items: impl IntoIterator<Item = V>) -> Self
    where
        V: Identified<Id = I>,
        I: Clone,
    {
        items
            .into_iter()
            .map(|item| (item.identity().clone(), item))
            .collect()
    }

    /// Inserts a value, returning the previous value for an equivalent id.
    pub fn insert(&mut self, id: I, value: V) -> Option<V> {
        self.entries
            .insert(normalize_id(&id), (id, value))
            .map(|(_, previous)| previous)
    }

    /// Looks up a value by any id with the same normalized form.
    pub fn get(&self, id: &impl Display) -> Option<&V> {
        self.entries.get(&normalize_id(id)).map(|(_, value)| value)
    }

    /// Returns `true` if an equivalent id is present.
    pub fn contains(&self, id: &impl Display) -> bool {
        self.entries.contains_key(&normalize_id(id))
    }

    /// Removes the entry for an equivalent id.
    pub fn remove(&mut self, id: &impl Display) -> Option<V> {
        self.entries
            .remove(&normalize_id(id))
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Original id values, in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = &I> {
        self.entries.values().map(|(id, _)| id)
    }

    /// Stored values, in arbitrary order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values().map(|(_, value)| value)
    }

    /// `(id, value)` pairs, in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&I, &V)> {
        self.entries.values().map(|(id, value)| (id, value))
    }
}

impl<I: Display, V> FromIterator<(I, V)> for IdentityMap<I, V> {
    fn from_iter<T: IntoIterator<Item = (I, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (id, value) in iter {
            map.insert(id, value);
        }
        map
    }
}

impl<I, V> IntoIterator for IdentityMap<I, V> {
    type Item = (I, V);
    type IntoIter = hash_map::IntoValues<String, (I, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}

impl<I, V: fmt::Debug> fmt::Debug for IdentityMap<I, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(key, (_, value))| (key, value)))
            .finish()
    }
}

/// Serializes as an object keyed by the normalized id.
impl<I, V: Serialize> Serialize for IdentityMap<I, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, (_, value)) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
