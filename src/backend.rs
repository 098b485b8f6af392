//! Pluggable map backends.
//!
//! Implement [`MapBackend`] to bring your own concurrent map. The store leans
//! on two conditional operations, [`insert_unless`](MapBackend::insert_unless)
//! and [`remove_if`](MapBackend::remove_if), being atomic per key. A backend
//! that does them as separate get + put calls will let two concurrent creates
//! of the same key both succeed.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

/// Trait that a concurrent map must satisfy to back a [`Store`](crate::Store).
///
/// Every method works with owned values so the store's code stays the same
/// whichever backend you pick.
pub trait MapBackend<K, V>: Send + Sync
where
    K: Hash + Eq + Send + Sync + Clone + Serialize + DeserializeOwned,
    V: Send + Sync + Clone + Serialize + DeserializeOwned,
{
    /// Insert a key-value pair, returning the previous value if any.
    fn insert(&self, key: K, value: V) -> Option<V>;

    /// Look up a value by key.
    fn get(&self, key: &K) -> Option<V>;

    /// Remove a key, returning its value if it was present.
    fn remove(&self, key: &K) -> Option<V>;

    /// Insert `value` unless the key holds a value for which `keep` returns
    /// `true`. Returns whether `value` was written. Must be atomic for the key.
    fn insert_unless<F>(&self, key: K, value: V, keep: F) -> bool
    where
        F: FnOnce(&V) -> bool;

    /// Remove the key only if `pred` holds for its current value. Must be
    /// atomic for the key.
    fn remove_if<F>(&self, key: &K, pred: F) -> Option<V>
    where
        F: FnOnce(&V) -> bool;

    /// Consistent snapshot of all entries. The returned iterator must not hold
    /// locks that would block concurrent writers.
    fn iter_snapshot(&self) -> Box<dyn Iterator<Item = (K, V)> + Send + '_>;

    /// Number of entries.
    fn map_len(&self) -> usize;
}

// ---- DashMap -----------------------------------------------------------------

impl<K, V> MapBackend<K, V> for dashmap::DashMap<K, V>
where
    K: Hash + Eq + Send + Sync + Clone + Serialize + DeserializeOwned,
    V: Send + Sync + Clone + Serialize + DeserializeOwned,
{
    fn insert(&self, key: K, value: V) -> Option<V> {
        dashmap::DashMap::insert(self, key, value)
    }

    fn get(&self, key: &K) -> Option<V> {
        dashmap::DashMap::get(self, key).map(|r| r.value().clone())
    }

    fn remove(&self, key: &K) -> Option<V> {
        dashmap::DashMap::remove(self, key).map(|(_, v)| v)
    }

    // The entry guard holds the shard write lock for the whole check.
    fn insert_unless<F>(&self, key: K, value: V, keep: F) -> bool
    where
        F: FnOnce(&V) -> bool,
    {
        match self.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(mut slot) => {
                if keep(slot.get()) {
                    return false;
                }
                slot.insert(value);
                true
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    fn remove_if<F>(&self, key: &K, pred: F) -> Option<V>
    where
        F: FnOnce(&V) -> bool,
    {
        dashmap::DashMap::remove_if(self, key, |_, v| pred(v)).map(|(_, v)| v)
    }

    fn iter_snapshot(&self) -> Box<dyn Iterator<Item = (K, V)> + Send + '_> {
        let snap: Vec<_> = self
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        Box::new(snap.into_iter())
    }

    fn map_len(&self) -> usize {
        self.len()
    }
}

// ---- RwLock<HashMap> ---------------------------------------------------------

impl<K, V> MapBackend<K, V> for parking_lot::RwLock<HashMap<K, V>>
where
    K: Hash + Eq + Send + Sync + Clone + Serialize + DeserializeOwned,
    V: Send + Sync + Clone + Serialize + DeserializeOwned,
{
    fn insert(&self, key: K, value: V) -> Option<V> {
        self.write().insert(key, value)
    }

    fn get(&self, key: &K) -> Option<V> {
        self.read().get(key).cloned()
    }

    fn remove(&self, key: &K) -> Option<V> {
        self.write().remove(key)
    }

    fn insert_unless<F>(&self, key: K, value: V, keep: F) -> bool
    where
        F: FnOnce(&V) -> bool,
    {
        let mut map = self.write();
        match map.entry(key) {
            Entry::Occupied(mut slot) => {
                if keep(slot.get()) {
                    return false;
                }
                slot.insert(value);
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    fn remove_if<F>(&self, key: &K, pred: F) -> Option<V>
    where
        F: FnOnce(&V) -> bool,
    {
        let mut map = self.write();
        if map.get(key).is_some_and(pred) {
            map.remove(key)
        } else {
            None
        }
    }

    fn iter_snapshot(&self) -> Box<dyn Iterator<Item = (K, V)> + Send + '_> {
        let snap: Vec<_> = self
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Box::new(snap.into_iter())
    }

    fn map_len(&self) -> usize {
        self.read().len()
    }
}
