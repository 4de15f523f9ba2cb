//! The generic dependency-tracked memo table every layer is built on.
//!
//! A table memoizes `key -> value` for one layer. Reads may carry a
//! *trigger* (the downstream key on whose behalf the read happens); the
//! table records `(key, trigger)` edges so an invalidation of `key` can
//! report exactly which downstream triggers must be invalidated next.
//!
//! Readers record into the shared maps behind `RwLock`s; the update phase is
//! serialized by the scheduler, so writers never race readers within one
//! generation.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::hash::Hash;
use std::sync::RwLock;

pub struct EnvironmentTable<K, V, T> {
    entries: RwLock<FxHashMap<K, V>>,
    dependents: RwLock<FxHashMap<K, FxHashSet<T>>>,
    track_dependencies: bool,
}

impl<K, V, T> Default for EnvironmentTable<K, V, T>
where
    K: Eq + Hash + Clone,
    V: Clone,
    T: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, T> EnvironmentTable<K, V, T>
where
    K: Eq + Hash + Clone,
    V: Clone,
    T: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            dependents: RwLock::new(FxHashMap::default()),
            track_dependencies: true,
        }
    }

    pub fn without_dependency_tracking() -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            dependents: RwLock::new(FxHashMap::default()),
            track_dependencies: false,
        }
    }

    /// Memoized read. `trigger` names the downstream key performing the
    /// read; it is recorded as a dependent of `key`.
    pub fn get_or_produce(&self, key: &K, trigger: Option<&T>, produce: impl FnOnce() -> V) -> V {
        if let Some(trigger) = trigger {
            if self.track_dependencies {
                self.dependents
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .entry(key.clone())
                    .or_default()
                    .insert(trigger.clone());
            }
        }
        if let Some(value) = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
        {
            return value.clone();
        }
        let value = produce();
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(key.clone())
            .or_insert(value)
            .clone()
    }

    pub fn peek(&self, key: &K) -> Option<V> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    /// Drop the given keys and report the triggers that depended on them.
    pub fn invalidate<'a>(&self, keys: impl IntoIterator<Item = &'a K>) -> Vec<T>
    where
        K: 'a,
    {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let mut dependents = self.dependents.write().unwrap_or_else(|e| e.into_inner());
        let mut triggers = FxHashSet::default();
        for key in keys {
            entries.remove(key);
            if let Some(dependent) = dependents.remove(key) {
                triggers.extend(dependent);
            }
        }
        triggers.into_iter().collect()
    }

    /// Drop everything; the blunt fallback when a change cannot be scoped.
    pub fn clear(&self) -> Vec<T> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let mut dependents = self.dependents.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
        let mut triggers = FxHashSet::default();
        for (_, dependent) in dependents.drain() {
            triggers.extend(dependent);
        }
        triggers.into_iter().collect()
    }

    pub fn keys(&self) -> Vec<K> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V, T> EnvironmentTable<K, V, T>
where
    K: Eq + Hash + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
    T: Eq + Hash + Clone,
{
    /// Serialize the `(key, value)` pairs for saved-state restart. The
    /// format is opaque to callers; it only promises `equal_value`
    /// round-tripping through `load_tables`.
    pub fn serialize_tables(&self) -> serde_json::Result<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let pairs: Vec<(&K, &V)> = entries.iter().collect();
        serde_json::to_string(&pairs)
    }

    pub fn load_tables(&self, serialized: &str) -> serde_json::Result<()> {
        let pairs: Vec<(K, V)> = serde_json::from_str(serialized)?;
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        for (key, value) in pairs {
            entries.insert(key, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memoizes_and_invalidates() {
        let table: EnvironmentTable<String, usize, String> = EnvironmentTable::new();
        let mut produced = 0;
        let mut read = |table: &EnvironmentTable<String, usize, String>, produced: &mut usize| {
            table.get_or_produce(&"k".to_string(), Some(&"t".to_string()), || {
                *produced += 1;
                41 + *produced
            })
        };
        assert_eq!(read(&table, &mut produced), 42);
        assert_eq!(read(&table, &mut produced), 42, "second read is memoized");
        assert_eq!(produced, 1);

        let triggers = table.invalidate([&"k".to_string()]);
        assert_eq!(triggers, vec!["t".to_string()]);
        assert_eq!(read(&table, &mut produced), 43, "invalidated key reproduces");
    }

    #[test]
    fn serialization_round_trips() {
        let table: EnvironmentTable<String, usize, ()> = EnvironmentTable::new();
        table.get_or_produce(&"a".to_string(), None, || 1);
        table.get_or_produce(&"b".to_string(), None, || 2);
        let serialized = table.serialize_tables().unwrap();

        let restored: EnvironmentTable<String, usize, ()> = EnvironmentTable::new();
        restored.load_tables(&serialized).unwrap();
        assert_eq!(restored.peek(&"a".to_string()), Some(1));
        assert_eq!(restored.peek(&"b".to_string()), Some(2));
    }
}
