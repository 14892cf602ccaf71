//! Multi-map secondary index
//!
//! Maps a projected key to the set of primary keys carrying it. Used by the
//! edge index for its from/to adjacency and by the node index collections.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, BTreeSet};
use std::hash::Hash;

/// Key -> set of primary keys
#[derive(Debug, Clone)]
pub struct SecondaryIndex<K, V> {
    index: FxHashMap<K, FxHashSet<V>>,
}

impl<K, V> SecondaryIndex<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            index: FxHashMap::default(),
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.index.entry(key).or_default().insert(value);
    }

    /// Remove one primary key; the entry disappears when its set empties
    pub fn remove(&mut self, key: &K, value: &V) -> bool {
        let Some(values) = self.index.get_mut(key) else {
            return false;
        };

        let removed = values.remove(value);
        if values.is_empty() {
            self.index.remove(key);
        }
        removed
    }

    pub fn get(&self, key: &K) -> Vec<V> {
        self.index
            .get(key)
            .map(|values| values.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_set(&self, key: &K) -> Option<&FxHashSet<V>> {
        self.index.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn clear(&mut self) {
        self.index.clear();
    }
}

impl<K, V> SecondaryIndex<K, V>
where
    K: Eq + Hash + Clone + Ord,
    V: Eq + Hash + Clone + Ord,
{
    /// Ordered copy of the full contents, for comparisons and diagnostics
    pub fn snapshot(&self) -> BTreeMap<K, BTreeSet<V>> {
        self.index
            .iter()
            .map(|(k, values)| (k.clone(), values.iter().cloned().collect()))
            .collect()
    }
}

impl<K, V> Default for SecondaryIndex<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secondary_index_ops() {
        let mut index: SecondaryIndex<String, u32> = SecondaryIndex::new();
        let key = "node1".to_string();

        index.insert(key.clone(), 1);
        index.insert(key.clone(), 2);

        let mut results = index.get(&key);
        results.sort();
        assert_eq!(results, vec![1, 2]);

        assert!(index.remove(&key, &1));
        assert_eq!(index.get(&key), vec![2]);

        assert!(index.remove(&key, &2));
        assert!(!index.contains_key(&key));
        assert!(index.is_empty());
        assert!(!index.remove(&key, &2));
    }

    #[test]
    fn test_snapshot_is_ordered() {
        let mut index: SecondaryIndex<String, u32> = SecondaryIndex::new();
        index.insert("b".to_string(), 2);
        index.insert("a".to_string(), 3);
        index.insert("a".to_string(), 1);

        let snapshot = index.snapshot();
        let keys: Vec<_> = snapshot.keys().cloned().collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(snapshot["a"].iter().cloned().collect::<Vec<_>>(), vec![1, 3]);
    }
}
