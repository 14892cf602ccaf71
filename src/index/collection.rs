//! Named collection of secondary indexes over a primary collection
//!
//! Handles creation, removal and maintenance of unique and non-unique
//! indexes. Index names are case-insensitive.

use super::secondary_index::SecondaryIndex;
use crate::error::{GraphError, GraphResult};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Projection of an entity onto an index key; `None` leaves it unindexed
pub type Projection<T> = Arc<dyn Fn(&T) -> Option<String> + Send + Sync>;

/// How projected keys are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyComparer {
    #[default]
    Ordinal,
    IgnoreCase,
}

impl KeyComparer {
    pub fn normalize(&self, value: &str) -> String {
        match self {
            KeyComparer::Ordinal => value.to_string(),
            KeyComparer::IgnoreCase => value.to_lowercase(),
        }
    }
}

/// One secondary index: projected key -> primary keys
pub struct IndexEntry<T> {
    name: String,
    unique: bool,
    comparer: KeyComparer,
    projection: Projection<T>,
    map: SecondaryIndex<String, String>,
}

impl<T> IndexEntry<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    fn project(&self, item: &T) -> Option<String> {
        (self.projection)(item).map(|value| self.comparer.normalize(&value))
    }

    /// Primary keys stored under `value`
    pub fn lookup(&self, value: &str) -> Vec<String> {
        let mut keys = self.map.get(&self.comparer.normalize(value));
        keys.sort();
        keys
    }

    pub fn snapshot(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.map.snapshot()
    }

    /// Would indexing `item` under `primary_key` violate uniqueness?
    fn violates(&self, primary_key: &str, item: &T) -> bool {
        if !self.unique {
            return false;
        }
        let Some(key) = self.project(item) else {
            return false;
        };
        match self.map.get_set(&key) {
            Some(existing) => existing.iter().any(|pk| pk != primary_key),
            None => false,
        }
    }
}

impl<T> fmt::Debug for IndexEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexEntry")
            .field("name", &self.name)
            .field("unique", &self.unique)
            .field("comparer", &self.comparer)
            .field("keys", &self.map.len())
            .finish()
    }
}

/// All secondary indexes registered on one primary collection
pub struct SecondaryIndexCollection<T> {
    indexes: IndexMap<String, IndexEntry<T>>,
}

impl<T> SecondaryIndexCollection<T> {
    pub fn new() -> Self {
        Self {
            indexes: IndexMap::new(),
        }
    }

    /// Create a unique index and backfill it from `existing`
    pub fn create_unique_index<'a, I>(
        &mut self,
        name: &str,
        projection: Projection<T>,
        comparer: KeyComparer,
        existing: I,
    ) -> GraphResult<()>
    where
        T: 'a,
        I: IntoIterator<Item = (&'a String, &'a T)>,
    {
        self.create_index(name, true, projection, comparer, existing)
    }

    /// Create a non-unique index and backfill it from `existing`
    pub fn create_non_unique_index<'a, I>(
        &mut self,
        name: &str,
        projection: Projection<T>,
        comparer: KeyComparer,
        existing: I,
    ) -> GraphResult<()>
    where
        T: 'a,
        I: IntoIterator<Item = (&'a String, &'a T)>,
    {
        self.create_index(name, false, projection, comparer, existing)
    }

    fn create_index<'a, I>(
        &mut self,
        name: &str,
        unique: bool,
        projection: Projection<T>,
        comparer: KeyComparer,
        existing: I,
    ) -> GraphResult<()>
    where
        T: 'a,
        I: IntoIterator<Item = (&'a String, &'a T)>,
    {
        let id = name.to_lowercase();
        if self.indexes.contains_key(&id) {
            return Err(GraphError::conflict(format!("index '{}' already exists", name)));
        }

        let mut entry = IndexEntry {
            name: name.to_string(),
            unique,
            comparer,
            projection,
            map: SecondaryIndex::new(),
        };

        for (primary_key, item) in existing {
            if entry.violates(primary_key, item) {
                return Err(GraphError::conflict(format!(
                    "unique index '{}' violated by '{}'",
                    name, primary_key
                )));
            }
            if let Some(key) = entry.project(item) {
                entry.map.insert(key, primary_key.clone());
            }
        }

        debug!("Created secondary index '{}' (unique={})", name, unique);
        self.indexes.insert(id, entry);
        Ok(())
    }

    pub fn remove_index(&mut self, name: &str) -> bool {
        self.indexes.shift_remove(&name.to_lowercase()).is_some()
    }

    pub fn get_index(&self, name: &str) -> Option<&IndexEntry<T>> {
        self.indexes.get(&name.to_lowercase())
    }

    pub fn names(&self) -> Vec<String> {
        self.indexes.values().map(|e| e.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Fail with `Conflict` if adding `item` would break a unique index
    pub fn check(&self, primary_key: &str, item: &T) -> GraphResult<()> {
        match self.indexes.values().find(|e| e.violates(primary_key, item)) {
            Some(entry) => Err(GraphError::conflict(format!(
                "unique index '{}' violated by '{}'",
                entry.name, primary_key
            ))),
            None => Ok(()),
        }
    }

    pub fn on_add(&mut self, primary_key: &str, item: &T) {
        for entry in self.indexes.values_mut() {
            if let Some(key) = entry.project(item) {
                entry.map.insert(key, primary_key.to_string());
            }
        }
    }

    pub fn on_remove(&mut self, primary_key: &str, item: &T) {
        for entry in self.indexes.values_mut() {
            if let Some(key) = entry.project(item) {
                entry.map.remove(&key, &primary_key.to_string());
            }
        }
    }

    /// Same index definitions with no entries
    pub fn empty_copy(&self) -> Self {
        let indexes = self
            .indexes
            .iter()
            .map(|(key, entry)| {
                let copy = IndexEntry {
                    name: entry.name.clone(),
                    unique: entry.unique,
                    comparer: entry.comparer,
                    projection: entry.projection.clone(),
                    map: SecondaryIndex::new(),
                };
                (key.clone(), copy)
            })
            .collect();
        Self { indexes }
    }

    /// Empty every index, keeping their definitions
    pub fn clear(&mut self) {
        for entry in self.indexes.values_mut() {
            entry.map.clear();
        }
    }
}

impl<T> Default for SecondaryIndexCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SecondaryIndexCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.indexes.values()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_first_char() -> Projection<String> {
        Arc::new(|s: &String| s.chars().next().map(|c| c.to_string()))
    }

    #[test]
    fn test_create_and_lookup() {
        let rows = vec![("k1".to_string(), "apple".to_string()), ("k2".to_string(), "avocado".to_string())];
        let mut collection = SecondaryIndexCollection::new();
        collection
            .create_non_unique_index("first", by_first_char(), KeyComparer::Ordinal, rows.iter().map(|(k, v)| (k, v)))
            .unwrap();

        assert_eq!(collection.get_index("FIRST").unwrap().lookup("a"), vec!["k1", "k2"]);
    }

    #[test]
    fn test_duplicate_index_name_conflicts() {
        let mut collection: SecondaryIndexCollection<String> = SecondaryIndexCollection::new();
        collection.create_unique_index("name", by_first_char(), KeyComparer::Ordinal, []).unwrap();
        let err = collection
            .create_unique_index("NAME", by_first_char(), KeyComparer::Ordinal, [])
            .unwrap_err();
        assert!(matches!(err, GraphError::Conflict(_)));
    }

    #[test]
    fn test_unique_backfill_violation() {
        let rows = vec![("k1".to_string(), "apple".to_string()), ("k2".to_string(), "avocado".to_string())];
        let mut collection = SecondaryIndexCollection::new();
        let result =
            collection.create_unique_index("first", by_first_char(), KeyComparer::Ordinal, rows.iter().map(|(k, v)| (k, v)));
        assert!(result.is_err());
        assert!(collection.get_index("first").is_none());
    }

    #[test]
    fn test_unique_check_and_maintenance() {
        let mut collection = SecondaryIndexCollection::new();
        collection.create_unique_index("first", by_first_char(), KeyComparer::IgnoreCase, []).unwrap();

        let apple = "Apple".to_string();
        collection.check("k1", &apple).unwrap();
        collection.on_add("k1", &apple);

        let avocado = "avocado".to_string();
        assert!(collection.check("k2", &avocado).is_err());
        // Same primary key may be re-indexed
        assert!(collection.check("k1", &avocado).is_ok());

        collection.on_remove("k1", &apple);
        assert!(collection.check("k2", &avocado).is_ok());

        collection.on_add("k2", &avocado);
        collection.clear();
        assert!(collection.get_index("first").unwrap().lookup("a").is_empty());
        assert!(collection.remove_index("First"));
        assert!(collection.is_empty());
    }

    #[test]
    fn test_empty_copy_keeps_definitions() {
        let rows = vec![("k1".to_string(), "apple".to_string())];
        let mut collection = SecondaryIndexCollection::new();
        collection
            .create_unique_index("first", by_first_char(), KeyComparer::IgnoreCase, rows.iter().map(|(k, v)| (k, v)))
            .unwrap();

        let mut copy = collection.empty_copy();
        let index = copy.get_index("first").unwrap();
        assert!(index.is_unique());
        assert!(index.lookup("a").is_empty());
        assert_eq!(collection.get_index("first").unwrap().lookup("A"), vec!["k1"]);

        let avocado = "Avocado".to_string();
        copy.on_add("k2", &avocado);
        assert_eq!(copy.get_index("first").unwrap().lookup("a"), vec!["k2"]);
        assert!(copy.check("k3", &"apricot".to_string()).is_err());
    }
}
