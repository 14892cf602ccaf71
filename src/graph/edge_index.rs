//! Primary edge collection with from/to adjacency indexes
//!
//! Not synchronized on its own; `GraphMap` owns it behind the map lock.

use super::edge::{EdgeIdentity, GraphEdge};
use super::search::EdgeSearch;
use super::types::{is_wildcard, key_id, EdgeDirection, EdgeKey};
use crate::error::{GraphError, GraphResult};
use crate::index::SecondaryIndex;
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
pub struct GraphEdgeIndex {
    /// Surrogate key -> edge, in insertion order
    edges: IndexMap<EdgeKey, GraphEdge>,
    /// Duplicate detection
    identities: FxHashMap<EdgeIdentity, EdgeKey>,
    /// from key_id -> edges leaving the node
    from_index: SecondaryIndex<String, EdgeKey>,
    /// to key_id -> edges entering the node
    to_index: SecondaryIndex<String, EdgeKey>,
}

impl GraphEdgeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn get(&self, key: &EdgeKey) -> Option<&GraphEdge> {
        self.edges.get(key)
    }

    pub fn get_by_identity(&self, identity: &EdgeIdentity) -> Option<&GraphEdge> {
        self.identities.get(identity).and_then(|key| self.edges.get(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.values()
    }

    /// Insert an edge; fails on duplicate surrogate key or identity
    pub fn insert(&mut self, edge: GraphEdge) -> GraphResult<()> {
        if self.edges.contains_key(&edge.key) {
            return Err(GraphError::conflict(format!("edge {} already exists", edge.key)));
        }
        let identity = edge.identity();
        if self.identities.contains_key(&identity) {
            return Err(GraphError::conflict(format!("edge {} already exists", identity)));
        }

        self.from_index.insert(identity.from_key.clone(), edge.key);
        self.to_index.insert(identity.to_key.clone(), edge.key);
        self.identities.insert(identity, edge.key);
        self.edges.insert(edge.key, edge);
        Ok(())
    }

    pub fn remove(&mut self, key: &EdgeKey) -> Option<GraphEdge> {
        let edge = self.edges.shift_remove(key)?;
        let identity = edge.identity();
        self.from_index.remove(&identity.from_key, key);
        self.to_index.remove(&identity.to_key, key);
        if self.identities.get(&identity) == Some(key) {
            self.identities.remove(&identity);
        }
        Some(edge)
    }

    /// Replace an edge in place, re-indexing when its identity changed
    pub fn replace(&mut self, edge: GraphEdge) -> GraphResult<GraphEdge> {
        let Some(current) = self.edges.get(&edge.key) else {
            return Err(GraphError::not_found(format!("edge {} not found", edge.key)));
        };

        let identity = edge.identity();
        if let Some(owner) = self.identities.get(&identity) {
            if *owner != edge.key {
                return Err(GraphError::conflict(format!("edge {} already exists", identity)));
            }
        }

        let previous_identity = current.identity();
        if previous_identity != identity {
            self.from_index.remove(&previous_identity.from_key, &edge.key);
            self.to_index.remove(&previous_identity.to_key, &edge.key);
            self.identities.remove(&previous_identity);
            self.from_index.insert(identity.from_key.clone(), edge.key);
            self.to_index.insert(identity.to_key.clone(), edge.key);
            self.identities.insert(identity, edge.key);
        }

        self.edges
            .insert(edge.key, edge)
            .ok_or_else(|| GraphError::Internal("edge vanished during replace".to_string()))
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.identities.clear();
        self.from_index.clear();
        self.to_index.clear();
    }

    /// Edges incident to a node key
    pub fn edges_for_node(&self, node_key: &str, direction: EdgeDirection) -> Vec<GraphEdge> {
        let id = key_id(node_key);
        let keys = self.endpoint_keys(&id, direction);
        self.collect(keys)
    }

    /// Run an edge search
    ///
    /// Narrow candidates through the adjacency indexes when an exact endpoint
    /// is given: one endpoint (union of from/to for `Both`), an explicit
    /// (from, to) pair (intersection), or all edges. The full predicate is
    /// then applied in memory.
    pub fn search(&self, search: &EdgeSearch) -> Vec<GraphEdge> {
        let exact = |value: &Option<String>| value.as_deref().filter(|v| !is_wildcard(v)).map(key_id);

        let candidates: Option<FxHashSet<EdgeKey>> = match (exact(&search.from_key), exact(&search.to_key)) {
            (Some(from), Some(to)) => {
                let from_set = self.from_index.get_set(&from);
                let to_set = self.to_index.get_set(&to);
                Some(match (from_set, to_set) {
                    (Some(f), Some(t)) => f.intersection(t).cloned().collect(),
                    _ => FxHashSet::default(),
                })
            }
            (Some(from), None) => Some(self.endpoint_keys(&from, EdgeDirection::Directed)),
            (None, Some(to)) => Some(self.to_index.get_set(&to).cloned().unwrap_or_default()),
            (None, None) => exact(&search.node_key).map(|node| self.endpoint_keys(&node, search.direction)),
        };

        match candidates {
            Some(keys) => self.collect(keys).into_iter().filter(|e| search.is_match(e)).collect(),
            None => self.edges.values().filter(|e| search.is_match(e)).cloned().collect(),
        }
    }

    fn endpoint_keys(&self, id: &String, direction: EdgeDirection) -> FxHashSet<EdgeKey> {
        let mut keys: FxHashSet<EdgeKey> = self.from_index.get_set(id).cloned().unwrap_or_default();
        if direction == EdgeDirection::Both {
            if let Some(to) = self.to_index.get_set(id) {
                keys.extend(to.iter().cloned());
            }
        }
        keys
    }

    /// Materialize edges in insertion order
    fn collect(&self, keys: FxHashSet<EdgeKey>) -> Vec<GraphEdge> {
        let mut found: Vec<(usize, &GraphEdge)> = keys
            .iter()
            .filter_map(|key| self.edges.get_full(key).map(|(pos, _, edge)| (pos, edge)))
            .collect();
        found.sort_by_key(|(pos, _)| *pos);
        found.into_iter().map(|(_, edge)| edge.clone()).collect()
    }

    pub fn from_index_snapshot(&self) -> BTreeMap<String, BTreeSet<EdgeKey>> {
        self.from_index.snapshot()
    }

    pub fn to_index_snapshot(&self) -> BTreeMap<String, BTreeSet<EdgeKey>> {
        self.to_index.snapshot()
    }
}
