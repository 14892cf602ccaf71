//! Primary node collection plus its pluggable secondary indexes
//!
//! Not synchronized on its own; `GraphMap` owns it behind the map lock.

use super::node::GraphNode;
use super::search::NodeSearch;
use super::types::{is_wildcard, key_id};
use crate::error::{GraphError, GraphResult};
use crate::index::SecondaryIndexCollection;
use indexmap::IndexMap;

#[derive(Debug, Default)]
pub struct GraphNodeIndex {
    /// key_id -> node, in insertion order
    nodes: IndexMap<String, GraphNode>,
    indexes: SecondaryIndexCollection<GraphNode>,
}

impl GraphNodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(&key_id(key))
    }

    pub fn get(&self, key: &str) -> Option<&GraphNode> {
        self.nodes.get(&key_id(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &GraphNode)> {
        self.nodes.iter()
    }

    /// Insert a node whose key is not present yet
    pub fn insert(&mut self, node: GraphNode) -> GraphResult<()> {
        let id = node.key_id();
        if self.nodes.contains_key(&id) {
            return Err(GraphError::conflict(format!("node key '{}' already exists", node.key)));
        }
        self.indexes.check(&id, &node)?;
        self.indexes.on_add(&id, &node);
        self.nodes.insert(id, node);
        Ok(())
    }

    /// Replace an existing node, returning the previous value
    pub fn replace(&mut self, node: GraphNode) -> GraphResult<GraphNode> {
        let id = node.key_id();
        let Some(current) = self.nodes.get(&id) else {
            return Err(GraphError::not_found(format!("node key '{}' not found", node.key)));
        };

        self.indexes.check(&id, &node)?;
        let previous = current.clone();
        self.indexes.on_remove(&id, &previous);
        self.indexes.on_add(&id, &node);
        self.nodes.insert(id, node);
        Ok(previous)
    }

    pub fn remove(&mut self, key: &str) -> Option<GraphNode> {
        let id = key_id(key);
        let node = self.nodes.shift_remove(&id)?;
        self.indexes.on_remove(&id, &node);
        Some(node)
    }

    /// Empty index carrying the same secondary index definitions
    pub fn empty_copy(&self) -> Self {
        GraphNodeIndex {
            nodes: IndexMap::new(),
            indexes: self.indexes.empty_copy(),
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.indexes.clear();
    }

    pub fn search(&self, search: &NodeSearch) -> Vec<GraphNode> {
        // Exact key is a primary lookup
        if let Some(key) = search.key.as_deref().filter(|k| !is_wildcard(k)) {
            return self
                .get(key)
                .filter(|node| search.is_match(node))
                .cloned()
                .into_iter()
                .collect();
        }

        self.nodes.values().filter(|node| search.is_match(node)).cloned().collect()
    }

    pub fn indexes(&self) -> &SecondaryIndexCollection<GraphNode> {
        &self.indexes
    }

    /// Mutable access to the index definitions together with the rows to backfill from
    pub fn indexes_with_rows(
        &mut self,
    ) -> (&mut SecondaryIndexCollection<GraphNode>, &IndexMap<String, GraphNode>) {
        (&mut self.indexes, &self.nodes)
    }
}
