//! GraphMap: node index + edge index behind one lock
//!
//! Every structural invariant (unique node key, unique edge identity, edge
//! endpoints exist at insert time) is enforced here, inside a single critical
//! section shared by both indexes. When a change log is supplied, the undo
//! record is pushed while the lock is still held.

use super::edge::GraphEdge;
use super::edge_index::GraphEdgeIndex;
use super::node::GraphNode;
use super::node_index::GraphNodeIndex;
use super::search::{EdgeSearch, NodeSearch};
use super::types::{key_id, EdgeDirection, EdgeKey};
use crate::error::{GraphError, GraphResult};
use crate::index::{KeyComparer, Projection};
use crate::trx::{ChangeEntry, ChangeLog};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Called with a node about to be removed, before index removal completes
///
/// Invoked outside the map lock.
pub type NodeRemoveHook = Arc<dyn Fn(&GraphNode) + Send + Sync>;

/// State guarded by the map lock
#[derive(Debug, Default)]
struct GraphMapState {
    nodes: GraphNodeIndex,
    edges: GraphEdgeIndex,
}

/// In-memory graph
pub struct GraphMap {
    state: Mutex<GraphMapState>,
    remove_hook: Option<NodeRemoveHook>,
}

fn push(log: Option<&mut ChangeLog>, entry: ChangeEntry) {
    if let Some(log) = log {
        log.push(entry);
    }
}

impl GraphMap {
    pub fn new() -> Self {
        GraphMap {
            state: Mutex::new(GraphMapState::default()),
            remove_hook: None,
        }
    }

    /// Register a hook notified on every node removal
    pub fn with_remove_hook(mut self, hook: NodeRemoveHook) -> Self {
        self.remove_hook = Some(hook);
        self
    }

    pub fn node_count(&self) -> usize {
        self.state.lock().nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.state.lock().edges.len()
    }

    pub fn contains_node(&self, key: &str) -> bool {
        self.state.lock().nodes.contains(key)
    }

    pub fn get_node(&self, key: &str) -> Option<GraphNode> {
        self.state.lock().nodes.get(key).cloned()
    }

    pub fn get_edge(&self, key: &EdgeKey) -> Option<GraphEdge> {
        self.state.lock().edges.get(key).cloned()
    }

    /// All nodes, in insertion order
    pub fn nodes(&self) -> Vec<GraphNode> {
        self.state.lock().nodes.iter().cloned().collect()
    }

    /// All edges, in insertion order
    pub fn edges(&self) -> Vec<GraphEdge> {
        self.state.lock().edges.iter().cloned().collect()
    }

    /// Consistent copy of all nodes and edges taken under one lock
    pub fn export(&self) -> (Vec<GraphNode>, Vec<GraphEdge>) {
        let state = self.state.lock();
        (state.nodes.iter().cloned().collect(), state.edges.iter().cloned().collect())
    }

    /// Add a node
    ///
    /// Without `upsert` an existing key is a `Conflict`; with `upsert` the new
    /// tags are merged into the existing node (new values win).
    pub fn add_node(&self, node: GraphNode, upsert: bool, log: Option<&mut ChangeLog>) -> GraphResult<()> {
        let mut state = self.state.lock();

        match state.nodes.get(&node.key).cloned() {
            Some(current) if upsert => {
                let merged = current.merge(&node);
                let previous = state.nodes.replace(merged)?;
                debug!("Upserted node '{}'", node.key);
                push(log, ChangeEntry::node_change(previous));
            }
            Some(_) => {
                return Err(GraphError::conflict(format!("node key '{}' already exists", node.key)));
            }
            None => {
                let key = node.key.clone();
                state.nodes.insert(node)?;
                debug!("Added node '{}'", key);
                push(log, ChangeEntry::node_add(key));
            }
        }
        Ok(())
    }

    /// Add an edge
    ///
    /// Both endpoints must exist (`NotFound` otherwise). A duplicate
    /// (from, to, type) identity is a `Conflict` unless `upsert`, which merges
    /// tags into the existing edge.
    pub fn add_edge(&self, edge: GraphEdge, upsert: bool, log: Option<&mut ChangeLog>) -> GraphResult<()> {
        let mut state = self.state.lock();

        if !state.nodes.contains(&edge.from_key) {
            return Err(GraphError::not_found(format!("from node '{}' not found", edge.from_key)));
        }
        if !state.nodes.contains(&edge.to_key) {
            return Err(GraphError::not_found(format!("to node '{}' not found", edge.to_key)));
        }

        let identity = edge.identity();
        match state.edges.get_by_identity(&identity).cloned() {
            Some(current) if upsert => {
                let merged = current.merge(&edge);
                let previous = state.edges.replace(merged)?;
                debug!("Upserted edge {}", identity);
                push(log, ChangeEntry::edge_change(previous));
            }
            Some(_) => {
                return Err(GraphError::conflict(format!("edge {} already exists", identity)));
            }
            None => {
                let key = edge.key;
                state.edges.insert(edge)?;
                debug!("Added edge {}", identity);
                push(log, ChangeEntry::edge_add(key));
            }
        }
        Ok(())
    }

    /// Remove a node
    ///
    /// The removal hook sees the node before it leaves the index. It runs
    /// without the map lock held, so it may read the map (incident edges
    /// included). With `cascade`, incident edges are removed (and logged)
    /// first; otherwise they are left in place.
    pub fn remove_node(&self, key: &str, cascade: bool, mut log: Option<&mut ChangeLog>) -> GraphResult<GraphNode> {
        let not_found = || GraphError::not_found(format!("node key '{}' not found", key));

        if let Some(hook) = &self.remove_hook {
            let node = self.get_node(key).ok_or_else(not_found)?;
            hook(&node);
        }

        let mut state = self.state.lock();
        if !state.nodes.contains(key) {
            return Err(not_found());
        }

        if cascade {
            for edge in state.edges.edges_for_node(key, EdgeDirection::Both) {
                if let Some(removed) = state.edges.remove(&edge.key) {
                    debug!("Cascade removed edge {}", removed.identity());
                    push(log.as_deref_mut(), ChangeEntry::edge_delete(removed));
                }
            }
        }

        let removed = state
            .nodes
            .remove(key)
            .ok_or_else(|| GraphError::Internal(format!("node '{}' vanished during remove", key)))?;
        debug!("Removed node '{}'", removed.key);
        push(log, ChangeEntry::node_delete(removed.clone()));
        Ok(removed)
    }

    pub fn remove_edge(&self, key: &EdgeKey, log: Option<&mut ChangeLog>) -> GraphResult<GraphEdge> {
        let mut state = self.state.lock();

        let removed = state
            .edges
            .remove(key)
            .ok_or_else(|| GraphError::not_found(format!("edge {} not found", key)))?;
        debug!("Removed edge {}", removed.identity());
        push(log, ChangeEntry::edge_delete(removed.clone()));
        Ok(removed)
    }

    /// Replace a node's value with `transform(current)`; the key may not change
    pub fn update_node<F>(&self, key: &str, transform: F, log: Option<&mut ChangeLog>) -> GraphResult<GraphNode>
    where
        F: FnOnce(&GraphNode) -> GraphNode,
    {
        let mut state = self.state.lock();

        let Some(current) = state.nodes.get(key) else {
            return Err(GraphError::not_found(format!("node key '{}' not found", key)));
        };

        let updated = transform(current);
        if updated.key_id() != key_id(key) {
            return Err(GraphError::bad_request(format!(
                "node key cannot change from '{}' to '{}'",
                key, updated.key
            )));
        }

        let previous = state.nodes.replace(updated.clone())?;
        debug!("Updated node '{}'", updated.key);
        push(log, ChangeEntry::node_change(previous));
        Ok(updated)
    }

    /// Replace an edge's value with `transform(current)`
    ///
    /// Changed endpoints must exist; a changed identity must not collide.
    pub fn update_edge<F>(&self, key: &EdgeKey, transform: F, log: Option<&mut ChangeLog>) -> GraphResult<GraphEdge>
    where
        F: FnOnce(&GraphEdge) -> GraphEdge,
    {
        let mut state = self.state.lock();

        let Some(current) = state.edges.get(key) else {
            return Err(GraphError::not_found(format!("edge {} not found", key)));
        };

        let mut updated = transform(current);
        updated.key = *key;

        if !state.nodes.contains(&updated.from_key) {
            return Err(GraphError::not_found(format!("from node '{}' not found", updated.from_key)));
        }
        if !state.nodes.contains(&updated.to_key) {
            return Err(GraphError::not_found(format!("to node '{}' not found", updated.to_key)));
        }

        let previous = state.edges.replace(updated.clone())?;
        debug!("Updated edge {}", updated.identity());
        push(log, ChangeEntry::edge_change(previous));
        Ok(updated)
    }

    pub fn query_nodes(&self, search: &NodeSearch) -> Vec<GraphNode> {
        self.state.lock().nodes.search(search)
    }

    pub fn query_edges(&self, search: &EdgeSearch) -> Vec<GraphEdge> {
        self.state.lock().edges.search(search)
    }

    pub fn edges_for_node(&self, key: &str, direction: EdgeDirection) -> Vec<GraphEdge> {
        self.state.lock().edges.edges_for_node(key, direction)
    }

    /// Swap in a complete node and edge set, e.g. from a snapshot
    ///
    /// The new contents are staged beside the live ones and swapped in under
    /// one lock, so on error the map is unchanged. Secondary index definitions
    /// carry over. Edge endpoints are not checked: edges whose node was
    /// removed without cascade are kept as they were.
    pub fn replace_all(&self, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> GraphResult<()> {
        let mut state = self.state.lock();

        let mut staged = GraphMapState {
            nodes: state.nodes.empty_copy(),
            edges: GraphEdgeIndex::new(),
        };
        for node in nodes {
            staged.nodes.insert(node)?;
        }
        for edge in edges {
            staged.edges.insert(edge)?;
        }

        debug!("Replaced map contents: {} nodes, {} edges", staged.nodes.len(), staged.edges.len());
        *state = staged;
        Ok(())
    }

    /// Remove every node and edge; index definitions survive
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.nodes.clear();
        state.edges.clear();
    }

    // Secondary index management

    pub fn create_unique_index(&self, name: &str, projection: Projection<GraphNode>, comparer: KeyComparer) -> GraphResult<()> {
        let mut state = self.state.lock();
        let (indexes, rows) = state.nodes.indexes_with_rows();
        indexes.create_unique_index(name, projection, comparer, rows.iter())
    }

    pub fn create_non_unique_index(
        &self,
        name: &str,
        projection: Projection<GraphNode>,
        comparer: KeyComparer,
    ) -> GraphResult<()> {
        let mut state = self.state.lock();
        let (indexes, rows) = state.nodes.indexes_with_rows();
        indexes.create_non_unique_index(name, projection, comparer, rows.iter())
    }

    pub fn remove_index(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        let (indexes, _) = state.nodes.indexes_with_rows();
        indexes.remove_index(name)
    }

    pub fn index_names(&self) -> Vec<String> {
        self.state.lock().nodes.indexes().names()
    }

    /// Nodes stored under `value` in the named index
    pub fn index_lookup(&self, name: &str, value: &str) -> GraphResult<Vec<GraphNode>> {
        let state = self.state.lock();
        let index = state
            .nodes
            .indexes()
            .get_index(name)
            .ok_or_else(|| GraphError::not_found(format!("index '{}' not found", name)))?;

        Ok(index
            .lookup(value)
            .iter()
            .filter_map(|key| state.nodes.get(key).cloned())
            .collect())
    }

    /// Full contents of a named index (projected key -> node key ids)
    pub fn index_snapshot(&self, name: &str) -> Option<BTreeMap<String, BTreeSet<String>>> {
        self.state.lock().nodes.indexes().get_index(name).map(|index| index.snapshot())
    }

    /// Edge adjacency contents (from map, to map), for consistency checks
    pub fn adjacency_snapshot(&self) -> (BTreeMap<String, BTreeSet<EdgeKey>>, BTreeMap<String, BTreeSet<EdgeKey>>) {
        let state = self.state.lock();
        (state.edges.from_index_snapshot(), state.edges.to_index_snapshot())
    }

    // Undo support: applied without logging, one lock acquisition per call

    /// Insert a node or overwrite the stored value for its key
    pub(crate) fn restore_node(&self, node: GraphNode) -> GraphResult<()> {
        let mut state = self.state.lock();
        if state.nodes.contains(&node.key) {
            state.nodes.replace(node)?;
        } else {
            state.nodes.insert(node)?;
        }
        Ok(())
    }

    /// Insert an edge or overwrite the stored value for its surrogate key
    pub(crate) fn restore_edge(&self, edge: GraphEdge) -> GraphResult<()> {
        let mut state = self.state.lock();
        if state.edges.get(&edge.key).is_some() {
            state.edges.replace(edge)?;
        } else {
            state.edges.insert(edge)?;
        }
        Ok(())
    }

    pub(crate) fn discard_node(&self, key: &str) -> GraphResult<GraphNode> {
        self.state
            .lock()
            .nodes
            .remove(key)
            .ok_or_else(|| GraphError::conflict(format!("node key '{}' already removed", key)))
    }

    pub(crate) fn discard_edge(&self, key: &EdgeKey) -> GraphResult<GraphEdge> {
        self.state
            .lock()
            .edges
            .remove(key)
            .ok_or_else(|| GraphError::conflict(format!("edge {} already removed", key)))
    }
}

impl Default for GraphMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GraphMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("GraphMap")
            .field("nodes", &state.nodes.len())
            .field("edges", &state.edges.len())
            .finish()
    }
}
