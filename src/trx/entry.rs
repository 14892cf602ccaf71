//! Change-log entries
//!
//! One variant per mutated entity and operation, each holding enough
//! "before" state to reverse it.

use crate::error::{GraphError, GraphResult};
use crate::graph::{EdgeKey, GraphEdge, GraphMap, GraphNode};
use crate::persistence::{DataETag, DataStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Transaction-local identifier of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogKey(pub Uuid);

impl LogKey {
    pub fn new() -> Self {
        LogKey(Uuid::new_v4())
    }
}

impl Default for LogKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum ChangeEntry {
    NodeAdd { log_key: LogKey, key: String },
    NodeChange { log_key: LogKey, previous: GraphNode },
    NodeDelete { log_key: LogKey, previous: GraphNode },
    EdgeAdd { log_key: LogKey, key: EdgeKey },
    EdgeChange { log_key: LogKey, previous: GraphEdge },
    EdgeDelete { log_key: LogKey, previous: GraphEdge },
    /// A payload was written; `previous` is what the key held before, if anything
    DataSet { log_key: LogKey, file_id: String, previous: Option<DataETag> },
    DataDelete { log_key: LogKey, file_id: String, previous: DataETag },
}

impl ChangeEntry {
    pub fn node_add(key: impl Into<String>) -> Self {
        ChangeEntry::NodeAdd { log_key: LogKey::new(), key: key.into() }
    }

    pub fn node_change(previous: GraphNode) -> Self {
        ChangeEntry::NodeChange { log_key: LogKey::new(), previous }
    }

    pub fn node_delete(previous: GraphNode) -> Self {
        ChangeEntry::NodeDelete { log_key: LogKey::new(), previous }
    }

    pub fn edge_add(key: EdgeKey) -> Self {
        ChangeEntry::EdgeAdd { log_key: LogKey::new(), key }
    }

    pub fn edge_change(previous: GraphEdge) -> Self {
        ChangeEntry::EdgeChange { log_key: LogKey::new(), previous }
    }

    pub fn edge_delete(previous: GraphEdge) -> Self {
        ChangeEntry::EdgeDelete { log_key: LogKey::new(), previous }
    }

    pub fn data_set(file_id: impl Into<String>, previous: Option<DataETag>) -> Self {
        ChangeEntry::DataSet { log_key: LogKey::new(), file_id: file_id.into(), previous }
    }

    pub fn data_delete(file_id: impl Into<String>, previous: DataETag) -> Self {
        ChangeEntry::DataDelete { log_key: LogKey::new(), file_id: file_id.into(), previous }
    }

    pub fn log_key(&self) -> LogKey {
        match self {
            ChangeEntry::NodeAdd { log_key, .. }
            | ChangeEntry::NodeChange { log_key, .. }
            | ChangeEntry::NodeDelete { log_key, .. }
            | ChangeEntry::EdgeAdd { log_key, .. }
            | ChangeEntry::EdgeChange { log_key, .. }
            | ChangeEntry::EdgeDelete { log_key, .. }
            | ChangeEntry::DataSet { log_key, .. }
            | ChangeEntry::DataDelete { log_key, .. } => *log_key,
        }
    }

    /// True for entries reversed against the external data store
    pub fn is_data(&self) -> bool {
        matches!(self, ChangeEntry::DataSet { .. } | ChangeEntry::DataDelete { .. })
    }

    /// Reverse a graph-structure entry against the map
    ///
    /// Undoing an add whose row is already gone is a `Conflict`: something
    /// mutated the map outside the transaction.
    pub fn undo_graph(&self, map: &GraphMap) -> GraphResult<()> {
        debug!("Undo {}", self);
        match self {
            ChangeEntry::NodeAdd { key, .. } => map.discard_node(key).map(|_| ()),
            ChangeEntry::NodeChange { previous, .. } | ChangeEntry::NodeDelete { previous, .. } => {
                map.restore_node(previous.clone())
            }
            ChangeEntry::EdgeAdd { key, .. } => map.discard_edge(key).map(|_| ()),
            ChangeEntry::EdgeChange { previous, .. } | ChangeEntry::EdgeDelete { previous, .. } => {
                map.restore_edge(previous.clone())
            }
            ChangeEntry::DataSet { .. } | ChangeEntry::DataDelete { .. } => Err(GraphError::Internal(format!(
                "{} must be undone against the data store",
                self
            ))),
        }
    }

    /// Reverse a data entry against the external store
    pub async fn undo_data(&self, store: &dyn DataStore) -> GraphResult<()> {
        debug!("Undo {}", self);
        match self {
            ChangeEntry::DataSet { file_id, previous: Some(previous), .. }
            | ChangeEntry::DataDelete { file_id, previous, .. } => {
                store.set(file_id, previous.unconditional()).await.map(|_| ())
            }
            ChangeEntry::DataSet { file_id, previous: None, .. } => match store.delete(file_id).await {
                Err(GraphError::NotFound(_)) => {
                    warn!("Undo of data set '{}': file already removed", file_id);
                    Ok(())
                }
                other => other,
            },
            _ => Err(GraphError::Internal(format!("{} must be undone against the graph map", self))),
        }
    }

    /// Reverse any entry
    pub async fn undo(&self, map: &GraphMap, store: &dyn DataStore) -> GraphResult<()> {
        if self.is_data() {
            self.undo_data(store).await
        } else {
            self.undo_graph(map)
        }
    }
}

impl fmt::Display for ChangeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeEntry::NodeAdd { log_key, key } => write!(f, "node-add[{}] key={}", log_key, key),
            ChangeEntry::NodeChange { log_key, previous } => write!(f, "node-change[{}] key={}", log_key, previous.key),
            ChangeEntry::NodeDelete { log_key, previous } => write!(f, "node-delete[{}] key={}", log_key, previous.key),
            ChangeEntry::EdgeAdd { log_key, key } => write!(f, "edge-add[{}] {}", log_key, key),
            ChangeEntry::EdgeChange { log_key, previous } => {
                write!(f, "edge-change[{}] {}", log_key, previous.identity())
            }
            ChangeEntry::EdgeDelete { log_key, previous } => {
                write!(f, "edge-delete[{}] {}", log_key, previous.identity())
            }
            ChangeEntry::DataSet { log_key, file_id, .. } => write!(f, "data-set[{}] {}", log_key, file_id),
            ChangeEntry::DataDelete { log_key, file_id, .. } => write!(f, "data-delete[{}] {}", log_key, file_id),
        }
    }
}
