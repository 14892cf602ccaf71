//! Graph snapshots
//!
//! Serializes the whole map as JSON and moves it through a `DataStore`.

use super::data_store::{DataETag, DataStore, ETag};
use crate::error::GraphResult;
use crate::graph::{GraphEdge, GraphMap, GraphNode};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphSnapshot {
    pub fn capture(map: &GraphMap) -> Self {
        let (nodes, edges) = map.export();
        GraphSnapshot { nodes, edges }
    }

    /// Load the snapshot into `map`, replacing its contents
    ///
    /// All or nothing: a snapshot that fails to load leaves `map` as it was.
    /// Edges are restored as captured, dangling endpoints included.
    pub fn restore_into(self, map: &GraphMap) -> GraphResult<()> {
        map.replace_all(self.nodes, self.edges)
    }

    pub fn to_json(&self) -> GraphResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(data: &[u8]) -> GraphResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    pub async fn save(&self, store: &dyn DataStore, key: &str) -> GraphResult<ETag> {
        let data = self.to_json()?;
        let etag = store.set(key, DataETag::new(data)).await?;
        info!("Saved graph snapshot '{}' ({} nodes, {} edges)", key, self.nodes.len(), self.edges.len());
        Ok(etag)
    }

    /// Read a snapshot; a missing key yields `None`
    pub async fn load(store: &dyn DataStore, key: &str) -> GraphResult<Option<Self>> {
        match store.try_get(key).await? {
            Some(value) => {
                let snapshot = Self::from_json(&value.data)?;
                info!("Loaded graph snapshot '{}' ({} nodes, {} edges)", key, snapshot.nodes.len(), snapshot.edges.len());
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }
}
