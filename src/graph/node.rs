//! Graph node
//!
//! A node is identified by a case-insensitive key and carries tags plus an
//! optional set of named links to payloads held in the external data store.

use super::tags::Tags;
use super::types::key_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named link from a node to a payload in the external data store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub name: String,
    pub file_id: String,
}

impl GraphLink {
    /// Build the link for a node payload; the file id is derived from the keys
    pub fn for_node(node_key: &str, name: &str) -> Self {
        GraphLink {
            name: name.to_string(),
            file_id: format!("nodes/{}/{}__{}.json", key_id(node_key), key_id(node_key), key_id(name)),
        }
    }
}

/// A node in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Primary key, compared case-insensitively
    pub key: String,

    pub tags: Tags,

    /// Payload links by name
    #[serde(default)]
    pub data_map: BTreeMap<String, GraphLink>,

    pub created_date: DateTime<Utc>,
}

impl GraphNode {
    pub fn new(key: impl Into<String>) -> Self {
        GraphNode {
            key: key.into(),
            tags: Tags::new(),
            data_map: BTreeMap::new(),
            created_date: Utc::now(),
        }
    }

    pub fn with_tags(key: impl Into<String>, tags: impl Into<Tags>) -> Self {
        let mut node = GraphNode::new(key);
        node.tags = tags.into();
        node
    }

    /// Normalized key used by the node index
    pub fn key_id(&self) -> String {
        key_id(&self.key)
    }

    /// Attach a payload link, returning the link that was stored
    pub fn add_link(&mut self, name: &str) -> GraphLink {
        let link = GraphLink::for_node(&self.key, name);
        self.data_map.insert(name.to_lowercase(), link.clone());
        link
    }

    /// Merge another node's tags and links into this one (upsert)
    pub fn merge(&self, other: &GraphNode) -> GraphNode {
        let mut merged = self.clone();
        merged.tags = self.tags.merge(&other.tags);
        for (name, link) in &other.data_map {
            merged.data_map.insert(name.clone(), link.clone());
        }
        merged
    }
}

/// Structural equality: key (case-insensitive), tags and links
impl PartialEq for GraphNode {
    fn eq(&self, other: &Self) -> bool {
        self.key_id() == other.key_id() && self.tags == other.tags && self.data_map == other.data_map
    }
}

impl Eq for GraphNode {}
