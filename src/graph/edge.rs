//! Directed, typed graph edge

use super::tags::Tags;
use super::types::{key_id, EdgeKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Edge type used when an add statement does not name one
pub const DEFAULT_EDGE_TYPE: &str = "default";

/// Duplicate-detection identity of an edge: (from, to, type), case-insensitive
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIdentity {
    pub from_key: String,
    pub to_key: String,
    pub edge_type: String,
}

impl std::fmt::Display for EdgeIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -[{}]-> {}", self.from_key, self.edge_type, self.to_key)
    }
}

/// A directed edge between two node keys
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Surrogate key used by the edge index
    pub key: EdgeKey,

    /// Source node (edge goes FROM this node)
    pub from_key: String,

    /// Target node (edge goes TO this node)
    pub to_key: String,

    pub edge_type: String,

    pub tags: Tags,

    pub created_date: DateTime<Utc>,
}

impl GraphEdge {
    pub fn new(
        from_key: impl Into<String>,
        to_key: impl Into<String>,
        edge_type: impl Into<String>,
    ) -> Self {
        GraphEdge {
            key: EdgeKey::new(),
            from_key: from_key.into(),
            to_key: to_key.into(),
            edge_type: edge_type.into(),
            tags: Tags::new(),
            created_date: Utc::now(),
        }
    }

    pub fn with_tags(
        from_key: impl Into<String>,
        to_key: impl Into<String>,
        edge_type: impl Into<String>,
        tags: impl Into<Tags>,
    ) -> Self {
        let mut edge = GraphEdge::new(from_key, to_key, edge_type);
        edge.tags = tags.into();
        edge
    }

    pub fn identity(&self) -> EdgeIdentity {
        EdgeIdentity {
            from_key: key_id(&self.from_key),
            to_key: key_id(&self.to_key),
            edge_type: key_id(&self.edge_type),
        }
    }

    /// Check if this edge goes FROM a specific node key
    pub fn starts_from(&self, node_key: &str) -> bool {
        key_id(&self.from_key) == key_id(node_key)
    }

    /// Check if this edge goes TO a specific node key
    pub fn ends_at(&self, node_key: &str) -> bool {
        key_id(&self.to_key) == key_id(node_key)
    }

    pub fn touches(&self, node_key: &str) -> bool {
        self.starts_from(node_key) || self.ends_at(node_key)
    }

    /// Merge another edge's tags into this one, keeping this edge's key (upsert)
    pub fn merge(&self, other: &GraphEdge) -> GraphEdge {
        let mut merged = self.clone();
        merged.tags = self.tags.merge(&other.tags);
        merged
    }
}

/// Structural equality: surrogate key, identity and tags
impl PartialEq for GraphEdge {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.identity() == other.identity() && self.tags == other.tags
    }
}

impl Eq for GraphEdge {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_creation() {
        let edge = GraphEdge::with_tags("key1", "key2", "et", "t2");
        assert_eq!(edge.from_key, "key1");
        assert_eq!(edge.to_key, "key2");
        assert_eq!(edge.edge_type, "et");
        assert_eq!(edge.tags.to_string(), "t2");
    }

    #[test]
    fn test_edge_identity_is_case_insensitive() {
        let a = GraphEdge::new("Key1", "key2", "ET");
        let b = GraphEdge::new("key1", "KEY2", "et");
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn test_edge_direction() {
        let edge = GraphEdge::new("a", "b", "link");
        assert!(edge.starts_from("A"));
        assert!(edge.ends_at("b"));
        assert!(edge.touches("b"));
        assert!(!edge.touches("c"));
    }
}
