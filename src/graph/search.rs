//! Search predicates for nodes and edges
//!
//! Absent fields mean "no constraint"; key and type filters honour the
//! trailing `*` wildcard.

use super::edge::GraphEdge;
use super::node::GraphNode;
use super::tags::Tags;
use super::types::{wildcard_match, EdgeDirection};
use serde::{Deserialize, Serialize};

/// Node filter, e.g. `(key=key1;tags=t1) a1`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeSearch {
    pub key: Option<String>,
    pub tags: Tags,
    pub alias: Option<String>,
}

impl NodeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn tags(mut self, tags: impl Into<Tags>) -> Self {
        self.tags = tags.into();
        self
    }

    pub fn is_match(&self, node: &GraphNode) -> bool {
        if let Some(key) = &self.key {
            if !wildcard_match(key, &node.key) {
                return false;
            }
        }
        node.tags.matches(&self.tags)
    }
}

/// Edge filter, e.g. `[fromKey=key1;edgeType=abc*;schedulework:active] a2`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EdgeSearch {
    pub from_key: Option<String>,
    pub to_key: Option<String>,
    /// Endpoint filter in either direction (see `direction`)
    pub node_key: Option<String>,
    pub edge_type: Option<String>,
    pub tags: Tags,
    pub direction: EdgeDirection,
    pub alias: Option<String>,
}

impl EdgeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_key(mut self, key: impl Into<String>) -> Self {
        self.from_key = Some(key.into());
        self
    }

    pub fn to_key(mut self, key: impl Into<String>) -> Self {
        self.to_key = Some(key.into());
        self
    }

    pub fn node_key(mut self, key: impl Into<String>, direction: EdgeDirection) -> Self {
        self.node_key = Some(key.into());
        self.direction = direction;
        self
    }

    pub fn edge_type(mut self, edge_type: impl Into<String>) -> Self {
        self.edge_type = Some(edge_type.into());
        self
    }

    pub fn tags(mut self, tags: impl Into<Tags>) -> Self {
        self.tags = tags.into();
        self
    }

    /// Full in-memory predicate, independent of which index narrowed the candidates
    pub fn is_match(&self, edge: &GraphEdge) -> bool {
        if let Some(from) = &self.from_key {
            if !wildcard_match(from, &edge.from_key) {
                return false;
            }
        }
        if let Some(to) = &self.to_key {
            if !wildcard_match(to, &edge.to_key) {
                return false;
            }
        }
        if let Some(node) = &self.node_key {
            let from = wildcard_match(node, &edge.from_key);
            let matched = match self.direction {
                EdgeDirection::Directed => from,
                EdgeDirection::Both => from || wildcard_match(node, &edge.to_key),
            };
            if !matched {
                return false;
            }
        }
        if let Some(edge_type) = &self.edge_type {
            if !wildcard_match(edge_type, &edge.edge_type) {
                return false;
            }
        }
        edge.tags.matches(&self.tags)
    }
}
