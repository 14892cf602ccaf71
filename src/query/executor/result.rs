//! Query results

use crate::error::StatusCode;
use crate::graph::{GraphEdge, GraphNode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The set captured by an aliased search step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "lowercase")]
pub enum AliasResult {
    Nodes(Vec<GraphNode>),
    Edges(Vec<GraphEdge>),
}

impl AliasResult {
    pub fn len(&self) -> usize {
        match self {
            AliasResult::Nodes(nodes) => nodes.len(),
            AliasResult::Edges(edges) => edges.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn nodes(&self) -> Option<&[GraphNode]> {
        match self {
            AliasResult::Nodes(nodes) => Some(nodes),
            AliasResult::Edges(_) => None,
        }
    }

    pub fn edges(&self) -> Option<&[GraphEdge]> {
        match self {
            AliasResult::Edges(edges) => Some(edges),
            AliasResult::Nodes(_) => None,
        }
    }
}

/// A node payload returned by `return name, ...`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLinkData {
    pub node_key: String,
    pub name: String,
    pub file_id: String,
    pub data: String,
}

/// Outcome of one instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub status: StatusCode,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub alias: BTreeMap<String, AliasResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<GraphLinkData>,
}

impl QueryResult {
    pub fn ok() -> Self {
        QueryResult {
            status: StatusCode::Ok,
            nodes: Vec::new(),
            edges: Vec::new(),
            alias: BTreeMap::new(),
            data: Vec::new(),
        }
    }

    pub fn with_nodes(nodes: Vec<GraphNode>) -> Self {
        QueryResult { nodes, ..Self::ok() }
    }

    pub fn with_edges(edges: Vec<GraphEdge>) -> Self {
        QueryResult { edges, ..Self::ok() }
    }

    pub fn alias(&self, name: &str) -> Option<&AliasResult> {
        self.alias.get(&name.to_lowercase())
    }
}

/// One result per instruction, in statement order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryBatchResult {
    pub items: Vec<QueryResult>,
}

impl QueryBatchResult {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last(&self) -> Option<&QueryResult> {
        self.items.last()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
