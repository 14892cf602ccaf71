//! Typed GraphLang instructions
//!
//! One `GraphInstruction` per parsed statement. Optional fields stay `None`
//! when the statement does not mention them.

use crate::graph::{EdgeSearch, NodeSearch, Tags};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    /// `->`: follow edges from their source to their target
    Left,
    /// `<->`: follow edges in both directions
    Full,
}

/// One step of a search chain such as `(key=k1) a1 -> [edgeType=et] a2 -> ()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectStep {
    Node(NodeSearch),
    Edge(EdgeSearch),
    Join(JoinKind),
    ReturnNames(Vec<String>),
}

impl SelectStep {
    pub fn is_search(&self) -> bool {
        matches!(self, SelectStep::Node(_) | SelectStep::Edge(_))
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            SelectStep::Node(search) => search.alias.as_deref(),
            SelectStep::Edge(search) => search.alias.as_deref(),
            _ => None,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            SelectStep::Node(_) => "node search",
            SelectStep::Edge(_) => "edge search",
            SelectStep::Join(JoinKind::Left) => "left join",
            SelectStep::Join(JoinKind::Full) => "full join",
            SelectStep::ReturnNames(_) => "return",
        }
    }
}

/// Named payload written with a node, e.g. `contract { '{"id":1}' }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    pub name: String,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphInstruction {
    NodeAdd {
        key: String,
        tags: Tags,
        data: Vec<NodeData>,
        upsert: bool,
    },
    EdgeAdd {
        from_key: String,
        to_key: String,
        edge_type: Option<String>,
        tags: Tags,
        upsert: bool,
    },
    NodeUpdate {
        search: Vec<SelectStep>,
        tags: Tags,
    },
    EdgeUpdate {
        search: Vec<SelectStep>,
        from_key: Option<String>,
        to_key: Option<String>,
        edge_type: Option<String>,
        tags: Tags,
    },
    NodeDelete {
        search: Vec<SelectStep>,
    },
    EdgeDelete {
        search: Vec<SelectStep>,
    },
    Select {
        steps: Vec<SelectStep>,
    },
}

impl GraphInstruction {
    /// The search chain of update, delete and select instructions
    pub fn steps(&self) -> Option<&[SelectStep]> {
        match self {
            GraphInstruction::NodeUpdate { search, .. }
            | GraphInstruction::EdgeUpdate { search, .. }
            | GraphInstruction::NodeDelete { search }
            | GraphInstruction::EdgeDelete { search } => Some(search),
            GraphInstruction::Select { steps } => Some(steps),
            GraphInstruction::NodeAdd { .. } | GraphInstruction::EdgeAdd { .. } => None,
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self, GraphInstruction::Select { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            GraphInstruction::NodeAdd { upsert: false, .. } => "node-add",
            GraphInstruction::NodeAdd { upsert: true, .. } => "node-upsert",
            GraphInstruction::EdgeAdd { upsert: false, .. } => "edge-add",
            GraphInstruction::EdgeAdd { upsert: true, .. } => "edge-upsert",
            GraphInstruction::NodeUpdate { .. } => "node-update",
            GraphInstruction::EdgeUpdate { .. } => "edge-update",
            GraphInstruction::NodeDelete { .. } => "node-delete",
            GraphInstruction::EdgeDelete { .. } => "edge-delete",
            GraphInstruction::Select { .. } => "select",
        }
    }
}

impl fmt::Display for GraphInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphInstruction::NodeAdd { key, tags, .. } => write!(f, "{} key={} tags={}", self.name(), key, tags),
            GraphInstruction::EdgeAdd {
                from_key,
                to_key,
                edge_type,
                ..
            } => write!(
                f,
                "{} {} -[{}]-> {}",
                self.name(),
                from_key,
                edge_type.as_deref().unwrap_or("*"),
                to_key
            ),
            other => match other.steps() {
                Some(steps) => write!(f, "{} ({} steps)", other.name(), steps.len()),
                None => f.write_str(other.name()),
            },
        }
    }
}
