//! Core type definitions for the graph store

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Surrogate primary key of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EdgeKey(pub Uuid);

impl EdgeKey {
    pub fn new() -> Self {
        EdgeKey(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EdgeKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeKey({})", self.0)
    }
}

impl From<Uuid> for EdgeKey {
    fn from(id: Uuid) -> Self {
        EdgeKey(id)
    }
}

/// Which adjacency maps an edge lookup by node key consults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EdgeDirection {
    /// Edges leaving the node only
    Directed,
    /// Edges leaving or entering the node
    #[default]
    Both,
}

/// Normalized lookup form of a node key or edge type
pub fn key_id(key: &str) -> String {
    key.to_lowercase()
}

/// Match a stored value against a filter
///
/// `*` matches everything, a trailing `*` is a prefix match, anything else is
/// an exact (case-insensitive) match.
pub fn wildcard_match(filter: &str, value: &str) -> bool {
    if filter == "*" {
        return true;
    }

    match filter.strip_suffix('*') {
        Some(prefix) => value.to_lowercase().starts_with(&prefix.to_lowercase()),
        None => filter.to_lowercase() == value.to_lowercase(),
    }
}

/// True when the filter contains a wildcard and cannot be used for a direct lookup
pub fn is_wildcard(filter: &str) -> bool {
    filter.ends_with('*')
}
