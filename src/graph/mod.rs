//! Core graph store
//!
//! - Nodes keyed by a case-insensitive key, carrying tags and payload links
//! - Directed typed edges between existing node keys
//! - `GraphMap`: node and edge indexes behind one lock

pub mod edge;
pub mod edge_index;
pub mod map;
pub mod node;
pub mod node_index;
pub mod search;
pub mod tags;
pub mod types;

// Re-export main types
pub use edge::{EdgeIdentity, GraphEdge, DEFAULT_EDGE_TYPE};
pub use map::{GraphMap, NodeRemoveHook};
pub use node::{GraphLink, GraphNode};
pub use search::{EdgeSearch, NodeSearch};
pub use tags::Tags;
pub use types::{key_id, wildcard_match, EdgeDirection, EdgeKey};
