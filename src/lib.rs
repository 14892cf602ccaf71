//! GraphLang: an embedded in-memory graph query engine
//!
//! Nodes and directed, typed edges live in a `GraphMap` and are queried and
//! mutated through GraphLang, a small statement language whose grammar is
//! itself written in a meta-grammar and compiled at startup.
//!
//! # Architecture
//!
//! - `query::tokenizer`, `query::meta`, `query::syntax`: tokenizer, meta-grammar
//!   compiler and grammar-driven parser producing syntax pairs
//! - `query::builder`, `query::validate`: typed instructions from syntax pairs
//! - `graph`: node and edge indexes behind one lock, secondary indexes
//! - `trx`: per-batch change log with reverse-order rollback
//! - `persistence`: data store seam for payloads and snapshots
//! - `query::executor`: `GraphEngine`, running a batch as one transaction
//!
//! ## Example Usage
//!
//! ```rust
//! use graphlang::{EngineConfig, GraphEngine};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let engine = GraphEngine::new(EngineConfig::default()).unwrap();
//!
//! engine
//!     .execute("add node key=alice,tags=person; add node key=bob,tags=person;")
//!     .await
//!     .unwrap();
//! engine
//!     .execute("add edge fromKey=alice,toKey=bob,edgeType=knows;")
//!     .await
//!     .unwrap();
//!
//! let result = engine
//!     .execute("select (key=alice) -> [edgeType=knows] -> (person);")
//!     .await
//!     .unwrap();
//! assert_eq!(result.items[0].nodes[0].key, "bob");
//! # });
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod graph;
pub mod index;
pub mod persistence;
pub mod query;
pub mod trx;

// Re-export main types for convenience
pub use config::EngineConfig;
pub use error::{GraphError, GraphResult, StatusCode};

pub use graph::{
    EdgeDirection, EdgeKey, EdgeSearch, GraphEdge, GraphLink, GraphMap, GraphNode, NodeSearch, Tags,
};

pub use index::{KeyComparer, SecondaryIndex, SecondaryIndexCollection};

pub use persistence::{DataETag, DataStore, ETag, GraphSnapshot, MemoryDataStore};

pub use query::{
    parse_graphlang, GraphEngine, GraphInstruction, GraphLangParser, QueryBatchResult, QueryResult, SelectStep,
};

pub use trx::{ChangeEntry, ChangeLog};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "0.1.0");
    }
}
