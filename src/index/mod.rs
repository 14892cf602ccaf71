//! Secondary indexing module
//!
//! Multi-map indexes used for edge adjacency and pluggable node indexes.

pub mod collection;
pub mod secondary_index;

pub use collection::{IndexEntry, KeyComparer, Projection, SecondaryIndexCollection};
pub use secondary_index::SecondaryIndex;
