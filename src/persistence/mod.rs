//! Persistence seam for payloads and graph snapshots
//!
//! Durable storage is an external collaborator reached through the
//! `DataStore` trait; `MemoryDataStore` is the in-process implementation.

pub mod data_store;
pub mod memory;
pub mod snapshot;

pub use data_store::{DataETag, DataStore, ETag};
pub use memory::MemoryDataStore;
pub use snapshot::GraphSnapshot;
