//! In-memory data store
//!
//! Backed by a `HashMap` behind a tokio `RwLock`. Suitable for tests and for
//! embedding without durable storage; all data is lost when dropped.

use super::data_store::{DataETag, DataStore, ETag};
use crate::error::{GraphError, GraphResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
pub struct MemoryDataStore {
    data: RwLock<HashMap<String, DataETag>>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

fn normalize(key: &str) -> String {
    key.to_lowercase()
}

#[async_trait]
impl DataStore for MemoryDataStore {
    async fn get(&self, key: &str) -> GraphResult<DataETag> {
        self.data
            .read()
            .await
            .get(&normalize(key))
            .cloned()
            .ok_or_else(|| GraphError::not_found(format!("file '{}' not found", key)))
    }

    async fn set(&self, key: &str, value: DataETag) -> GraphResult<ETag> {
        let mut data = self.data.write().await;
        let id = normalize(key);

        if let (Some(expected), Some(current)) = (&value.etag, data.get(&id)) {
            if current.etag.as_ref() != Some(expected) {
                return Err(GraphError::conflict(format!("stale etag for file '{}'", key)));
            }
        }

        let etag = ETag::compute(&value.data);
        debug!("Set file '{}' etag={}", key, etag);
        data.insert(id, DataETag::with_etag(value.data, etag.clone()));
        Ok(etag)
    }

    async fn delete(&self, key: &str) -> GraphResult<()> {
        match self.data.write().await.remove(&normalize(key)) {
            Some(_) => {
                debug!("Deleted file '{}'", key);
                Ok(())
            }
            None => Err(GraphError::not_found(format!("file '{}' not found", key))),
        }
    }
}
