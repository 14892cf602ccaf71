//! External data store seam
//!
//! Payload bytes linked from nodes, and graph snapshots, live behind a narrow
//! get/set/delete-by-key interface keyed by a free-form file id. The engine
//! never interprets the bytes.

use crate::error::GraphResult;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Content version tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ETag(pub String);

impl ETag {
    /// Content hash of the payload (first 16 bytes of SHA-256, hex)
    pub fn compute(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let hex: String = digest.iter().take(16).map(|b| format!("{:02x}", b)).collect();
        ETag(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payload plus the etag it was read with (or is expected to overwrite)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataETag {
    pub data: Bytes,
    pub etag: Option<ETag>,
}

impl DataETag {
    pub fn new(data: impl Into<Bytes>) -> Self {
        DataETag {
            data: data.into(),
            etag: None,
        }
    }

    pub fn with_etag(data: impl Into<Bytes>, etag: ETag) -> Self {
        DataETag {
            data: data.into(),
            etag: Some(etag),
        }
    }

    /// Drop the etag so the value can be written unconditionally
    pub fn unconditional(&self) -> Self {
        DataETag {
            data: self.data.clone(),
            etag: None,
        }
    }
}

/// Key/value blob store consumed by the engine
///
/// - `get` fails with `NotFound` when the key is absent
/// - `set` fails with `Conflict` when `value.etag` is given and stale
/// - `delete` fails with `NotFound` when the key is absent
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn get(&self, key: &str) -> GraphResult<DataETag>;

    async fn set(&self, key: &str, value: DataETag) -> GraphResult<ETag>;

    async fn delete(&self, key: &str) -> GraphResult<()>;

    /// `get` that maps `NotFound` to `None`
    async fn try_get(&self, key: &str) -> GraphResult<Option<DataETag>> {
        match self.get(key).await {
            Ok(value) => Ok(Some(value)),
            Err(crate::error::GraphError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
