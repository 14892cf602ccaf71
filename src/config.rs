//! Engine configuration

use crate::error::GraphResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SNAPSHOT_KEY: &str = "graph/graph-map.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Grammar file replacing the built-in GraphLang grammar
    pub grammar_path: Option<PathBuf>,
    /// Data store key used by flush and load
    pub snapshot_key: String,
    /// Write a snapshot after every successful batch
    pub flush_on_commit: bool,
    /// Default `tracing` filter for the demo binary
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grammar_path: None,
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
            flush_on_commit: false,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(text: &str) -> GraphResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> GraphResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}
