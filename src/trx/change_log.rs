//! Per-transaction change log
//!
//! A LIFO stack of `ChangeEntry`s. `rollback` pops and undoes until the stack
//! is empty; there is no redo.

use super::entry::{ChangeEntry, LogKey};
use crate::error::{GraphError, GraphResult};
use crate::graph::GraphMap;
use crate::persistence::DataStore;
use std::collections::HashSet;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug)]
pub struct ChangeLog {
    trx_id: Uuid,
    entries: Vec<ChangeEntry>,
}

impl ChangeLog {
    pub fn new() -> Self {
        ChangeLog {
            trx_id: Uuid::new_v4(),
            entries: Vec::new(),
        }
    }

    pub fn trx_id(&self) -> Uuid {
        self.trx_id
    }

    /// Append in execution order
    pub fn push(&mut self, entry: ChangeEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ChangeEntry] {
        &self.entries
    }

    /// Accept every change; the log is emptied
    pub fn commit(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Undo every entry in strict reverse order
    ///
    /// Graph-structure entries are undone first, each under its own map lock.
    /// Data-store entries follow, still newest first. A failing undo is logged
    /// and the pass continues with the remaining entries; the failures are then
    /// reported as one `Conflict`.
    pub async fn rollback(&mut self, map: &GraphMap, store: &dyn DataStore) -> GraphResult<()> {
        info!("Rolling back transaction {} ({} entries)", self.trx_id, self.entries.len());

        let mut undone: HashSet<LogKey> = HashSet::new();
        let mut data_entries = Vec::new();
        let mut failures = Vec::new();

        while let Some(entry) = self.entries.pop() {
            if !undone.insert(entry.log_key()) {
                continue;
            }

            if entry.is_data() {
                data_entries.push(entry);
                continue;
            }

            if let Err(e) = entry.undo_graph(map) {
                error!("Undo failed for {}: {}", entry, e);
                failures.push(format!("{}: {}", entry, e));
            }
        }

        for entry in data_entries {
            if let Err(e) = entry.undo_data(store).await {
                error!("Undo failed for {}: {}", entry, e);
                failures.push(format!("{}: {}", entry, e));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(GraphError::conflict(format!(
                "rollback of transaction {} incomplete: {}",
                self.trx_id,
                failures.join("; ")
            )))
        }
    }
}

impl Default for ChangeLog {
    fn default() -> Self {
        Self::new()
    }
}
