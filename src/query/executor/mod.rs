//! GraphLang execution engine
//!
//! A batch is parsed as a unit and executed as one transaction: every
//! instruction shares one `ChangeLog`, and the first failure rolls the whole
//! batch back before the error is returned.

pub mod mutate;
pub mod result;
pub mod select;

pub use mutate::Mutator;
pub use result::{AliasResult, GraphLinkData, QueryBatchResult, QueryResult};
pub use select::{evaluate_chain, ChainResult, Frontier};

use crate::config::EngineConfig;
use crate::error::{GraphError, GraphResult};
use crate::graph::GraphMap;
use crate::persistence::{DataStore, ETag, GraphSnapshot, MemoryDataStore};
use crate::query::ast::{GraphInstruction, SelectStep};
use crate::query::grammar::load_grammar;
use crate::query::parser::GraphLangParser;
use crate::trx::ChangeLog;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub struct GraphEngine {
    config: EngineConfig,
    map: Arc<GraphMap>,
    store: Arc<dyn DataStore>,
    parser: GraphLangParser,
    /// Batches run one at a time
    batch_lock: Mutex<()>,
}

impl GraphEngine {
    pub fn new(config: EngineConfig) -> GraphResult<Self> {
        let parser = match &config.grammar_path {
            Some(path) => GraphLangParser::with_grammar(load_grammar(path)?),
            None => GraphLangParser::new()?,
        };

        Ok(GraphEngine {
            config,
            map: Arc::new(GraphMap::new()),
            store: Arc::new(MemoryDataStore::new()),
            parser,
            batch_lock: Mutex::new(()),
        })
    }

    pub fn with_data_store(mut self, store: Arc<dyn DataStore>) -> Self {
        self.store = store;
        self
    }

    /// Run against an existing map, e.g. one built with a remove hook
    pub fn with_map(mut self, map: Arc<GraphMap>) -> Self {
        self.map = map;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn map(&self) -> &Arc<GraphMap> {
        &self.map
    }

    pub fn store(&self) -> &Arc<dyn DataStore> {
        &self.store
    }

    pub fn parse(&self, text: &str) -> GraphResult<Vec<GraphInstruction>> {
        self.parser.parse(text)
    }

    pub async fn execute(&self, text: &str) -> GraphResult<QueryBatchResult> {
        let instructions = self.parse(text)?;
        self.execute_instructions(&instructions, None).await
    }

    /// Execute, checking `cancel` between instructions
    pub async fn execute_with_cancel(&self, text: &str, cancel: &AtomicBool) -> GraphResult<QueryBatchResult> {
        let instructions = self.parse(text)?;
        self.execute_instructions(&instructions, Some(cancel)).await
    }

    pub async fn execute_instructions(
        &self,
        instructions: &[GraphInstruction],
        cancel: Option<&AtomicBool>,
    ) -> GraphResult<QueryBatchResult> {
        let _guard = self.batch_lock.lock().await;
        let mut log = ChangeLog::new();
        let mut batch = QueryBatchResult::default();
        info!("Executing batch {} ({} instructions)", log.trx_id(), instructions.len());

        for (position, instruction) in instructions.iter().enumerate() {
            if cancel.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
                warn!("Batch {} cancelled before instruction {}", log.trx_id(), position + 1);
                self.rollback(&mut log).await;
                return Err(GraphError::conflict("cancelled"));
            }

            debug!("Instruction {}: {}", position + 1, instruction);
            match self.execute_one(instruction, &mut log).await {
                Ok(result) => batch.items.push(result),
                Err(e) => {
                    warn!("Instruction {} ({}) failed: {}", position + 1, instruction.name(), e);
                    self.rollback(&mut log).await;
                    return Err(e);
                }
            }
        }

        let changes = log.commit();
        info!("Committed batch {} ({} changes)", log.trx_id(), changes);

        if self.config.flush_on_commit && changes > 0 {
            self.flush().await?;
        }
        Ok(batch)
    }

    async fn execute_one(&self, instruction: &GraphInstruction, log: &mut ChangeLog) -> GraphResult<QueryResult> {
        let mutator = Mutator {
            map: &self.map,
            store: self.store.as_ref(),
        };

        match instruction {
            GraphInstruction::NodeAdd { key, tags, data, upsert } => {
                mutator.add_node(key, tags, data, *upsert, log).await
            }
            GraphInstruction::EdgeAdd {
                from_key,
                to_key,
                edge_type,
                tags,
                upsert,
            } => mutator.add_edge(from_key, to_key, edge_type.as_deref(), tags, *upsert, log),
            GraphInstruction::NodeUpdate { search, tags } => mutator.update_nodes(search, tags, log),
            GraphInstruction::EdgeUpdate {
                search,
                from_key,
                to_key,
                edge_type,
                tags,
            } => mutator.update_edges(
                search,
                from_key.as_deref(),
                to_key.as_deref(),
                edge_type.as_deref(),
                tags,
                log,
            ),
            GraphInstruction::NodeDelete { search } => mutator.delete_nodes(search, log).await,
            GraphInstruction::EdgeDelete { search } => mutator.delete_edges(search, log),
            GraphInstruction::Select { steps } => self.select(steps).await,
        }
    }

    async fn select(&self, steps: &[SelectStep]) -> GraphResult<QueryResult> {
        let chain = evaluate_chain(&self.map, steps)?;
        let mut result = match chain.frontier {
            Frontier::Nodes(nodes) => QueryResult::with_nodes(nodes),
            Frontier::Edges(edges) => QueryResult::with_edges(edges),
        };
        result.alias = chain.alias;

        if !chain.return_names.is_empty() {
            result.data = select::load_return_data(self.store.as_ref(), &result.nodes, &chain.return_names).await?;
        }
        Ok(result)
    }

    /// Roll back; undo failures are logged by the change log and do not
    /// replace the error that triggered the rollback
    async fn rollback(&self, log: &mut ChangeLog) {
        if let Err(e) = log.rollback(&self.map, self.store.as_ref()).await {
            error!("Rollback of batch {} incomplete: {}", log.trx_id(), e);
        }
    }

    /// Write the current map to the data store
    pub async fn flush(&self) -> GraphResult<ETag> {
        GraphSnapshot::capture(&self.map)
            .save(self.store.as_ref(), &self.config.snapshot_key)
            .await
    }

    /// Replace the map with the stored snapshot; `false` when none exists
    pub async fn load(&self) -> GraphResult<bool> {
        let _guard = self.batch_lock.lock().await;
        match GraphSnapshot::load(self.store.as_ref(), &self.config.snapshot_key).await? {
            Some(snapshot) => {
                snapshot.restore_into(&self.map)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
