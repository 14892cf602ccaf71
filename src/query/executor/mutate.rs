//! Mutating instructions
//!
//! Every map mutation pushes its undo entry while the map lock is held;
//! payload I/O happens afterwards, outside the lock, and is logged as data
//! entries.

use super::result::QueryResult;
use super::select::{evaluate_chain, Frontier};
use crate::error::{GraphError, GraphResult};
use crate::graph::{EdgeSearch, GraphEdge, GraphMap, GraphNode, Tags, DEFAULT_EDGE_TYPE};
use crate::persistence::{DataETag, DataStore};
use crate::query::ast::{NodeData, SelectStep};
use crate::trx::{ChangeEntry, ChangeLog};
use bytes::Bytes;
use tracing::debug;

pub struct Mutator<'a> {
    pub map: &'a GraphMap,
    pub store: &'a dyn DataStore,
}

impl<'a> Mutator<'a> {
    pub async fn add_node(
        &self,
        key: &str,
        tags: &Tags,
        data: &[NodeData],
        upsert: bool,
        log: &mut ChangeLog,
    ) -> GraphResult<QueryResult> {
        let mut node = GraphNode::with_tags(key, tags.clone());
        let links: Vec<_> = data.iter().map(|d| (node.add_link(&d.name), &d.payload)).collect();

        self.map.add_node(node, upsert, Some(&mut *log))?;

        for (link, payload) in links {
            let previous = self.store.try_get(&link.file_id).await?;
            self.store
                .set(&link.file_id, DataETag::new(Bytes::from(payload.clone())))
                .await?;
            debug!("Wrote payload '{}' for node '{}'", link.file_id, key);
            log.push(ChangeEntry::data_set(link.file_id, previous));
        }

        let stored = self
            .map
            .get_node(key)
            .ok_or_else(|| GraphError::Internal(format!("node '{}' missing after add", key)))?;
        Ok(QueryResult::with_nodes(vec![stored]))
    }

    pub fn add_edge(
        &self,
        from_key: &str,
        to_key: &str,
        edge_type: Option<&str>,
        tags: &Tags,
        upsert: bool,
        log: &mut ChangeLog,
    ) -> GraphResult<QueryResult> {
        let edge_type = edge_type.unwrap_or(DEFAULT_EDGE_TYPE);
        let edge = GraphEdge::with_tags(from_key, to_key, edge_type, tags.clone());
        let identity = edge.identity();
        self.map.add_edge(edge, upsert, Some(log))?;

        let stored = self
            .map
            .query_edges(&EdgeSearch::new().from_key(from_key).to_key(to_key))
            .into_iter()
            .filter(|e| e.identity() == identity)
            .collect();
        Ok(QueryResult::with_edges(stored))
    }

    pub fn update_nodes(&self, search: &[SelectStep], tags: &Tags, log: &mut ChangeLog) -> GraphResult<QueryResult> {
        let nodes = self.select_nodes(search)?;
        let mut updated = Vec::with_capacity(nodes.len());
        for node in nodes {
            let result = self.map.update_node(
                &node.key,
                |current| {
                    let mut next = current.clone();
                    next.tags = current.tags.apply(tags);
                    next
                },
                Some(&mut *log),
            )?;
            updated.push(result);
        }
        Ok(QueryResult::with_nodes(updated))
    }

    pub fn update_edges(
        &self,
        search: &[SelectStep],
        from_key: Option<&str>,
        to_key: Option<&str>,
        edge_type: Option<&str>,
        tags: &Tags,
        log: &mut ChangeLog,
    ) -> GraphResult<QueryResult> {
        let edges = self.select_edges(search)?;
        let mut updated = Vec::with_capacity(edges.len());
        for edge in edges {
            let result = self.map.update_edge(
                &edge.key,
                |current| {
                    let mut next = current.clone();
                    if let Some(from) = from_key {
                        next.from_key = from.to_string();
                    }
                    if let Some(to) = to_key {
                        next.to_key = to.to_string();
                    }
                    if let Some(edge_type) = edge_type {
                        next.edge_type = edge_type.to_string();
                    }
                    next.tags = current.tags.apply(tags);
                    next
                },
                Some(&mut *log),
            )?;
            updated.push(result);
        }
        Ok(QueryResult::with_edges(updated))
    }

    /// Delete matched nodes, their incident edges and their payloads
    pub async fn delete_nodes(&self, search: &[SelectStep], log: &mut ChangeLog) -> GraphResult<QueryResult> {
        let nodes = self.select_nodes(search)?;
        let mut removed = Vec::with_capacity(nodes.len());
        for node in nodes {
            removed.push(self.map.remove_node(&node.key, true, Some(&mut *log))?);
        }

        for node in &removed {
            for link in node.data_map.values() {
                match self.store.try_get(&link.file_id).await? {
                    Some(previous) => {
                        self.store.delete(&link.file_id).await?;
                        log.push(ChangeEntry::data_delete(link.file_id.clone(), previous));
                    }
                    None => debug!("Payload '{}' already absent", link.file_id),
                }
            }
        }
        Ok(QueryResult::with_nodes(removed))
    }

    pub fn delete_edges(&self, search: &[SelectStep], log: &mut ChangeLog) -> GraphResult<QueryResult> {
        let edges = self.select_edges(search)?;
        let mut removed = Vec::with_capacity(edges.len());
        for edge in edges {
            removed.push(self.map.remove_edge(&edge.key, Some(&mut *log))?);
        }
        Ok(QueryResult::with_edges(removed))
    }

    fn select_nodes(&self, search: &[SelectStep]) -> GraphResult<Vec<GraphNode>> {
        match evaluate_chain(self.map, search)?.frontier {
            Frontier::Nodes(nodes) => Ok(nodes),
            Frontier::Edges(_) => Err(GraphError::bad_request("search chain ends in edges, expected nodes")),
        }
    }

    fn select_edges(&self, search: &[SelectStep]) -> GraphResult<Vec<GraphEdge>> {
        match evaluate_chain(self.map, search)?.frontier {
            Frontier::Edges(edges) => Ok(edges),
            Frontier::Nodes(_) => Err(GraphError::bad_request("search chain ends in nodes, expected edges")),
        }
    }
}
