//! Search chain evaluation
//!
//! Steps run left to right. A node step after an edge step keeps the nodes
//! the edges lead to (`->`: targets, `<->`: both endpoints); an edge step
//! after a node step keeps the edges leaving (`->`) or touching (`<->`)
//! those nodes.

use super::result::{AliasResult, GraphLinkData};
use crate::error::{GraphError, GraphResult};
use crate::graph::{key_id, EdgeDirection, EdgeKey, EdgeSearch, GraphEdge, GraphMap, GraphNode, NodeSearch};
use crate::persistence::DataStore;
use crate::query::ast::{JoinKind, SelectStep};
use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Result set of the most recent search step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frontier {
    Nodes(Vec<GraphNode>),
    Edges(Vec<GraphEdge>),
}

#[derive(Debug, Clone)]
pub struct ChainResult {
    pub frontier: Frontier,
    pub alias: BTreeMap<String, AliasResult>,
    pub return_names: Vec<String>,
}

pub fn evaluate_chain(map: &GraphMap, steps: &[SelectStep]) -> GraphResult<ChainResult> {
    let mut frontier: Option<Frontier> = None;
    let mut join = JoinKind::Left;
    let mut alias = BTreeMap::new();
    let mut return_names = Vec::new();

    for step in steps {
        match step {
            SelectStep::Join(kind) => join = *kind,
            SelectStep::ReturnNames(names) => return_names = names.clone(),
            SelectStep::Node(search) => {
                let nodes = match &frontier {
                    None => map.query_nodes(search),
                    Some(Frontier::Edges(edges)) => nodes_from_edges(map, edges, search, join),
                    Some(Frontier::Nodes(_)) => {
                        return Err(GraphError::bad_request("node search cannot follow a node search"))
                    }
                };
                if let Some(name) = &search.alias {
                    alias.insert(name.to_lowercase(), AliasResult::Nodes(nodes.clone()));
                }
                frontier = Some(Frontier::Nodes(nodes));
            }
            SelectStep::Edge(search) => {
                let edges = match &frontier {
                    None => map.query_edges(search),
                    Some(Frontier::Nodes(nodes)) => edges_from_nodes(map, nodes, search, join),
                    Some(Frontier::Edges(_)) => {
                        return Err(GraphError::bad_request("edge search cannot follow an edge search"))
                    }
                };
                if let Some(name) = &search.alias {
                    alias.insert(name.to_lowercase(), AliasResult::Edges(edges.clone()));
                }
                frontier = Some(Frontier::Edges(edges));
            }
        }
    }

    let frontier = frontier.ok_or_else(|| GraphError::bad_request("empty search chain"))?;
    debug!(
        "Chain of {} steps matched {}",
        steps.len(),
        match &frontier {
            Frontier::Nodes(nodes) => format!("{} nodes", nodes.len()),
            Frontier::Edges(edges) => format!("{} edges", edges.len()),
        }
    );
    Ok(ChainResult {
        frontier,
        alias,
        return_names,
    })
}

fn nodes_from_edges(map: &GraphMap, edges: &[GraphEdge], search: &NodeSearch, join: JoinKind) -> Vec<GraphNode> {
    let mut keys: IndexSet<String> = IndexSet::new();
    for edge in edges {
        if join == JoinKind::Full {
            keys.insert(key_id(&edge.from_key));
        }
        keys.insert(key_id(&edge.to_key));
    }

    keys.iter()
        .filter_map(|key| map.get_node(key))
        .filter(|node| search.is_match(node))
        .collect()
}

fn edges_from_nodes(map: &GraphMap, nodes: &[GraphNode], search: &EdgeSearch, join: JoinKind) -> Vec<GraphEdge> {
    let direction = match join {
        JoinKind::Left => EdgeDirection::Directed,
        JoinKind::Full => EdgeDirection::Both,
    };

    let mut seen: FxHashSet<EdgeKey> = FxHashSet::default();
    let mut edges = Vec::new();
    for node in nodes {
        for edge in map.edges_for_node(&node.key, direction) {
            if search.is_match(&edge) && seen.insert(edge.key) {
                edges.push(edge);
            }
        }
    }
    edges
}

/// Fetch the named payloads of `nodes`; `*` returns every payload
pub async fn load_return_data(
    store: &dyn DataStore,
    nodes: &[GraphNode],
    names: &[String],
) -> GraphResult<Vec<GraphLinkData>> {
    let mut data = Vec::new();
    let all = names.iter().any(|n| n == "*");

    for node in nodes {
        let links: Vec<_> = if all {
            node.data_map.values().collect()
        } else {
            names
                .iter()
                .filter_map(|name| node.data_map.get(&name.to_lowercase()))
                .collect()
        };

        for link in links {
            match store.try_get(&link.file_id).await? {
                Some(value) => data.push(GraphLinkData {
                    node_key: node.key.clone(),
                    name: link.name.clone(),
                    file_id: link.file_id.clone(),
                    data: String::from_utf8_lossy(&value.data).into_owned(),
                }),
                None => warn!("Payload '{}' of node '{}' is missing from the data store", link.file_id, node.key),
            }
        }
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Tags;

    fn sample() -> GraphMap {
        let map = GraphMap::new();
        for (key, tags) in [("a", "team"), ("b", "team"), ("c", "schedule"), ("d", "")] {
            map.add_node(GraphNode::with_tags(key, tags), false, None).unwrap();
        }
        map.add_edge(GraphEdge::with_tags("a", "b", "peer", "t1"), false, None).unwrap();
        map.add_edge(GraphEdge::new("a", "c", "owns"), false, None).unwrap();
        map.add_edge(GraphEdge::new("d", "a", "owns"), false, None).unwrap();
        map
    }

    fn keys(frontier: &Frontier) -> Vec<String> {
        match frontier {
            Frontier::Nodes(nodes) => nodes.iter().map(|n| n.key.clone()).collect(),
            Frontier::Edges(edges) => edges.iter().map(|e| format!("{}>{}", e.from_key, e.to_key)).collect(),
        }
    }

    #[test]
    fn test_left_join_follows_direction() {
        let map = sample();
        let steps = vec![
            SelectStep::Node(NodeSearch::new().key("a")),
            SelectStep::Join(JoinKind::Left),
            SelectStep::Edge(EdgeSearch::new().edge_type("owns")),
            SelectStep::Join(JoinKind::Left),
            SelectStep::Node(NodeSearch::default()),
        ];
        let result = evaluate_chain(&map, &steps).unwrap();
        assert_eq!(keys(&result.frontier), vec!["c"]);
    }

    #[test]
    fn test_full_join_uses_both_directions() {
        let map = sample();
        let steps = vec![
            SelectStep::Node(NodeSearch::new().key("a")),
            SelectStep::Join(JoinKind::Full),
            SelectStep::Edge(EdgeSearch::new().edge_type("owns")),
        ];
        let result = evaluate_chain(&map, &steps).unwrap();
        assert_eq!(keys(&result.frontier), vec!["a>c", "d>a"]);
    }

    #[test]
    fn test_aliases_capture_each_step() {
        let map = sample();
        let mut first = NodeSearch::new().tags(Tags::parse("team"));
        first.alias = Some("Members".into());
        let mut second = EdgeSearch::new();
        second.alias = Some("links".into());
        let steps = vec![
            SelectStep::Node(first),
            SelectStep::Join(JoinKind::Left),
            SelectStep::Edge(second),
            SelectStep::ReturnNames(vec!["doc".into()]),
        ];

        let result = evaluate_chain(&map, &steps).unwrap();
        assert_eq!(result.alias["members"].len(), 2);
        assert_eq!(result.alias["links"].len(), 2);
        assert_eq!(result.return_names, vec!["doc".to_string()]);
    }

    #[test]
    fn test_edge_first_chain() {
        let map = sample();
        let steps = vec![
            SelectStep::Edge(EdgeSearch::new().edge_type("pe*")),
            SelectStep::Join(JoinKind::Full),
            SelectStep::Node(NodeSearch::default()),
        ];
        let result = evaluate_chain(&map, &steps).unwrap();
        assert_eq!(keys(&result.frontier), vec!["a", "b"]);
    }
}
