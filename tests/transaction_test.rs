//! Integration tests for change-log rollback
//!
//! Every entry kind must restore the state from before its mutation, and a
//! whole sequence must unwind in reverse order.

use bytes::Bytes;
use graphlang::{
    ChangeEntry, ChangeLog, DataETag, DataStore, EdgeKey, EdgeSearch, GraphEdge, GraphMap, GraphNode, MemoryDataStore,
    Tags,
};
use std::collections::{BTreeMap, BTreeSet};

fn base() -> GraphMap {
    let map = GraphMap::new();
    map.add_node(GraphNode::with_tags("a", "t1"), false, None).unwrap();
    map.add_node(GraphNode::with_tags("b", "t2"), false, None).unwrap();
    map.add_edge(GraphEdge::with_tags("a", "b", "link", "w=1"), false, None).unwrap();
    map
}

/// Map contents independent of insertion order
fn contents(map: &GraphMap) -> (Vec<GraphNode>, Vec<GraphEdge>) {
    let (mut nodes, mut edges) = map.export();
    nodes.sort_by_key(|n| n.key_id());
    edges.sort_by_key(|e| e.key);
    (nodes, edges)
}

async fn assert_undone<F>(mutate: F)
where
    F: FnOnce(&GraphMap, &mut ChangeLog),
{
    let map = base();
    let before = contents(&map);
    let store = MemoryDataStore::new();

    let mut log = ChangeLog::new();
    mutate(&map, &mut log);
    assert!(!log.is_empty());
    assert_ne!(contents(&map), before);

    log.rollback(&map, &store).await.unwrap();
    assert_eq!(contents(&map), before);
    assert!(log.is_empty());
}

#[tokio::test]
async fn test_undo_node_add() {
    assert_undone(|map, log| {
        map.add_node(GraphNode::new("c"), false, Some(log)).unwrap();
    })
    .await;
}

#[tokio::test]
async fn test_undo_node_change() {
    assert_undone(|map, log| {
        map.update_node(
            "a",
            |current| {
                let mut next = current.clone();
                next.tags = current.tags.apply(&Tags::parse("t9"));
                next
            },
            Some(log),
        )
        .unwrap();
    })
    .await;
}

#[tokio::test]
async fn test_undo_node_delete_with_cascade() {
    assert_undone(|map, log| {
        map.remove_node("b", true, Some(log)).unwrap();
        assert_eq!(log.len(), 2);
    })
    .await;
}

#[tokio::test]
async fn test_undo_edge_add() {
    assert_undone(|map, log| {
        map.add_edge(GraphEdge::new("b", "a", "back"), false, Some(log)).unwrap();
    })
    .await;
}

#[tokio::test]
async fn test_undo_edge_change_and_delete() {
    assert_undone(|map, log| {
        let edge = map.query_edges(&EdgeSearch::new().edge_type("link")).remove(0);
        map.update_edge(
            &edge.key,
            |current| {
                let mut next = current.clone();
                next.edge_type = "renamed".into();
                next
            },
            Some(&mut *log),
        )
        .unwrap();
        map.remove_edge(&edge.key, Some(log)).unwrap();
    })
    .await;
}

#[tokio::test]
async fn test_many_mutations_roll_back_in_reverse() {
    let map = base();
    let before = contents(&map);
    let (from_before, to_before) = map.adjacency_snapshot();
    let store = MemoryDataStore::new();

    let mut log = ChangeLog::new();
    for i in 0..25 {
        let key = format!("n{}", i);
        map.add_node(GraphNode::new(key.as_str()), false, Some(&mut log)).unwrap();
        map.add_edge(GraphEdge::new("a", key.as_str(), "fan"), false, Some(&mut log)).unwrap();
    }
    map.add_node(GraphNode::with_tags("a", "t5"), true, Some(&mut log)).unwrap();
    map.remove_node("n3", true, Some(&mut log)).unwrap();
    map.remove_node("b", true, Some(&mut log)).unwrap();
    assert_eq!(map.node_count(), 25);

    log.rollback(&map, &store).await.unwrap();

    assert_eq!(contents(&map), before);
    let (from_after, to_after) = map.adjacency_snapshot();
    let non_empty = |index: BTreeMap<String, BTreeSet<EdgeKey>>| {
        index.into_iter().filter(|(_, keys)| !keys.is_empty()).collect::<Vec<_>>()
    };
    assert_eq!(non_empty(from_after), non_empty(from_before));
    assert_eq!(non_empty(to_after), non_empty(to_before));
}

#[tokio::test]
async fn test_undo_payload_entries() {
    let map = GraphMap::new();
    let store = MemoryDataStore::new();
    store.set("doc/body", DataETag::new(Bytes::from_static(b"v1"))).await.unwrap();

    let mut log = ChangeLog::new();

    let previous = store.get("doc/body").await.unwrap();
    store.delete("doc/body").await.unwrap();
    log.push(ChangeEntry::data_delete("doc/body", previous));

    store.set("doc/meta", DataETag::new(Bytes::from_static(b"m"))).await.unwrap();
    log.push(ChangeEntry::data_set("doc/meta", None));

    log.rollback(&map, &store).await.unwrap();
    assert_eq!(store.get("doc/body").await.unwrap().data, Bytes::from_static(b"v1"));
    assert!(store.try_get("doc/meta").await.unwrap().is_none());
}

#[test]
fn test_commit_discards_entries() {
    let map = base();
    let mut log = ChangeLog::new();
    map.add_node(GraphNode::new("c"), false, Some(&mut log)).unwrap();
    assert_eq!(log.commit(), 1);
    assert!(log.is_empty());
    assert!(map.contains_node("c"));
}
