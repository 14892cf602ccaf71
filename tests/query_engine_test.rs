//! End-to-end tests: GraphLang text through the engine and back
//!
//! Covers add, select with joins and aliases, update, delete, payloads,
//! batch rollback and snapshots.

use graphlang::query::executor::AliasResult;
use graphlang::{EngineConfig, GraphEngine, GraphError, GraphLink, MemoryDataStore, StatusCode};
use std::sync::Arc;

const SETUP: &str = r#"
    add node key=alice,tags=person;
    add node key=bob,tags="person,team=core";
    add node key=carol,tags="person,team=core";
    add node key=report, body { 'quarterly numbers' }, meta { '{"pages":3}' };
    add edge fromKey=alice,toKey=bob,edgeType=knows;
    add edge fromKey=alice,toKey=carol,edgeType=knows;
    add edge fromKey=bob,toKey=report,edgeType=owns;
"#;

async fn engine() -> GraphEngine {
    let engine = GraphEngine::new(EngineConfig::default()).unwrap();
    engine.execute(SETUP).await.unwrap();
    engine
}

fn keys(result: &graphlang::QueryResult) -> Vec<String> {
    let mut keys: Vec<_> = result.nodes.iter().map(|n| n.key.clone()).collect();
    keys.sort();
    keys
}

#[tokio::test]
async fn test_setup_results_per_statement() {
    let engine = GraphEngine::new(EngineConfig::default()).unwrap();
    let batch = engine.execute(SETUP).await.unwrap();

    assert_eq!(batch.len(), 7);
    assert!(batch.items.iter().all(|item| item.status == StatusCode::Ok));
    assert_eq!(batch.items[0].nodes[0].key, "alice");
    assert_eq!(batch.items[4].edges[0].edge_type, "knows");
    assert_eq!(engine.map().node_count(), 4);
    assert_eq!(engine.map().edge_count(), 3);
}

#[tokio::test]
async fn test_left_join_follows_edge_direction() {
    let engine = engine().await;

    let batch = engine.execute("select (key=alice) -> [edgeType=knows] -> ();").await.unwrap();
    assert_eq!(keys(batch.last().unwrap()), vec!["bob", "carol"]);

    // Nothing leaves bob with type knows
    let batch = engine.execute("select (key=bob) -> [edgeType=knows] -> ();").await.unwrap();
    assert!(batch.last().unwrap().nodes.is_empty());
}

#[tokio::test]
async fn test_full_join_follows_both_directions() {
    let engine = engine().await;

    let batch = engine.execute("select (key=bob) <-> [] <-> ();").await.unwrap();
    assert_eq!(keys(batch.last().unwrap()), vec!["alice", "bob", "report"]);
}

#[tokio::test]
async fn test_aliases_capture_intermediate_results() {
    let engine = engine().await;

    let batch = engine
        .execute("select (person) A1 -> [edgeType=knows] a2 -> (team=core) a3;")
        .await
        .unwrap();
    let result = batch.last().unwrap();
    assert_eq!(keys(result), vec!["bob", "carol"]);

    match result.alias("a1") {
        Some(AliasResult::Nodes(nodes)) => assert_eq!(nodes.len(), 3),
        other => panic!("unexpected {:?}", other),
    }
    match result.alias("A2") {
        Some(AliasResult::Edges(edges)) => assert_eq!(edges.len(), 2),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(result.alias("a3").map(|a| a.len()), Some(2));
}

#[tokio::test]
async fn test_select_ending_in_edges() {
    let engine = engine().await;

    let batch = engine.execute("select [fromKey=alice];").await.unwrap();
    let result = batch.last().unwrap();
    assert!(result.nodes.is_empty());
    assert_eq!(result.edges.len(), 2);
}

#[tokio::test]
async fn test_return_loads_payloads() {
    let engine = engine().await;

    let batch = engine.execute("select (key=report) return body;").await.unwrap();
    let data = &batch.last().unwrap().data;
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].name, "body");
    assert_eq!(data[0].data, "quarterly numbers");

    let batch = engine.execute("select (key=report) return *;").await.unwrap();
    assert_eq!(batch.last().unwrap().data.len(), 2);

    let batch = engine.execute("select (key=alice) return body;").await.unwrap();
    assert!(batch.last().unwrap().data.is_empty());
}

#[tokio::test]
async fn test_update_nodes_and_edges() {
    let engine = engine().await;

    engine.execute("update (team=core) set team=platform,-person;").await.unwrap();
    let batch = engine.execute("select (team=platform);").await.unwrap();
    let result = batch.last().unwrap();
    assert_eq!(keys(result), vec!["bob", "carol"]);
    assert!(result.nodes.iter().all(|n| !n.tags.has("person")));

    engine
        .execute("update [fromKey=alice;toKey=carol] set edgeType=manages,since=2021;")
        .await
        .unwrap();
    let batch = engine.execute("select [edgeType=manages];").await.unwrap();
    let edges = &batch.last().unwrap().edges;
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].to_key, "carol");
    assert!(edges[0].tags.has_value("since", "2021"));
}

#[tokio::test]
async fn test_delete_node_cascades_edges_and_payloads() {
    let engine = engine().await;

    engine.execute("delete (key=bob);").await.unwrap();
    assert_eq!(engine.map().node_count(), 3);
    assert_eq!(engine.map().edge_count(), 1);

    engine.execute("delete (key=report);").await.unwrap();
    let link = GraphLink::for_node("report", "body");
    assert!(engine.store().try_get(&link.file_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_edges_by_chain() {
    let engine = engine().await;

    let batch = engine.execute("delete (key=alice) -> [edgeType=knows];").await.unwrap();
    assert_eq!(batch.last().unwrap().edges.len(), 2);
    assert_eq!(engine.map().edge_count(), 1);
    assert_eq!(engine.map().node_count(), 4);
}

#[tokio::test]
async fn test_failed_statement_rolls_back_whole_batch() {
    let engine = engine().await;
    let before = engine.execute("select (*);").await.unwrap().items[0].nodes.len();

    let err = engine
        .execute(
            "add node key=dave; update (key=alice) set vip; delete (key=bob); \
             add node key=report2, body { 'x' }; add node key=alice;",
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::Conflict);

    assert!(!engine.map().contains_node("dave"));
    assert!(!engine.map().contains_node("report2"));
    assert!(engine.map().contains_node("bob"));
    assert!(!engine.map().get_node("alice").unwrap().tags.has("vip"));
    assert_eq!(engine.map().edge_count(), 3);
    assert_eq!(engine.map().node_count(), before);

    let link = GraphLink::for_node("report2", "body");
    assert!(engine.store().try_get(&link.file_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_parse_error_changes_nothing() {
    let engine = engine().await;
    let err = engine.execute("add node key=zed; select (key=zed").await.unwrap_err();
    assert!(matches!(err, GraphError::Parse { .. }));
    assert!(!engine.map().contains_node("zed"));
}

#[tokio::test]
async fn test_flush_on_commit_round_trip() {
    let store = Arc::new(MemoryDataStore::new());
    let config = EngineConfig {
        flush_on_commit: true,
        ..EngineConfig::default()
    };

    let engine = GraphEngine::new(config.clone()).unwrap().with_data_store(store.clone());
    engine.execute(SETUP).await.unwrap();

    let restored = GraphEngine::new(config).unwrap().with_data_store(store);
    assert!(restored.load().await.unwrap());
    assert_eq!(restored.map().node_count(), 4);
    assert_eq!(restored.map().edge_count(), 3);

    let batch = restored.execute("select (key=report) return body;").await.unwrap();
    assert_eq!(batch.last().unwrap().data[0].data, "quarterly numbers");
}

#[tokio::test]
async fn test_load_without_snapshot() {
    let engine = GraphEngine::new(EngineConfig::default()).unwrap();
    assert!(!engine.load().await.unwrap());
}
