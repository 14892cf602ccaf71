//! Integration tests for GraphLang parsing
//!
//! Statement text in, typed instructions out, with unset fields left empty.

use graphlang::query::ast::JoinKind;
use graphlang::{parse_graphlang, GraphError, GraphInstruction, SelectStep, Tags};

fn single(text: &str) -> GraphInstruction {
    let mut instructions = parse_graphlang(text).unwrap();
    assert_eq!(instructions.len(), 1, "{}", text);
    instructions.remove(0)
}

#[test]
fn test_node_add_literal() {
    match single("add node key=key1,tags=t1;") {
        GraphInstruction::NodeAdd { key, tags, data, upsert } => {
            assert_eq!(key, "key1");
            assert_eq!(tags, Tags::parse("t1"));
            assert!(data.is_empty());
            assert!(!upsert);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_edge_add_literal() {
    match single("add edge fromKey=key1,toKey=key2,edgeType=et,tags=t2;") {
        GraphInstruction::EdgeAdd {
            from_key,
            to_key,
            edge_type,
            tags,
            upsert,
        } => {
            assert_eq!(from_key, "key1");
            assert_eq!(to_key, "key2");
            assert_eq!(edge_type.as_deref(), Some("et"));
            assert_eq!(tags, Tags::parse("t2"));
            assert!(!upsert);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_edge_add_without_type() {
    match single("upsert edge fromKey=key1,toKey=key2;") {
        GraphInstruction::EdgeAdd { edge_type, tags, upsert, .. } => {
            assert!(edge_type.is_none());
            assert!(tags.is_empty());
            assert!(upsert);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_node_update_literal() {
    match single("update (key=key1) set tags=t2;") {
        GraphInstruction::NodeUpdate { search, tags } => {
            assert_eq!(search.len(), 1);
            match &search[0] {
                SelectStep::Node(node) => {
                    assert_eq!(node.key.as_deref(), Some("key1"));
                    assert!(node.tags.is_empty());
                    assert!(node.alias.is_none());
                }
                other => panic!("unexpected {:?}", other),
            }
            assert_eq!(tags, Tags::parse("t2"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_edge_update_literal() {
    match single("update [edgeType=abc*;schedulework:active] set fromKey=key1,toKey=key2,edgeType=et,tags=t2;") {
        GraphInstruction::EdgeUpdate {
            search,
            from_key,
            to_key,
            edge_type,
            tags,
        } => {
            match &search[0] {
                SelectStep::Edge(edge) => {
                    assert_eq!(edge.edge_type.as_deref(), Some("abc*"));
                    assert!(edge.tags.has("schedulework:active"));
                    assert!(edge.from_key.is_none());
                    assert!(edge.to_key.is_none());
                    assert!(edge.node_key.is_none());
                }
                other => panic!("unexpected {:?}", other),
            }
            assert_eq!(from_key.as_deref(), Some("key1"));
            assert_eq!(to_key.as_deref(), Some("key2"));
            assert_eq!(edge_type.as_deref(), Some("et"));
            assert_eq!(tags, Tags::parse("t2"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_edge_delete_literal() {
    match single("delete [schedulework:active];") {
        GraphInstruction::EdgeDelete { search } => {
            assert_eq!(search.len(), 1);
            assert!(matches!(&search[0], SelectStep::Edge(e) if e.tags.has("schedulework:active")));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_delete_chain_with_aliases() {
    match single("delete (key=key91) a1 -> [fromKey=key1] a2;") {
        GraphInstruction::EdgeDelete { search } => {
            assert_eq!(search.len(), 3);
            assert_eq!(search[0].alias(), Some("a1"));
            assert_eq!(search[1], SelectStep::Join(JoinKind::Left));
            assert_eq!(search[2].alias(), Some("a2"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_select_literals() {
    match single("select (key=key1);") {
        GraphInstruction::Select { steps } => {
            assert!(matches!(&steps[..], [SelectStep::Node(n)] if n.key.as_deref() == Some("key1")));
        }
        other => panic!("unexpected {:?}", other),
    }

    match single("select [fromKey=key1];") {
        GraphInstruction::Select { steps } => {
            assert!(matches!(&steps[..], [SelectStep::Edge(e)] if e.from_key.as_deref() == Some("key1")));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_node_delete_literal() {
    match single("delete (key=key1;tags=t1);") {
        GraphInstruction::NodeDelete { search } => match &search[..] {
            [SelectStep::Node(node)] => {
                assert_eq!(node.key.as_deref(), Some("key1"));
                assert_eq!(node.tags, Tags::parse("t1"));
            }
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_edge_delete_by_identity_literal() {
    match single("delete [fromKey=key1;toKey=key2;edgeType=abc*;schedulework:active];") {
        GraphInstruction::EdgeDelete { search } => match &search[..] {
            [SelectStep::Edge(edge)] => {
                assert_eq!(edge.from_key.as_deref(), Some("key1"));
                assert_eq!(edge.to_key.as_deref(), Some("key2"));
                assert_eq!(edge.edge_type.as_deref(), Some("abc*"));
                assert!(edge.tags.has("schedulework:active"));
            }
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_select_chain_literal() {
    match single("select (key=key1;tags=t1) a1 -> [edgeType=et;tags=t2] a2 -> (schedule) a3;") {
        GraphInstruction::Select { steps } => {
            assert_eq!(steps.len(), 5);
            match &steps[0] {
                SelectStep::Node(node) => {
                    assert_eq!(node.key.as_deref(), Some("key1"));
                    assert_eq!(node.tags, Tags::parse("t1"));
                    assert_eq!(node.alias.as_deref(), Some("a1"));
                }
                other => panic!("unexpected {:?}", other),
            }
            assert_eq!(steps[1], SelectStep::Join(JoinKind::Left));
            match &steps[2] {
                SelectStep::Edge(edge) => {
                    assert_eq!(edge.edge_type.as_deref(), Some("et"));
                    assert_eq!(edge.tags, Tags::parse("t2"));
                    assert_eq!(edge.alias.as_deref(), Some("a2"));
                }
                other => panic!("unexpected {:?}", other),
            }
            match &steps[4] {
                SelectStep::Node(node) => {
                    assert!(node.key.is_none());
                    assert!(node.tags.has("schedule"));
                    assert_eq!(node.alias.as_deref(), Some("a3"));
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_eight_statement_batch() {
    let text = r#"
        add node key=key1,tags=t1;
        add edge fromKey=key1,toKey=key2,edgeType=et,tags=t2;
        update (key=key1) set tags=t2;
        update [edgeType=abc*;schedulework:active] set fromKey=key1,toKey=key2,edgeType=et,tags=t2;
        delete [schedulework:active];
        delete (key=key91) a1 -> [fromKey=key1] a2;
        select (key=key1);
        select [fromKey=key1];
    "#;

    let instructions = parse_graphlang(text).unwrap();
    let names: Vec<_> = instructions.iter().map(|i| i.name()).collect();
    assert_eq!(
        names,
        vec![
            "node-add",
            "edge-add",
            "node-update",
            "edge-update",
            "edge-delete",
            "edge-delete",
            "select",
            "select",
        ]
    );

    match &instructions[0] {
        GraphInstruction::NodeAdd { key, tags, data, upsert } => {
            assert_eq!(key, "key1");
            assert_eq!(*tags, Tags::parse("t1"));
            assert!(data.is_empty());
            assert!(!upsert);
        }
        other => panic!("unexpected {:?}", other),
    }

    match &instructions[1] {
        GraphInstruction::EdgeAdd {
            from_key,
            to_key,
            edge_type,
            tags,
            upsert,
        } => {
            assert_eq!(from_key, "key1");
            assert_eq!(to_key, "key2");
            assert_eq!(edge_type.as_deref(), Some("et"));
            assert_eq!(*tags, Tags::parse("t2"));
            assert!(!upsert);
        }
        other => panic!("unexpected {:?}", other),
    }

    match &instructions[2] {
        GraphInstruction::NodeUpdate { search, tags } => {
            match &search[..] {
                [SelectStep::Node(node)] => {
                    assert_eq!(node.key.as_deref(), Some("key1"));
                    assert!(node.tags.is_empty());
                    assert!(node.alias.is_none());
                }
                other => panic!("unexpected {:?}", other),
            }
            assert_eq!(*tags, Tags::parse("t2"));
        }
        other => panic!("unexpected {:?}", other),
    }

    match &instructions[3] {
        GraphInstruction::EdgeUpdate {
            search,
            from_key,
            to_key,
            edge_type,
            tags,
        } => {
            match &search[..] {
                [SelectStep::Edge(edge)] => {
                    assert_eq!(edge.edge_type.as_deref(), Some("abc*"));
                    assert_eq!(edge.tags, Tags::parse("schedulework:active"));
                    assert!(edge.from_key.is_none());
                    assert!(edge.to_key.is_none());
                    assert!(edge.node_key.is_none());
                    assert!(edge.alias.is_none());
                }
                other => panic!("unexpected {:?}", other),
            }
            assert_eq!(from_key.as_deref(), Some("key1"));
            assert_eq!(to_key.as_deref(), Some("key2"));
            assert_eq!(edge_type.as_deref(), Some("et"));
            assert_eq!(*tags, Tags::parse("t2"));
        }
        other => panic!("unexpected {:?}", other),
    }

    match &instructions[4] {
        GraphInstruction::EdgeDelete { search } => match &search[..] {
            [SelectStep::Edge(edge)] => {
                assert_eq!(edge.tags, Tags::parse("schedulework:active"));
                assert!(edge.edge_type.is_none());
                assert!(edge.from_key.is_none());
                assert!(edge.to_key.is_none());
                assert!(edge.alias.is_none());
            }
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }

    match &instructions[5] {
        GraphInstruction::EdgeDelete { search } => match &search[..] {
            [SelectStep::Node(node), SelectStep::Join(JoinKind::Left), SelectStep::Edge(edge)] => {
                assert_eq!(node.key.as_deref(), Some("key91"));
                assert!(node.tags.is_empty());
                assert_eq!(node.alias.as_deref(), Some("a1"));
                assert_eq!(edge.from_key.as_deref(), Some("key1"));
                assert!(edge.to_key.is_none());
                assert!(edge.edge_type.is_none());
                assert!(edge.tags.is_empty());
                assert_eq!(edge.alias.as_deref(), Some("a2"));
            }
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }

    match &instructions[6] {
        GraphInstruction::Select { steps } => match &steps[..] {
            [SelectStep::Node(node)] => {
                assert_eq!(node.key.as_deref(), Some("key1"));
                assert!(node.tags.is_empty());
                assert!(node.alias.is_none());
            }
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }

    match &instructions[7] {
        GraphInstruction::Select { steps } => match &steps[..] {
            [SelectStep::Edge(edge)] => {
                assert_eq!(edge.from_key.as_deref(), Some("key1"));
                assert!(edge.to_key.is_none());
                assert!(edge.edge_type.is_none());
                assert!(edge.tags.is_empty());
                assert!(edge.alias.is_none());
            }
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_keywords_are_case_insensitive() {
    let instructions = parse_graphlang("ADD NODE key=a; Select (key=a);").unwrap();
    assert_eq!(instructions.len(), 2);
}

#[test]
fn test_quoted_tag_value() {
    match single(r#"add node key=doc, title="hello world";"#) {
        GraphInstruction::NodeAdd { tags, .. } => assert!(tags.has_value("title", "hello world")),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_syntax_errors_carry_token_index() {
    let err = parse_graphlang("delete (key=key1;").unwrap_err();
    match err {
        GraphError::Parse { index, .. } => assert_eq!(index, 6),
        other => panic!("unexpected {:?}", other),
    }

    assert!(matches!(parse_graphlang("add node key=a"), Err(GraphError::Parse { .. })));
    assert!(matches!(parse_graphlang("frobnicate node key=a;"), Err(GraphError::Parse { .. })));
}

#[test]
fn test_invalid_chains_are_rejected() {
    for text in [
        "select (key=a) (key=b);",
        "select [edgeType=x] -> [edgeType=y];",
        "delete (key=a) return doc;",
        "select -> (key=a);",
    ] {
        assert!(parse_graphlang(text).is_err(), "{}", text);
    }
}
