//! Built-in GraphLang grammar
//!
//! The grammar text lives next to this file and is compiled once per process.

use crate::error::{GraphError, GraphResult};
use crate::query::meta::{MetaParser, MetaSyntaxRoot};
use std::path::Path;
use std::sync::{Arc, LazyLock};
use tracing::info;

pub const GRAPHLANG_GRAMMAR: &str = include_str!("graphlang.grammar");

static GRAPHLANG: LazyLock<Result<Arc<MetaSyntaxRoot>, String>> = LazyLock::new(|| {
    MetaParser::new()
        .compile(GRAPHLANG_GRAMMAR)
        .map(Arc::new)
        .map_err(|e| e.to_string())
});

/// Shared compiled GraphLang grammar
pub fn graphlang() -> GraphResult<Arc<MetaSyntaxRoot>> {
    GRAPHLANG
        .as_ref()
        .map(Arc::clone)
        .map_err(|e| GraphError::Internal(format!("built-in grammar failed to compile: {}", e)))
}

/// Compile a grammar override from disk
pub fn load_grammar(path: &Path) -> GraphResult<Arc<MetaSyntaxRoot>> {
    let source = std::fs::read_to_string(path)?;
    let root = MetaParser::new().compile(&source)?;
    info!("Loaded grammar from {} ({})", path.display(), root);
    Ok(Arc::new(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::syntax::SyntaxParser;

    #[test]
    fn test_builtin_grammar_compiles() {
        let root = graphlang().unwrap();
        assert_eq!(root.root_name(), "batch");
        let delimiters = root.delimiters();
        for d in [",", "=", ";", "->", "<->", "(", ")", "[", "]", "{", "}"] {
            assert!(delimiters.contains(&d.to_string()), "missing {}", d);
        }
        assert!(root.keywords().contains("select"));
    }

    #[test]
    fn test_select_pairs() {
        let parser = SyntaxParser::new(graphlang().unwrap());
        let pairs = parser.parse("select (key=key1;tags=t1) a1 -> [edgeType=et] a2;").unwrap();
        let names: Vec<(&str, &str)> = pairs.iter().map(|p| (p.name.as_str(), p.value())).collect();
        assert_eq!(
            names,
            vec![
                ("select-stmt", "select"),
                ("node-search", "("),
                ("search-tag", "key"),
                ("search-tag", "="),
                ("tag-value", "key1"),
                ("search-list", ";"),
                ("search-tag", "tags"),
                ("search-tag", "="),
                ("tag-value", "t1"),
                ("node-search", ")"),
                ("alias", "a1"),
                ("join", "->"),
                ("edge-search", "["),
                ("search-tag", "edgeType"),
                ("search-tag", "="),
                ("tag-value", "et"),
                ("edge-search", "]"),
                ("alias", "a2"),
                ("select-stmt", ";"),
            ]
        );
    }

    #[test]
    fn test_keyword_is_not_an_alias() {
        let parser = SyntaxParser::new(graphlang().unwrap());
        let pairs = parser.parse("update (key=key1) set tags=t2;").unwrap();
        assert!(pairs.iter().all(|p| p.name != "alias"));
        assert!(pairs.iter().any(|p| p.name == "update-stmt" && p.value() == "set"));
    }

    #[test]
    fn test_missing_bracket_reports_position() {
        let parser = SyntaxParser::new(graphlang().unwrap());
        match parser.parse("delete (key=key1;").unwrap_err() {
            GraphError::Parse { index, .. } => assert_eq!(index, 6),
            other => panic!("unexpected {:?}", other),
        }
    }
}
