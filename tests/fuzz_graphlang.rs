use graphlang::graph::wildcard_match;
use graphlang::query::tokenizer::StringTokenizer;
use graphlang::{parse_graphlang, GraphMap, GraphNode, NodeSearch};
use proptest::prelude::*;
use std::collections::BTreeSet;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn does_not_crash_on_random_statement_text(s in "\\PC*") {
        let _ = parse_graphlang(&s);
    }

    #[test]
    fn does_not_crash_on_statement_shaped_text(
        s in "(add|upsert|update|delete|select|node|edge|set|return|key|=|,|;|\\(|\\)|\\[|\\]|\\{|\\}|->|<->|'x'| )*"
    ) {
        let _ = parse_graphlang(&s);
    }

    #[test]
    fn tokenizer_offsets_are_ordered(s in "\\PC*") {
        let tokenizer = StringTokenizer::new().use_delimiters([",", "=", ";", "->", "<->"]);
        if let Ok(tokens) = tokenizer.parse(&s) {
            prop_assert!(tokens.windows(2).all(|pair| pair[0].offset < pair[1].offset));
        }
    }

    #[test]
    fn trailing_star_is_case_insensitive_prefix(prefix in "[a-zA-Z0-9]{0,6}", rest in "[a-zA-Z0-9]{0,6}") {
        let value = format!("{}{}", prefix, rest);
        let pattern = format!("{}*", prefix.to_uppercase());
        prop_assert!(wildcard_match(&pattern, &value));
        prop_assert!(wildcard_match(&value.to_lowercase(), &value.to_uppercase()));
    }

    #[test]
    fn prefix_search_matches_rescan(keys in prop::collection::btree_set("[a-c]{1,4}", 1..30), prefix in "[a-c]{1,2}") {
        let map = GraphMap::new();
        for key in &keys {
            map.add_node(GraphNode::new(key.as_str()), false, None).unwrap();
        }

        let found: BTreeSet<String> = map
            .query_nodes(&NodeSearch::new().key(format!("{}*", prefix)))
            .into_iter()
            .map(|n| n.key)
            .collect();
        let expected: BTreeSet<String> = keys.iter().filter(|k| k.starts_with(&prefix)).cloned().collect();
        prop_assert_eq!(found, expected);
    }
}
