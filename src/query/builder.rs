//! Instruction builder (InterLang)
//!
//! Turns the syntax pairs of a parsed batch into `GraphInstruction`s. Each
//! statement is offered to an ordered list of recognizers; a recognizer
//! either consumes the whole statement or reports `None` and the cursor is
//! rewound for the next one.

use crate::error::{GraphError, GraphResult};
use crate::graph::{EdgeDirection, EdgeSearch, NodeSearch, Tags};
use crate::query::ast::{GraphInstruction, JoinKind, NodeData, SelectStep};
use crate::query::cursor::Cursor;
use crate::query::syntax::SyntaxPair;
use std::collections::HashMap;

type PairCursor<'a> = Cursor<'a, SyntaxPair>;
type Recognizer<T> = fn(&mut PairCursor<'_>) -> GraphResult<Option<T>>;

const STATEMENT_RECOGNIZERS: [Recognizer<GraphInstruction>; 5] = [node_add, edge_add, update, delete, select];

const STEP_RECOGNIZERS: [Recognizer<SelectStep>; 5] = [node_step, edge_step, full_join, left_join, return_names];

/// Field names with a fixed meaning; everything else is a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Field {
    Key,
    From,
    To,
    Type,
    NodeKey,
    Tags,
    Alias,
}

impl Field {
    fn reserved(name: &str) -> Option<Field> {
        match name.to_lowercase().as_str() {
            "key" => Some(Field::Key),
            "from" | "fromkey" => Some(Field::From),
            "to" | "tokey" => Some(Field::To),
            "type" | "edgetype" => Some(Field::Type),
            "nodekey" => Some(Field::NodeKey),
            "tags" => Some(Field::Tags),
            "alias" => Some(Field::Alias),
            _ => None,
        }
    }
}

/// Fields and tags gathered from one field list
#[derive(Debug, Default)]
struct Term {
    fields: HashMap<Field, (String, String, usize)>,
    tags: Tags,
}

impl Term {
    fn add(&mut self, name: &SyntaxPair, value: Option<&SyntaxPair>) -> GraphResult<()> {
        let Some(field) = Field::reserved(name.value()) else {
            self.tags.set(name.value(), value.map(|v| v.value().to_string()));
            return Ok(());
        };

        let value = value.ok_or_else(|| {
            GraphError::parse(name.index, format!("field '{}' requires a value", name.value()))
        })?;
        if self.fields.contains_key(&field) {
            return Err(GraphError::parse(name.index, format!("duplicate field '{}'", name.value())));
        }
        if field == Field::Tags {
            self.tags = self.tags.merge(&Tags::parse(value.value()));
        }
        self.fields
            .insert(field, (name.value().to_string(), value.value().to_string(), name.index));
        Ok(())
    }

    fn take(&mut self, field: Field) -> Option<String> {
        self.fields.remove(&field).map(|(_, value, _)| value)
    }

    /// Reject reserved fields that mean nothing in this position
    fn allow(&self, allowed: &[Field], context: &str) -> GraphResult<()> {
        let mut invalid: Vec<&(String, String, usize)> = self
            .fields
            .iter()
            .filter(|(field, _)| !allowed.contains(*field))
            .map(|(_, entry)| entry)
            .collect();
        invalid.sort_by_key(|(_, _, index)| *index);

        match invalid.first() {
            Some((name, _, index)) => Err(GraphError::parse(
                *index,
                format!("field '{}' is not valid in {}", name, context),
            )),
            None => Ok(()),
        }
    }
}

pub struct InstructionBuilder;

impl InstructionBuilder {
    /// Build one instruction per statement
    pub fn build(pairs: &[SyntaxPair]) -> GraphResult<Vec<GraphInstruction>> {
        let mut cursor = Cursor::new(pairs);
        let mut instructions = Vec::new();

        while let Some(first) = cursor.peek() {
            match first_match(&mut cursor, &STATEMENT_RECOGNIZERS)? {
                Some(instruction) => instructions.push(instruction),
                None => {
                    return Err(GraphError::parse(
                        first.index,
                        format!("unrecognized statement starting at '{}'", first.token),
                    ))
                }
            }
        }
        Ok(instructions)
    }
}

/// Run a recognizer; the cursor is rewound when it does not match
fn recognize<T>(cursor: &mut PairCursor<'_>, recognizer: Recognizer<T>) -> GraphResult<Option<T>> {
    let checkpoint = cursor.save();
    let result = recognizer(cursor)?;
    if result.is_none() {
        cursor.restore(checkpoint);
    }
    Ok(result)
}

fn first_match<T>(cursor: &mut PairCursor<'_>, recognizers: &[Recognizer<T>]) -> GraphResult<Option<T>> {
    for recognizer in recognizers {
        if let Some(found) = recognize(cursor, *recognizer)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

fn next_is<'a>(cursor: &mut PairCursor<'a>, rule: &str, terminal: &str) -> Option<&'a SyntaxPair> {
    cursor.next_if(|p| p.is(rule) && p.is_terminal(terminal))
}

/// `name` or `name=value` produced by `rule`
fn read_field<'a>(cursor: &mut PairCursor<'a>, rule: &str) -> Option<(&'a SyntaxPair, Option<&'a SyntaxPair>)> {
    cursor.attempt(|c| {
        let name = next_is(c, rule, "symbol")?;
        if next_is(c, rule, "equal").is_none() {
            return Some((name, None));
        }
        let value = c.next_if(|p| p.is("tag-value"))?;
        Some((name, Some(value)))
    })
}

/// Fields from `rule` separated by `(separator_rule, separator)`
fn read_term(cursor: &mut PairCursor<'_>, rule: &str, separator_rule: &str, separator: &str) -> GraphResult<Term> {
    let mut term = Term::default();
    while let Some((name, value)) = read_field(cursor, rule) {
        term.add(name, value)?;
        if next_is(cursor, separator_rule, separator).is_none() {
            break;
        }
    }
    Ok(term)
}

/// `name { 'payload' }`
fn read_data_block(cursor: &mut PairCursor<'_>) -> Option<NodeData> {
    cursor.attempt(|c| {
        let name = next_is(c, "data-block", "symbol")?;
        next_is(c, "data-block", "{")?;
        let payload = next_is(c, "data-block", "quoted")?;
        next_is(c, "data-block", "}")?;
        Some(NodeData {
            name: name.value().to_string(),
            payload: payload.value().to_string(),
        })
    })
}

fn read_steps(cursor: &mut PairCursor<'_>) -> GraphResult<Vec<SelectStep>> {
    let mut steps = Vec::new();
    while let Some(step) = first_match(cursor, &STEP_RECOGNIZERS)? {
        steps.push(step);
    }
    Ok(steps)
}

fn merge_alias(term: &mut Term, trailing: Option<&SyntaxPair>) -> GraphResult<Option<String>> {
    let in_term = term.fields.contains_key(&Field::Alias);
    match trailing {
        Some(pair) if in_term => Err(GraphError::parse(pair.index, format!("duplicate alias '{}'", pair.value()))),
        Some(pair) => Ok(Some(pair.value().to_string())),
        None => Ok(term.take(Field::Alias)),
    }
}

// Select steps

fn node_step(cursor: &mut PairCursor<'_>) -> GraphResult<Option<SelectStep>> {
    if next_is(cursor, "node-search", "(").is_none() {
        return Ok(None);
    }
    let mut term = read_term(cursor, "search-tag", "search-list", "term")?;
    if next_is(cursor, "node-search", ")").is_none() {
        return Ok(None);
    }
    let trailing = cursor.next_if(|p| p.is("alias"));

    term.allow(&[Field::Key, Field::Tags, Field::Alias], "a node search")?;
    let alias = merge_alias(&mut term, trailing)?;
    Ok(Some(SelectStep::Node(NodeSearch {
        key: term.take(Field::Key),
        tags: term.tags,
        alias,
    })))
}

fn edge_step(cursor: &mut PairCursor<'_>) -> GraphResult<Option<SelectStep>> {
    if next_is(cursor, "edge-search", "[").is_none() {
        return Ok(None);
    }
    let mut term = read_term(cursor, "search-tag", "search-list", "term")?;
    if next_is(cursor, "edge-search", "]").is_none() {
        return Ok(None);
    }
    let trailing = cursor.next_if(|p| p.is("alias"));

    term.allow(
        &[Field::From, Field::To, Field::NodeKey, Field::Type, Field::Tags, Field::Alias],
        "an edge search",
    )?;
    let alias = merge_alias(&mut term, trailing)?;
    Ok(Some(SelectStep::Edge(EdgeSearch {
        from_key: term.take(Field::From),
        to_key: term.take(Field::To),
        node_key: term.take(Field::NodeKey),
        edge_type: term.take(Field::Type),
        tags: term.tags,
        direction: EdgeDirection::Both,
        alias,
    })))
}

fn full_join(cursor: &mut PairCursor<'_>) -> GraphResult<Option<SelectStep>> {
    Ok(next_is(cursor, "join", "full-join").map(|_| SelectStep::Join(JoinKind::Full)))
}

fn left_join(cursor: &mut PairCursor<'_>) -> GraphResult<Option<SelectStep>> {
    Ok(next_is(cursor, "join", "left-join").map(|_| SelectStep::Join(JoinKind::Left)))
}

fn return_names(cursor: &mut PairCursor<'_>) -> GraphResult<Option<SelectStep>> {
    if next_is(cursor, "return-names", "return").is_none() {
        return Ok(None);
    }
    let mut names = Vec::new();
    while let Some(pair) = cursor.next_if(|p| p.is("return-names")) {
        if pair.is_terminal("symbol") {
            names.push(pair.value().to_string());
        }
    }
    if names.is_empty() {
        return Ok(None);
    }
    Ok(Some(SelectStep::ReturnNames(names)))
}

// Statements

fn add_verb(cursor: &mut PairCursor<'_>, rule: &str, noun: &str) -> Option<bool> {
    let verb = cursor.next_if(|p| p.is(rule) && (p.is_terminal("add") || p.is_terminal("upsert")))?;
    next_is(cursor, rule, noun)?;
    Some(verb.is_terminal("upsert"))
}

fn node_add(cursor: &mut PairCursor<'_>) -> GraphResult<Option<GraphInstruction>> {
    const RULE: &str = "add-node";
    let start = cursor.peek().map(|p| p.index).unwrap_or_default();
    let Some(upsert) = add_verb(cursor, RULE, "node") else {
        return Ok(None);
    };

    let mut term = Term::default();
    let mut data = Vec::new();
    loop {
        if let Some(block) = read_data_block(cursor) {
            data.push(block);
        } else if let Some((name, value)) = read_field(cursor, "tag") {
            term.add(name, value)?;
        } else {
            return Ok(None);
        }
        if next_is(cursor, RULE, "comma").is_none() {
            break;
        }
    }
    if next_is(cursor, RULE, "term").is_none() {
        return Ok(None);
    }

    term.allow(&[Field::Key, Field::Tags], "a node add")?;
    let key = term
        .take(Field::Key)
        .ok_or_else(|| GraphError::parse(start, "node add requires key=..."))?;
    Ok(Some(GraphInstruction::NodeAdd {
        key,
        tags: term.tags,
        data,
        upsert,
    }))
}

fn edge_add(cursor: &mut PairCursor<'_>) -> GraphResult<Option<GraphInstruction>> {
    const RULE: &str = "add-edge";
    let start = cursor.peek().map(|p| p.index).unwrap_or_default();
    let Some(upsert) = add_verb(cursor, RULE, "edge") else {
        return Ok(None);
    };

    let mut term = read_term(cursor, "tag", "tag-list", "comma")?;
    if next_is(cursor, RULE, "term").is_none() {
        return Ok(None);
    }

    term.allow(&[Field::From, Field::To, Field::Type, Field::Tags], "an edge add")?;
    let from_key = term
        .take(Field::From)
        .ok_or_else(|| GraphError::parse(start, "edge add requires fromKey=..."))?;
    let to_key = term
        .take(Field::To)
        .ok_or_else(|| GraphError::parse(start, "edge add requires toKey=..."))?;
    Ok(Some(GraphInstruction::EdgeAdd {
        from_key,
        to_key,
        edge_type: term.take(Field::Type),
        tags: term.tags,
        upsert,
    }))
}

/// The last search step decides whether a statement targets nodes or edges
fn targets_edges(steps: &[SelectStep], start: usize) -> GraphResult<bool> {
    match steps.iter().rev().find(|s| s.is_search()) {
        Some(SelectStep::Edge(_)) => Ok(true),
        Some(_) => Ok(false),
        None => Err(GraphError::parse(start, "statement has no node or edge search")),
    }
}

fn update(cursor: &mut PairCursor<'_>) -> GraphResult<Option<GraphInstruction>> {
    const RULE: &str = "update-stmt";
    let Some(verb) = next_is(cursor, RULE, "update") else {
        return Ok(None);
    };
    let search = read_steps(cursor)?;
    if next_is(cursor, RULE, "set").is_none() {
        return Ok(None);
    }
    let mut term = read_term(cursor, "tag", "tag-list", "comma")?;
    if next_is(cursor, RULE, "term").is_none() {
        return Ok(None);
    }

    if targets_edges(&search, verb.index)? {
        term.allow(&[Field::From, Field::To, Field::Type, Field::Tags], "an edge update")?;
        Ok(Some(GraphInstruction::EdgeUpdate {
            search,
            from_key: term.take(Field::From),
            to_key: term.take(Field::To),
            edge_type: term.take(Field::Type),
            tags: term.tags,
        }))
    } else {
        term.allow(&[Field::Tags], "a node update")?;
        Ok(Some(GraphInstruction::NodeUpdate { search, tags: term.tags }))
    }
}

fn delete(cursor: &mut PairCursor<'_>) -> GraphResult<Option<GraphInstruction>> {
    const RULE: &str = "delete-stmt";
    let Some(verb) = next_is(cursor, RULE, "delete") else {
        return Ok(None);
    };
    let search = read_steps(cursor)?;
    if next_is(cursor, RULE, "term").is_none() {
        return Ok(None);
    }

    if targets_edges(&search, verb.index)? {
        Ok(Some(GraphInstruction::EdgeDelete { search }))
    } else {
        Ok(Some(GraphInstruction::NodeDelete { search }))
    }
}

fn select(cursor: &mut PairCursor<'_>) -> GraphResult<Option<GraphInstruction>> {
    const RULE: &str = "select-stmt";
    if next_is(cursor, RULE, "select").is_none() {
        return Ok(None);
    }
    let steps = read_steps(cursor)?;
    if steps.is_empty() || next_is(cursor, RULE, "term").is_none() {
        return Ok(None);
    }
    Ok(Some(GraphInstruction::Select { steps }))
}
