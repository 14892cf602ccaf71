//! Meta-grammar compiler
//!
//! Grammar source is a list of `;`-terminated declarations:
//!
//! ```text
//! comma  = ",";                    // literal terminal
//! symbol = regex "[a-z]+";         // regex terminal
//! quoted = string;                 // quoted-string terminal
//! pair   = symbol, "=", (symbol | quoted);
//! list   = pair, {comma, pair};
//! ```
//!
//! `,` sequences, `|` alternates (binding looser than `,`), and `( )`,
//! `[ ]`, `{ }` open group, optional and repeat sub-rules. The last
//! production declared is the root.

use super::ast::*;
use crate::error::{GraphError, GraphResult};
use crate::query::cursor::Cursor;
use crate::query::tokenizer::{StringTokenizer, Token, TokenKind};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

const STRUCTURAL: [&str; 10] = ["=", ",", ";", "|", "(", ")", "[", "]", "{", "}"];

enum Declaration {
    Terminal(TerminalSymbol),
    Rule(ProductionRule),
}

pub struct MetaParser {
    tokenizer: StringTokenizer,
}

impl Default for MetaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaParser {
    pub fn new() -> Self {
        MetaParser {
            tokenizer: StringTokenizer::new().use_delimiters(STRUCTURAL).use_line_comment("//"),
        }
    }

    pub fn compile(&self, source: &str) -> GraphResult<MetaSyntaxRoot> {
        let tokens = self.tokenizer.parse(source)?;
        let mut cursor = Cursor::new(&tokens);

        let mut terminals: IndexMap<String, TerminalSymbol> = IndexMap::new();
        let mut rules: IndexMap<String, ProductionRule> = IndexMap::new();
        let mut root = None;

        while !cursor.is_end() {
            let index = cursor.index();
            let (name, declaration) = parse_declaration(&mut cursor)?;
            if terminals.contains_key(&name) || rules.contains_key(&name) {
                return Err(GraphError::parse(index, format!("'{}' is already declared", name)));
            }
            match declaration {
                Declaration::Terminal(terminal) => {
                    terminals.insert(name, terminal);
                }
                Declaration::Rule(rule) => {
                    root = Some(name.clone());
                    rules.insert(name, rule);
                }
            }
        }

        let root = root.ok_or_else(|| GraphError::parse(tokens.len(), "grammar declares no production rules"))?;

        for rule in rules.values_mut() {
            resolve(rule, &terminals)?;
        }
        for (name, rule) in &rules {
            check_references(name, rule, &rules)?;
        }
        check_left_recursion(&rules)?;

        debug!("Compiled grammar: {} terminals, {} rules, root '{}'", terminals.len(), rules.len(), root);
        Ok(MetaSyntaxRoot { terminals, rules, root })
    }
}

fn is_delimiter(token: &Token, text: &str) -> bool {
    token.is_delimiter(text)
}

fn expect(cursor: &mut Cursor<'_, Token>, text: &str) -> GraphResult<()> {
    let index = cursor.index();
    match cursor.next() {
        Some(t) if is_delimiter(t, text) => Ok(()),
        Some(t) => Err(GraphError::parse(index, format!("expected '{}', found '{}'", text, t))),
        None => Err(GraphError::parse(index, format!("expected '{}', found end of input", text))),
    }
}

fn parse_declaration(cursor: &mut Cursor<'_, Token>) -> GraphResult<(String, Declaration)> {
    let index = cursor.index();
    let name = match cursor.next() {
        Some(t) if t.kind == TokenKind::Token => t.value.clone(),
        Some(t) => return Err(GraphError::parse(index, format!("expected declaration name, found '{}'", t))),
        None => return Err(GraphError::parse(index, "expected declaration name")),
    };
    expect(cursor, "=")?;

    if let Some(terminal) = cursor.attempt(|c| try_terminal(c, &name)) {
        return Ok((name, Declaration::Terminal(terminal?)));
    }

    let (evaluation, children) = parse_alternatives(cursor)?;
    expect(cursor, ";")?;
    Ok((
        name.clone(),
        Declaration::Rule(ProductionRule {
            name: Some(name),
            rule_type: RuleType::Root,
            evaluation,
            children,
        }),
    ))
}

/// Terminal declarations: `"lit";`, `regex "pattern";` or `string;`
fn try_terminal(cursor: &mut Cursor<'_, Token>, name: &str) -> Option<GraphResult<TerminalSymbol>> {
    let index = cursor.index();
    let first = cursor.next()?;

    let terminal = match first.kind {
        TokenKind::Block => Ok(TerminalSymbol::token(name, first.value.clone())),
        TokenKind::Token if first.value == "string" => Ok(TerminalSymbol::string(name)),
        TokenKind::Token if first.value == "regex" => {
            let pattern = cursor.next_if(|t| t.kind == TokenKind::Block)?;
            Regex::new(&format!("^(?:{})$", pattern.value))
                .map(|re| TerminalSymbol::regex(name, re, pattern.value.clone()))
                .map_err(|e| GraphError::parse(index + 1, format!("invalid regex for '{}': {}", name, e)))
        }
        _ => return None,
    };

    cursor.next_if(|t| t.is_delimiter(";"))?;
    Some(terminal)
}

/// `seq | seq | ...`
fn parse_alternatives(cursor: &mut Cursor<'_, Token>) -> GraphResult<(EvaluationType, Vec<MetaSyntax>)> {
    let mut branches = vec![parse_sequence(cursor)?];
    while cursor.next_if(|t| t.is_delimiter("|")).is_some() {
        branches.push(parse_sequence(cursor)?);
    }

    if branches.len() == 1 {
        return Ok((EvaluationType::Sequence, branches.remove(0)));
    }

    let children = branches
        .into_iter()
        .map(|mut branch| {
            if branch.len() == 1 {
                branch.remove(0)
            } else {
                MetaSyntax::Rule(ProductionRule {
                    name: None,
                    rule_type: RuleType::Group,
                    evaluation: EvaluationType::Sequence,
                    children: branch,
                })
            }
        })
        .collect();
    Ok((EvaluationType::Or, children))
}

/// `item , item , ...`
fn parse_sequence(cursor: &mut Cursor<'_, Token>) -> GraphResult<Vec<MetaSyntax>> {
    let mut items = vec![parse_item(cursor)?];
    while cursor.next_if(|t| t.is_delimiter(",")).is_some() {
        items.push(parse_item(cursor)?);
    }
    Ok(items)
}

fn parse_item(cursor: &mut Cursor<'_, Token>) -> GraphResult<MetaSyntax> {
    let index = cursor.index();
    let token = cursor
        .next()
        .ok_or_else(|| GraphError::parse(index, "expected symbol, found end of input"))?;

    match token.kind {
        TokenKind::Token => Ok(MetaSyntax::Reference(ProductionRuleReference {
            name: token.value.clone(),
        })),
        TokenKind::Block => Ok(MetaSyntax::Virtual(VirtualTerminalSymbol {
            text: token.value.clone(),
        })),
        TokenKind::Delimiter => {
            let (rule_type, close) = match token.value.as_str() {
                "(" => (RuleType::Group, ")"),
                "[" => (RuleType::Optional, "]"),
                "{" => (RuleType::Repeat, "}"),
                other => return Err(GraphError::parse(index, format!("expected symbol, found '{}'", other))),
            };
            let (evaluation, children) = parse_alternatives(cursor)?;
            match cursor.next() {
                Some(t) if t.is_delimiter(close) => {}
                _ => {
                    return Err(GraphError::parse(
                        index,
                        format!("group '{}' is not closed by '{}'", token.value, close),
                    ))
                }
            }
            Ok(MetaSyntax::Rule(ProductionRule {
                name: None,
                rule_type,
                evaluation,
                children,
            }))
        }
    }
}

/// Turn references that name terminals into terminal nodes
fn resolve(rule: &mut ProductionRule, terminals: &IndexMap<String, TerminalSymbol>) -> GraphResult<()> {
    for child in rule.children.iter_mut() {
        match child {
            MetaSyntax::Reference(reference) if terminals.contains_key(&reference.name) => {
                *child = MetaSyntax::Terminal(reference.name.clone());
            }
            MetaSyntax::Rule(inner) => resolve(inner, terminals)?,
            _ => {}
        }
    }
    Ok(())
}

fn check_references(owner: &str, rule: &ProductionRule, rules: &IndexMap<String, ProductionRule>) -> GraphResult<()> {
    let mut missing = None;
    rule.walk(&mut |child| {
        if let MetaSyntax::Reference(reference) = child {
            if missing.is_none() && !rules.contains_key(&reference.name) {
                missing = Some(reference.name.clone());
            }
        }
    });
    match missing {
        Some(name) => Err(GraphError::bad_request(format!(
            "rule '{}' references undeclared symbol '{}'",
            owner, name
        ))),
        None => Ok(()),
    }
}

/// Rules that can match without consuming a token, solved to a fixed point
fn nullable_rules(rules: &IndexMap<String, ProductionRule>) -> HashSet<String> {
    let mut nullable = HashSet::new();
    loop {
        let before = nullable.len();
        for (name, rule) in rules {
            if !nullable.contains(name) && is_nullable(rule, &nullable) {
                nullable.insert(name.clone());
            }
        }
        if nullable.len() == before {
            return nullable;
        }
    }
}

fn is_nullable(rule: &ProductionRule, nullable: &HashSet<String>) -> bool {
    if matches!(rule.rule_type, RuleType::Optional | RuleType::Repeat) {
        return true;
    }
    let child_nullable = |child: &MetaSyntax| match child {
        MetaSyntax::Terminal(_) | MetaSyntax::Virtual(_) => false,
        MetaSyntax::Reference(reference) => nullable.contains(&reference.name),
        MetaSyntax::Rule(inner) => is_nullable(inner, nullable),
    };
    match rule.evaluation {
        EvaluationType::Sequence => rule.children.iter().all(child_nullable),
        EvaluationType::Or => rule.children.iter().any(child_nullable),
    }
}

/// Named rules reachable from `rule` before any token is consumed
fn leftmost_references<'a>(rule: &'a ProductionRule, nullable: &HashSet<String>, out: &mut Vec<&'a str>) {
    for child in &rule.children {
        let consumes = match child {
            MetaSyntax::Terminal(_) | MetaSyntax::Virtual(_) => true,
            MetaSyntax::Reference(reference) => {
                out.push(&reference.name);
                !nullable.contains(&reference.name)
            }
            MetaSyntax::Rule(inner) => {
                leftmost_references(inner, nullable, out);
                !is_nullable(inner, nullable)
            }
        };
        if rule.evaluation == EvaluationType::Sequence && consumes {
            break;
        }
    }
}

/// The walker expands rules recursively, so a rule that can reach itself
/// without consuming a token would never terminate
fn check_left_recursion(rules: &IndexMap<String, ProductionRule>) -> GraphResult<()> {
    let nullable = nullable_rules(rules);
    let edges: HashMap<&str, Vec<&str>> = rules
        .iter()
        .map(|(name, rule)| {
            let mut out = Vec::new();
            leftmost_references(rule, &nullable, &mut out);
            (name.as_str(), out)
        })
        .collect();

    for name in rules.keys() {
        let mut visited = HashSet::new();
        let mut stack: Vec<&str> = edges.get(name.as_str()).cloned().unwrap_or_default();
        while let Some(next) = stack.pop() {
            if next == name {
                return Err(GraphError::bad_request(format!("rule '{}' is left-recursive", name)));
            }
            if visited.insert(next) {
                if let Some(targets) = edges.get(next) {
                    stack.extend(targets.iter().copied());
                }
            }
        }
    }
    Ok(())
}
