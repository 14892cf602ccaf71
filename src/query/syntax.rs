//! Grammar-driven parser
//!
//! Walks a compiled `MetaSyntaxRoot` over a token stream and emits one
//! `SyntaxPair` per consumed token. Alternatives are ordered and repeats are
//! greedy; a failed branch truncates the pairs it produced and rewinds the
//! cursor.

use crate::error::{GraphError, GraphResult};
use crate::query::cursor::Cursor;
use crate::query::meta::{
    literal_eq, EvaluationType, MetaSyntax, MetaSyntaxRoot, ProductionRule, RuleType, TerminalKind,
};
use crate::query::tokenizer::{StringTokenizer, Token, TokenKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A consumed token tagged with the grammar position that accepted it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxPair {
    /// Innermost named production rule
    pub name: String,
    /// Terminal name, or the literal text for inline literals
    pub terminal: String,
    pub token: Token,
    /// Position in the token stream
    pub index: usize,
}

impl SyntaxPair {
    pub fn value(&self) -> &str {
        &self.token.value
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn is_terminal(&self, terminal: &str) -> bool {
        self.terminal == terminal
    }

    pub fn is_literal(&self, text: &str) -> bool {
        self.token.kind != TokenKind::Block && literal_eq(text, &self.token.value)
    }
}

impl fmt::Display for SyntaxPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}={}", self.name, self.terminal, self.token)
    }
}

pub struct SyntaxParser {
    root: Arc<MetaSyntaxRoot>,
    tokenizer: StringTokenizer,
    keywords: BTreeSet<String>,
}

impl SyntaxParser {
    pub fn new(root: Arc<MetaSyntaxRoot>) -> Self {
        let tokenizer = StringTokenizer::new().use_delimiters(root.delimiters());
        let keywords = root.keywords();
        SyntaxParser {
            root,
            tokenizer,
            keywords,
        }
    }

    pub fn root(&self) -> &Arc<MetaSyntaxRoot> {
        &self.root
    }

    pub fn tokenize(&self, text: &str) -> GraphResult<Vec<Token>> {
        self.tokenizer.parse(text)
    }

    pub fn parse(&self, text: &str) -> GraphResult<Vec<SyntaxPair>> {
        let tokens = self.tokenize(text)?;
        self.parse_tokens(&tokens)
    }

    pub fn parse_tokens(&self, tokens: &[Token]) -> GraphResult<Vec<SyntaxPair>> {
        let root = self
            .root
            .root()
            .ok_or_else(|| GraphError::Internal(format!("grammar root '{}' missing", self.root.root_name())))?;

        let mut walk = Walk {
            grammar: &*self.root,
            keywords: &self.keywords,
            cursor: Cursor::new(tokens),
            pairs: Vec::new(),
            furthest: 0,
            expected: BTreeSet::new(),
        };

        let matched = walk.rule(root, self.root.root_name());
        if matched && walk.cursor.is_end() {
            return Ok(walk.pairs);
        }

        let position = walk.cursor.index();
        if walk.furthest >= position && !walk.expected.is_empty() {
            let found = tokens
                .get(walk.furthest)
                .map(|t| format!("'{}'", t))
                .unwrap_or_else(|| "end of input".to_string());
            let expected: Vec<&str> = walk.expected.iter().map(String::as_str).collect();
            return Err(GraphError::parse(
                walk.furthest,
                format!("expected {}, found {}", expected.join(" | "), found),
            ));
        }

        match tokens.get(position) {
            Some(token) => Err(GraphError::parse(position, format!("unexpected token '{}'", token))),
            None => Err(GraphError::parse(position, "unexpected end of input")),
        }
    }
}

struct Walk<'g, 't> {
    grammar: &'g MetaSyntaxRoot,
    keywords: &'g BTreeSet<String>,
    cursor: Cursor<'t, Token>,
    pairs: Vec<SyntaxPair>,
    furthest: usize,
    expected: BTreeSet<String>,
}

impl<'g, 't> Walk<'g, 't> {
    fn rule(&mut self, rule: &'g ProductionRule, context: &str) -> bool {
        match rule.rule_type {
            RuleType::Root | RuleType::Group => self.evaluate(rule, context),
            RuleType::Optional => {
                self.tentative(|walk| walk.evaluate(rule, context));
                true
            }
            RuleType::Repeat => {
                loop {
                    let start = self.cursor.index();
                    if !self.tentative(|walk| walk.evaluate(rule, context)) || self.cursor.index() == start {
                        break;
                    }
                }
                true
            }
        }
    }

    fn evaluate(&mut self, rule: &'g ProductionRule, context: &str) -> bool {
        match rule.evaluation {
            EvaluationType::Sequence => rule.children.iter().all(|child| self.node(child, context)),
            EvaluationType::Or => rule
                .children
                .iter()
                .any(|child| self.tentative(|walk| walk.node(child, context))),
        }
    }

    fn node(&mut self, node: &'g MetaSyntax, context: &str) -> bool {
        let grammar = self.grammar;
        match node {
            MetaSyntax::Terminal(name) => match grammar.terminal(name) {
                Some(terminal) => {
                    let accepted = self.cursor.peek().is_some_and(|token| match terminal.kind {
                        TerminalKind::Token => token.kind != TokenKind::Block && terminal.is_match(&token.value),
                        TerminalKind::Regex => {
                            token.kind == TokenKind::Token
                                && !self.keywords.contains(&token.value.to_lowercase())
                                && terminal.is_match(&token.value)
                        }
                        TerminalKind::String => token.kind == TokenKind::Block,
                    });
                    let label = match terminal.kind {
                        TerminalKind::Token => format!("'{}'", terminal.text),
                        _ => terminal.name.clone(),
                    };
                    self.consume(accepted, context, &terminal.name, label)
                }
                None => false,
            },
            MetaSyntax::Virtual(literal) => {
                let accepted = self
                    .cursor
                    .peek()
                    .is_some_and(|token| token.kind != TokenKind::Block && literal_eq(&literal.text, &token.value));
                self.consume(accepted, context, &literal.text, format!("'{}'", literal.text))
            }
            MetaSyntax::Rule(inner) => self.rule(inner, context),
            MetaSyntax::Reference(reference) => match grammar.rule(&reference.name) {
                Some(target) => self.rule(target, &reference.name),
                None => false,
            },
        }
    }

    fn consume(&mut self, accepted: bool, context: &str, terminal: &str, label: String) -> bool {
        let index = self.cursor.index();
        if !accepted {
            if index > self.furthest {
                self.furthest = index;
                self.expected.clear();
            }
            if index == self.furthest {
                self.expected.insert(label);
            }
            return false;
        }

        if let Some(token) = self.cursor.next() {
            self.pairs.push(SyntaxPair {
                name: context.to_string(),
                terminal: terminal.to_string(),
                token: token.clone(),
                index,
            });
        }
        true
    }

    /// Run `parse`; on failure rewind the cursor and drop the pairs it emitted
    fn tentative(&mut self, parse: impl FnOnce(&mut Self) -> bool) -> bool {
        let checkpoint = self.cursor.save();
        let pair_count = self.pairs.len();
        let matched = parse(self);
        if !matched {
            self.cursor.restore(checkpoint);
            self.pairs.truncate(pair_count);
        }
        matched
    }
}
