//! Compiled meta-grammar tree
//!
//! A `MetaSyntaxRoot` owns every terminal and named production rule by
//! value. It is immutable after compilation and shared behind an `Arc`.

use indexmap::IndexMap;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    /// Exact literal text
    Token,
    /// Anchored regular expression over a bare token
    Regex,
    /// Quoted string block
    String,
}

#[derive(Debug, Clone)]
pub struct TerminalSymbol {
    pub name: String,
    /// Literal text for `Token`, the pattern for `Regex`, empty for `String`
    pub text: String,
    pub kind: TerminalKind,
    pub(crate) pattern: Option<Regex>,
}

impl TerminalSymbol {
    pub fn token(name: impl Into<String>, text: impl Into<String>) -> Self {
        TerminalSymbol {
            name: name.into(),
            text: text.into(),
            kind: TerminalKind::Token,
            pattern: None,
        }
    }

    pub fn regex(name: impl Into<String>, pattern: Regex, source: impl Into<String>) -> Self {
        TerminalSymbol {
            name: name.into(),
            text: source.into(),
            kind: TerminalKind::Regex,
            pattern: Some(pattern),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        TerminalSymbol {
            name: name.into(),
            text: String::new(),
            kind: TerminalKind::String,
            pattern: None,
        }
    }

    pub fn is_match(&self, value: &str) -> bool {
        match (&self.kind, &self.pattern) {
            (TerminalKind::Regex, Some(pattern)) => pattern.is_match(value),
            (TerminalKind::Token, _) => literal_eq(&self.text, value),
            _ => false,
        }
    }
}

/// Anonymous literal written inline in a production, e.g. `"("`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualTerminalSymbol {
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleType {
    Root,
    Group,
    Optional,
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationType {
    Sequence,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionRuleReference {
    pub name: String,
}

#[derive(Debug, Clone)]
pub enum MetaSyntax {
    Terminal(String),
    Virtual(VirtualTerminalSymbol),
    Rule(ProductionRule),
    Reference(ProductionRuleReference),
}

#[derive(Debug, Clone)]
pub struct ProductionRule {
    /// `None` for bracket groups nested inside a named rule
    pub name: Option<String>,
    pub rule_type: RuleType,
    pub evaluation: EvaluationType,
    pub children: Vec<MetaSyntax>,
}

impl ProductionRule {
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a MetaSyntax)) {
        for child in &self.children {
            visit(child);
            if let MetaSyntax::Rule(rule) = child {
                rule.walk(visit);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetaSyntaxRoot {
    pub(crate) terminals: IndexMap<String, TerminalSymbol>,
    pub(crate) rules: IndexMap<String, ProductionRule>,
    pub(crate) root: String,
}

impl MetaSyntaxRoot {
    pub fn root(&self) -> Option<&ProductionRule> {
        self.rules.get(&self.root)
    }

    pub fn root_name(&self) -> &str {
        &self.root
    }

    pub fn rule(&self, name: &str) -> Option<&ProductionRule> {
        self.rules.get(name)
    }

    pub fn terminal(&self, name: &str) -> Option<&TerminalSymbol> {
        self.terminals.get(name)
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn terminals(&self) -> impl Iterator<Item = &TerminalSymbol> {
        self.terminals.values()
    }

    fn literals(&self) -> BTreeSet<String> {
        let mut literals: BTreeSet<String> = self
            .terminals
            .values()
            .filter(|t| t.kind == TerminalKind::Token)
            .map(|t| t.text.clone())
            .collect();

        for rule in self.rules.values() {
            rule.walk(&mut |child| {
                if let MetaSyntax::Virtual(v) = child {
                    literals.insert(v.text.clone());
                }
            });
        }
        literals
    }

    /// Non-alphanumeric literals; these drive query tokenization
    pub fn delimiters(&self) -> Vec<String> {
        self.literals().into_iter().filter(|l| !is_word(l)).collect()
    }

    /// Alphanumeric literals, lowercased; regex and string terminals never match them
    pub fn keywords(&self) -> BTreeSet<String> {
        self.literals()
            .into_iter()
            .filter(|l| is_word(l))
            .map(|l| l.to_lowercase())
            .collect()
    }
}

impl fmt::Display for MetaSyntaxRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MetaSyntaxRoot(root={}, {} terminals, {} rules)",
            self.root,
            self.terminals.len(),
            self.rules.len()
        )
    }
}

pub(crate) fn is_word(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_alphanumeric())
}

/// Word literals compare case-insensitively, punctuation exactly
pub(crate) fn literal_eq(literal: &str, value: &str) -> bool {
    if is_word(literal) {
        literal.eq_ignore_ascii_case(value)
    } else {
        literal == value
    }
}
