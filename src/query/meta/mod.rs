//! Meta-grammar: the language used to describe GraphLang itself

pub mod ast;
pub mod compiler;

pub use ast::{
    EvaluationType, MetaSyntax, MetaSyntaxRoot, ProductionRule, ProductionRuleReference, RuleType, TerminalKind,
    TerminalSymbol, VirtualTerminalSymbol,
};
pub use compiler::MetaParser;

pub(crate) use ast::literal_eq;
