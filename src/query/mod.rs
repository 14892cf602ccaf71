//! GraphLang query processing
//!
//! text → `tokenizer` → `syntax` (driven by the `meta` grammar) → `builder`
//! → `validate` → `executor`.

pub mod ast;
pub mod builder;
pub mod cursor;
pub mod executor;
pub mod grammar;
pub mod meta;
pub mod parser;
pub mod syntax;
pub mod tokenizer;
pub mod validate;

pub use ast::{GraphInstruction, JoinKind, NodeData, SelectStep};
pub use builder::InstructionBuilder;
pub use executor::{AliasResult, GraphEngine, GraphLinkData, QueryBatchResult, QueryResult};
pub use grammar::{graphlang, GRAPHLANG_GRAMMAR};
pub use meta::{MetaParser, MetaSyntaxRoot};
pub use parser::{parse_graphlang, GraphLangParser};
pub use syntax::{SyntaxPair, SyntaxParser};
pub use tokenizer::{StringTokenizer, Token, TokenKind};
