//! GraphLang parser: text to validated instructions
//!
//! Tokenize → grammar walk → instruction build → chain validation.

use crate::error::GraphResult;
use crate::query::ast::GraphInstruction;
use crate::query::builder::InstructionBuilder;
use crate::query::grammar::graphlang;
use crate::query::meta::MetaSyntaxRoot;
use crate::query::syntax::SyntaxParser;
use crate::query::validate::validate;
use std::sync::Arc;
use tracing::debug;

pub struct GraphLangParser {
    syntax: SyntaxParser,
}

impl GraphLangParser {
    /// Parser over the built-in grammar
    pub fn new() -> GraphResult<Self> {
        Ok(Self::with_grammar(graphlang()?))
    }

    pub fn with_grammar(grammar: Arc<MetaSyntaxRoot>) -> Self {
        GraphLangParser {
            syntax: SyntaxParser::new(grammar),
        }
    }

    pub fn syntax(&self) -> &SyntaxParser {
        &self.syntax
    }

    pub fn parse(&self, text: &str) -> GraphResult<Vec<GraphInstruction>> {
        let pairs = self.syntax.parse(text)?;
        let instructions = InstructionBuilder::build(&pairs)?;
        validate(&instructions)?;
        debug!("Parsed {} instruction(s) from {} syntax pairs", instructions.len(), pairs.len());
        Ok(instructions)
    }
}

/// Parse a GraphLang batch with the built-in grammar
pub fn parse_graphlang(text: &str) -> GraphResult<Vec<GraphInstruction>> {
    GraphLangParser::new()?.parse(text)
}
