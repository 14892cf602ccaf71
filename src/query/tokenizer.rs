//! Generic delimiter-driven tokenizer
//!
//! Shared by the meta-grammar compiler and the GraphLang parser. Splits text
//! into identifier tokens, delimiters and quoted blocks; whitespace separates
//! tokens and is dropped.

use crate::error::{GraphError, GraphResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    /// Identifier or bare value text
    Token,
    /// One of the configured delimiters
    Delimiter,
    /// Quoted string; `value` holds the text between the quotes
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    /// Char offset of the first character in the source text
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, offset: usize) -> Self {
        Token {
            kind,
            value: value.into(),
            offset,
        }
    }

    pub fn is_delimiter(&self, text: &str) -> bool {
        self.kind == TokenKind::Delimiter && self.value == text
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Block => write!(f, "'{}'", self.value),
            _ => write!(f, "{}", self.value),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StringTokenizer {
    /// Sorted longest first so `<->` wins over `->`
    delimiters: Vec<String>,
    line_comment: Option<String>,
}

impl StringTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn use_delimiters<I, S>(mut self, delimiters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for d in delimiters {
            let d = d.into();
            if !d.is_empty() && !self.delimiters.contains(&d) {
                self.delimiters.push(d);
            }
        }
        self.delimiters.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        self
    }

    /// Skip everything from `prefix` to the end of the line
    pub fn use_line_comment(mut self, prefix: impl Into<String>) -> Self {
        self.line_comment = Some(prefix.into());
        self
    }

    pub fn delimiters(&self) -> &[String] {
        &self.delimiters
    }

    pub fn parse(&self, text: &str) -> GraphResult<Vec<Token>> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut word = String::new();
        let mut word_start = 0;
        let mut pos = 0;

        let flush = |word: &mut String, start: usize, tokens: &mut Vec<Token>| {
            if !word.is_empty() {
                tokens.push(Token::new(TokenKind::Token, std::mem::take(word), start));
            }
        };

        while pos < chars.len() {
            let c = chars[pos];

            if let Some(prefix) = &self.line_comment {
                if starts_with_at(&chars, pos, prefix) {
                    flush(&mut word, word_start, &mut tokens);
                    while pos < chars.len() && chars[pos] != '\n' {
                        pos += 1;
                    }
                    continue;
                }
            }

            if c.is_whitespace() {
                flush(&mut word, word_start, &mut tokens);
                pos += 1;
                continue;
            }

            if c == '"' || c == '\'' {
                flush(&mut word, word_start, &mut tokens);
                let (value, next) = read_block(&chars, pos)?;
                tokens.push(Token::new(TokenKind::Block, value, pos));
                pos = next;
                continue;
            }

            if let Some(delimiter) = self.delimiters.iter().find(|d| starts_with_at(&chars, pos, d)) {
                flush(&mut word, word_start, &mut tokens);
                tokens.push(Token::new(TokenKind::Delimiter, delimiter.clone(), pos));
                pos += delimiter.chars().count();
                continue;
            }

            if word.is_empty() {
                word_start = pos;
            }
            word.push(c);
            pos += 1;
        }

        flush(&mut word, word_start, &mut tokens);
        Ok(tokens)
    }
}

fn starts_with_at(chars: &[char], pos: usize, pattern: &str) -> bool {
    let mut i = pos;
    for p in pattern.chars() {
        if i >= chars.len() || chars[i] != p {
            return false;
        }
        i += 1;
    }
    true
}

/// Read a quoted block starting at the opening quote
///
/// A backslash before the closing quote character escapes it; any other
/// backslash is kept as written.
fn read_block(chars: &[char], start: usize) -> GraphResult<(String, usize)> {
    let quote = chars[start];
    let mut value = String::new();
    let mut pos = start + 1;

    while pos < chars.len() {
        let c = chars[pos];
        if c == '\\' && pos + 1 < chars.len() {
            let next = chars[pos + 1];
            if next != quote {
                value.push(c);
            }
            value.push(next);
            pos += 2;
            continue;
        }
        if c == quote {
            return Ok((value, pos + 1));
        }
        value.push(c);
        pos += 1;
    }

    Err(GraphError::bad_request(format!(
        "unterminated string starting at offset {}",
        start
    )))
}
