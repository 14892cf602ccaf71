//! Error and status types shared by every layer of the engine
//!
//! Expected failures (parse errors, missing keys, duplicates, missing edge
//! endpoints) are values, never panics.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Status class of an operation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    Ok,
    NotFound,
    Conflict,
    BadRequest,
    InternalServerError,
}

impl StatusCode {
    pub fn is_ok(&self) -> bool {
        matches!(self, StatusCode::Ok)
    }

    pub fn is_error(&self) -> bool {
        !self.is_ok()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "NotFound",
            StatusCode::Conflict => "Conflict",
            StatusCode::BadRequest => "BadRequest",
            StatusCode::InternalServerError => "InternalServerError",
        };
        f.write_str(text)
    }
}

/// Errors that can occur anywhere in the parse / execute pipeline
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Parse failure located by token offset (no line/column)
    #[error("Parse error at token {index}: {message}")]
    Parse { index: usize, message: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl GraphError {
    pub fn not_found(message: impl Into<String>) -> Self {
        GraphError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        GraphError::Conflict(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        GraphError::BadRequest(message.into())
    }

    pub fn parse(index: usize, message: impl Into<String>) -> Self {
        GraphError::Parse {
            index,
            message: message.into(),
        }
    }

    /// Map the error onto its status class
    pub fn status(&self) -> StatusCode {
        match self {
            GraphError::NotFound(_) => StatusCode::NotFound,
            GraphError::Conflict(_) => StatusCode::Conflict,
            GraphError::BadRequest(_) | GraphError::Parse { .. } | GraphError::Config(_) => {
                StatusCode::BadRequest
            }
            GraphError::Internal(_) | GraphError::Io(_) | GraphError::Serialization(_) => {
                StatusCode::InternalServerError
            }
        }
    }
}

pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(GraphError::not_found("x").status(), StatusCode::NotFound);
        assert_eq!(GraphError::conflict("x").status(), StatusCode::Conflict);
        assert_eq!(GraphError::parse(3, "expected ','").status(), StatusCode::BadRequest);
        assert_eq!(
            GraphError::Internal("boom".to_string()).status(),
            StatusCode::InternalServerError
        );
    }

    #[test]
    fn test_parse_error_message() {
        let err = GraphError::parse(4, "unexpected ';'");
        assert_eq!(err.to_string(), "Parse error at token 4: unexpected ';'");
    }
}
