//! Structured errors
//!
//! Each pipeline stage has its own error type. Callers of the compiler see a
//! single `CompileError` carrying a machine-readable code, so a failure can be
//! reported as JSON without losing which stage produced it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard error codes (machine-readable)
pub mod codes {
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const MISSING_TARGET_COLUMN: &str = "MISSING_TARGET_COLUMN";
    pub const UNSUPPORTED_OPERATION: &str = "UNSUPPORTED_OPERATION";
    pub const UNSUPPORTED_ASSIGNMENT: &str = "UNSUPPORTED_ASSIGNMENT";
    pub const UNEXPECTED_NODE: &str = "UNEXPECTED_NODE";
}

/// Grammar violation found by the parser
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message} (line {line}, offset {offset})")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, offset: usize) -> Self {
        Self {
            message: message.into(),
            line,
            offset,
        }
    }
}

/// Fatal code generation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("Target column is not specified for operation {0}")]
    MissingTargetColumn(String),

    #[error("Operation {0} is not supported")]
    UnsupportedOperation(String),

    #[error("Value assigned to {target} is an arithmetic expression ({expression})")]
    UnsupportedAssignment { target: String, expression: String },

    #[error("{0} cannot be used as an expression")]
    UnexpectedNode(String),
}

/// Where in the source an error was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub offset: usize,
}

/// Error returned by the compiler entry points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileError {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Suggestion for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Source position, when the error comes from the front end
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl CompileError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion: None,
            location: None,
        }
    }

    /// Builder: add suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Builder: set source position
    pub fn at(mut self, line: usize, offset: usize) -> Self {
        self.location = Some(Location { line, offset });
        self
    }

    pub fn is_parse_error(&self) -> bool {
        self.code == codes::PARSE_ERROR
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(location) = self.location {
            write!(f, " at {}:{}", location.line, location.offset)?;
        }
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        Self::new(codes::PARSE_ERROR, err.message)
            .at(err.line, err.offset)
            .with_suggestion("Check rule syntax: если <condition> то <column> = <value> [иначе ...]")
    }
}

impl From<GenerateError> for CompileError {
    fn from(err: GenerateError) -> Self {
        let message = err.to_string();
        match err {
            GenerateError::MissingTargetColumn(_) => {
                Self::new(codes::MISSING_TARGET_COLUMN, message)
                    .with_suggestion("Specify the target column of the register operation")
            }
            GenerateError::UnsupportedOperation(_) => {
                Self::new(codes::UNSUPPORTED_OPERATION, message)
                    .with_suggestion("Supported operations: ContainsAll, ContainsAny, Sum")
            }
            GenerateError::UnsupportedAssignment { .. } => {
                Self::new(codes::UNSUPPORTED_ASSIGNMENT, message)
                    .with_suggestion("Assign a column reference or a literal")
            }
            GenerateError::UnexpectedNode(_) => Self::new(codes::UNEXPECTED_NODE, message),
        }
    }
}
