//! # Query Errors
//!
//! The normalizer degrades silently on malformed operators, so the only
//! failure it reports is a payload nested beyond the configured depth.
//! [`NotLiteral`] belongs to the node layer: a tree holding expressions
//! cannot be stored as a document.

use thiserror::Error;

/// Result type for query normalization
pub type QueryResult<T> = Result<T, QueryError>;

/// Query normalization errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Payload nests deeper than the normalizer accepts
    #[error("Query nesting exceeds maximum depth of {max_depth}")]
    TooDeep { max_depth: usize },
}

impl QueryError {
    /// Stable error code for logs and responses
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::TooDeep { .. } => "NODEDB_QUERY_TOO_DEEP",
        }
    }
}

/// A command was found where a stored value was expected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Expression {operator} cannot be stored as a literal value")]
pub struct NotLiteral {
    pub operator: &'static str,
}
