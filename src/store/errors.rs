//! # Store Errors
//!
//! Failures reported by a document store. The HTTP layer passes these through
//! unchanged as operational errors.

use thiserror::Error;

use crate::query::NotLiteral;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Filter contains an expression the store cannot evaluate
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Update contains an expression the store cannot apply
    #[error("Unsupported update: {0}")]
    UnsupportedUpdate(String),

    /// Document data contains an expression instead of a value
    #[error("{0}")]
    UnsupportedValue(#[from] NotLiteral),

    /// Path update blocked by a scalar on the way down, or by an array index it cannot address
    #[error("Cannot create field '{path}' in element of type {found}")]
    BlockedPath { path: String, found: &'static str },

    /// `_id` cannot be modified
    #[error("Performing an update on the path '_id' would modify the immutable field '_id'")]
    ImmutableId,

    /// Insert with an `_id` already present in the collection
    #[error("Duplicate document id: {0}")]
    DuplicateId(String),

    /// Insert payload is not a document
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Store-internal failure
    #[error("Internal store error: {0}")]
    Internal(String),
}
