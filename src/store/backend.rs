//! # Document Store Boundary
//!
//! The capability the proxy needs from a document database client. All
//! filters and update payloads arrive already normalized.

use serde::Serialize;
use serde_json::Value;

use crate::query::{CommandFactory, Node};

use super::errors::StoreResult;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse `"asc"` / `"desc"` (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(SortOrder::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(SortOrder::Desc)
        } else {
            None
        }
    }
}

/// Options for [`DocumentStore::query`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Maximum documents to return; `None` is unbounded
    pub limit: Option<usize>,
    /// Documents to skip after sorting
    pub skip: usize,
    /// Field path and direction to sort by
    pub order_by: Option<(String, SortOrder)>,
}

impl FindOptions {
    /// Options for fetching at most one document
    pub fn first() -> Self {
        Self {
            limit: Some(1),
            ..Default::default()
        }
    }
}

/// Result of an insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddResult {
    pub id: String,
}

/// Result of an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
    pub updated: u64,
}

/// Result of a removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemoveResult {
    pub deleted: u64,
}

/// Document database client
pub trait DocumentStore: Send + Sync {
    /// Factory used to build expressions this store understands
    fn commands(&self) -> &dyn CommandFactory;

    /// Documents matching `filter`
    fn query(&self, collection: &str, filter: &Node, options: &FindOptions)
        -> StoreResult<Vec<Value>>;

    /// Insert a document
    fn add(&self, collection: &str, data: &Node) -> StoreResult<AddResult>;

    /// Apply `data` to every document matching `filter`
    fn update(&self, collection: &str, filter: &Node, data: &Node) -> StoreResult<UpdateResult>;

    /// Apply `data` to the document with id `doc_id`
    fn update_by_id(&self, collection: &str, doc_id: &str, data: &Node)
        -> StoreResult<UpdateResult>;

    /// Remove every document matching `filter`
    fn remove(&self, collection: &str, filter: &Node) -> StoreResult<RemoveResult>;

    /// Remove the document with id `doc_id`
    fn remove_by_id(&self, collection: &str, doc_id: &str) -> StoreResult<RemoveResult>;
}
