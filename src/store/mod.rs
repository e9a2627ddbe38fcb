//! # Document Store
//!
//! The boundary to the document database client, plus an in-memory
//! implementation with the same filter and update semantics.

pub mod backend;
pub mod config;
pub mod errors;
pub mod matcher;
pub mod memory;
pub mod update;

pub use backend::{
    AddResult, DocumentStore, FindOptions, RemoveResult, SortOrder, UpdateResult,
};
pub use config::DatabaseConfig;
pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;
