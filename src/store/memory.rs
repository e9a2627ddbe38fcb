//! # In-Memory Document Store
//!
//! A [`DocumentStore`] holding collections in process memory. It evaluates
//! the same expression tree and update semantics as the managed database,
//! which makes the proxy runnable locally and testable end to end.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::query::{CommandFactory, Node, StandardCommands};

use super::backend::{
    AddResult, DocumentStore, FindOptions, RemoveResult, SortOrder, UpdateResult,
};
use super::config::DatabaseConfig;
use super::errors::{StoreError, StoreResult};
use super::matcher::{lookup, matches, sort_cmp, validate_filter};
use super::update::apply_update;

const ID_FIELD: &str = "_id";

/// Collection name -> documents in insertion order
type Collections = HashMap<String, Vec<Value>>;

/// In-memory document store
pub struct MemoryStore {
    config: DatabaseConfig,
    commands: StandardCommands,
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            config: config.clone(),
            commands: StandardCommands,
            collections: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Number of documents in a collection (0 if it does not exist)
    pub fn count(&self, collection: &str) -> StoreResult<usize> {
        Ok(self.read()?.get(collection).map_or(0, Vec::len))
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Collections>> {
        self.collections
            .read()
            .map_err(|_| StoreError::Internal("collection lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Collections>> {
        self.collections
            .write()
            .map_err(|_| StoreError::Internal("collection lock poisoned".to_string()))
    }

    /// Update every document selected by `select`; all-or-nothing
    fn update_where<P>(&self, collection: &str, data: &Node, select: P) -> StoreResult<UpdateResult>
    where
        P: Fn(&Value) -> bool,
    {
        let mut collections = self.write()?;
        let docs = match collections.get_mut(collection) {
            Some(docs) => docs,
            None => return Ok(UpdateResult { updated: 0 }),
        };

        let mut staged = Vec::new();
        for (idx, doc) in docs.iter().enumerate() {
            if !select(doc) {
                continue;
            }
            let mut updated = doc.as_object().cloned().unwrap_or_default();
            apply_update(&mut updated, data)?;
            staged.push((idx, Value::Object(updated)));
        }

        let count = staged.len() as u64;
        for (idx, doc) in staged {
            docs[idx] = doc;
        }
        Ok(UpdateResult { updated: count })
    }

    fn remove_where<P>(&self, collection: &str, select: P) -> StoreResult<RemoveResult>
    where
        P: Fn(&Value) -> bool,
    {
        let mut collections = self.write()?;
        let docs = match collections.get_mut(collection) {
            Some(docs) => docs,
            None => return Ok(RemoveResult { deleted: 0 }),
        };
        let before = docs.len();
        docs.retain(|doc| !select(doc));
        Ok(RemoveResult {
            deleted: (before - docs.len()) as u64,
        })
    }
}

fn has_id(doc: &Value, doc_id: &str) -> bool {
    doc.get(ID_FIELD).and_then(Value::as_str) == Some(doc_id)
}

impl DocumentStore for MemoryStore {
    fn commands(&self) -> &dyn CommandFactory {
        &self.commands
    }

    fn query(
        &self,
        collection: &str,
        filter: &Node,
        options: &FindOptions,
    ) -> StoreResult<Vec<Value>> {
        validate_filter(filter)?;

        let collections = self.read()?;
        let mut found: Vec<Value> = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches(filter, d)).cloned().collect())
            .unwrap_or_default();
        drop(collections);

        if let Some((field, order)) = &options.order_by {
            found.sort_by(|a, b| {
                let ord = sort_cmp(lookup(a, field), lookup(b, field));
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }

        let page = found.into_iter().skip(options.skip);
        Ok(match options.limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        })
    }

    fn add(&self, collection: &str, data: &Node) -> StoreResult<AddResult> {
        let mut doc: Map<String, Value> = match data.to_literal()? {
            Value::Object(map) => map,
            _ => {
                return Err(StoreError::InvalidDocument(
                    "document must be an object".to_string(),
                ))
            }
        };

        let id = match doc.get(ID_FIELD) {
            Some(Value::String(id)) => id.clone(),
            Some(_) => {
                return Err(StoreError::InvalidDocument(
                    "_id must be a string".to_string(),
                ))
            }
            None => {
                let id = Uuid::new_v4().to_string();
                doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                id
            }
        };

        let mut collections = self.write()?;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|d| has_id(d, &id)) {
            return Err(StoreError::DuplicateId(id));
        }
        docs.push(Value::Object(doc));

        Ok(AddResult { id })
    }

    fn update(&self, collection: &str, filter: &Node, data: &Node) -> StoreResult<UpdateResult> {
        validate_filter(filter)?;
        self.update_where(collection, data, |doc| matches(filter, doc))
    }

    fn update_by_id(
        &self,
        collection: &str,
        doc_id: &str,
        data: &Node,
    ) -> StoreResult<UpdateResult> {
        self.update_where(collection, data, |doc| has_id(doc, doc_id))
    }

    fn remove(&self, collection: &str, filter: &Node) -> StoreResult<RemoveResult> {
        validate_filter(filter)?;
        self.remove_where(collection, |doc| matches(filter, doc))
    }

    fn remove_by_id(&self, collection: &str, doc_id: &str) -> StoreResult<RemoveResult> {
        self.remove_where(collection, |doc| has_id(doc, doc_id))
    }
}
