//! Database HTTP Routes
//!
//! `POST /db/*` endpoints. Each one validates its body, normalizes the
//! filter and payload into the store's expression tree, and forwards the
//! call to the [`DocumentStore`].

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::observability::{Event, Logger, Severity};
use crate::query::{normalize, wrap_for_replacement, Node};
use crate::store::{
    AddResult, DocumentStore, FindOptions, RemoveResult, SortOrder, UpdateResult,
};

use super::errors::{ApiError, ApiResult};
use super::response::{ok, ApiResponse};

/// Page size when the request does not name one
pub const DEFAULT_LIMIT: usize = 100;

/// Store shared across handlers
pub type SharedStore = Arc<dyn DocumentStore>;

// ==================
// Request Types
// ==================

/// Body accepted by every `/db/*` endpoint; each reads the fields it needs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DbRequest {
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default, rename = "where")]
    pub filter: Option<Value>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub skip: Option<usize>,
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub order_type: Option<String>,
    #[serde(default)]
    pub doc_id: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl DbRequest {
    fn collection(&self) -> ApiResult<&str> {
        non_empty(self.collection.as_deref()).ok_or(ApiError::MissingParam("collection"))
    }

    fn doc_id(&self) -> ApiResult<&str> {
        non_empty(self.doc_id.as_deref()).ok_or(ApiError::MissingParam("doc_id"))
    }

    fn data(&self) -> ApiResult<&Value> {
        match &self.data {
            Some(data @ Value::Object(_)) => Ok(data),
            Some(Value::Null) | None => Err(ApiError::MissingParam("data")),
            Some(_) => Err(ApiError::InvalidBody("data must be an object".to_string())),
        }
    }

    /// `where` normalized with the store's factory; absent means match all
    fn filter(&self, store: &dyn DocumentStore) -> ApiResult<Node> {
        let empty = Value::Object(Map::new());
        let raw = match &self.filter {
            None | Some(Value::Null) => &empty,
            Some(filter @ Value::Object(_)) => filter,
            Some(_) => return Err(ApiError::InvalidBody("where must be an object".to_string())),
        };
        let filter = normalize(raw, Some(store.commands()))?;
        if Logger::enabled(Severity::Trace) {
            let wire = filter.to_wire().to_string();
            Logger::trace(Event::QueryNormalized, &[("filter", wire.as_str())]);
        }
        Ok(filter)
    }

    /// Update payload: normalized, then top-level objects marked for replacement
    fn update(&self, store: &dyn DocumentStore) -> ApiResult<Node> {
        let data = normalize(self.data()?, Some(store.commands()))?;
        Ok(wrap_for_replacement(data, store.commands()))
    }

    fn find_options(&self) -> ApiResult<FindOptions> {
        let order = match self.order_type.as_deref() {
            None => SortOrder::default(),
            Some(raw) => SortOrder::parse(raw).ok_or_else(|| {
                ApiError::InvalidBody(format!("order_type must be 'asc' or 'desc', got '{}'", raw))
            })?,
        };

        // limit 0 disables the limit
        let limit = match self.limit.unwrap_or(DEFAULT_LIMIT) {
            0 => None,
            n => Some(n),
        };

        Ok(FindOptions {
            limit,
            skip: self.skip.unwrap_or(0),
            order_by: non_empty(self.order_by.as_deref()).map(|field| (field.to_string(), order)),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

// ==================
// Operations
// ==================

pub fn query(store: &dyn DocumentStore, req: &DbRequest) -> ApiResult<Vec<Value>> {
    let collection = req.collection()?;
    let filter = req.filter(store)?;
    let options = req.find_options()?;
    Ok(store.query(collection, &filter, &options)?)
}

pub fn get_one(store: &dyn DocumentStore, req: &DbRequest) -> ApiResult<Option<Value>> {
    let collection = req.collection()?;
    let filter = req.filter(store)?;
    let found = store.query(collection, &filter, &FindOptions::first())?;
    Ok(found.into_iter().next())
}

pub fn add(store: &dyn DocumentStore, req: &DbRequest) -> ApiResult<AddResult> {
    let collection = req.collection()?;
    // Inserts carry values only: dates are converted, operators stay literal
    let data = normalize(req.data()?, None)?;
    Ok(store.add(collection, &data)?)
}

pub fn update(store: &dyn DocumentStore, req: &DbRequest) -> ApiResult<UpdateResult> {
    let collection = req.collection()?;
    let filter = req.filter(store)?;
    let data = req.update(store)?;
    Ok(store.update(collection, &filter, &data)?)
}

pub fn update_by_id(store: &dyn DocumentStore, req: &DbRequest) -> ApiResult<UpdateResult> {
    let collection = req.collection()?;
    let doc_id = req.doc_id()?;
    let data = req.update(store)?;
    Ok(store.update_by_id(collection, doc_id, &data)?)
}

pub fn delete(store: &dyn DocumentStore, req: &DbRequest) -> ApiResult<RemoveResult> {
    let collection = req.collection()?;
    let filter = req.filter(store)?;
    Ok(store.remove(collection, &filter)?)
}

pub fn delete_by_id(store: &dyn DocumentStore, req: &DbRequest) -> ApiResult<RemoveResult> {
    let collection = req.collection()?;
    let doc_id = req.doc_id()?;
    Ok(store.remove_by_id(collection, doc_id)?)
}

// ==================
// Database Routes
// ==================

/// Create database routes
pub fn db_routes(store: SharedStore) -> Router {
    Router::new()
        .route("/query", post(query_handler))
        .route("/get_one", post(get_one_handler))
        .route("/add", post(add_handler))
        .route("/update", post(update_handler))
        .route("/update_by_id", post(update_by_id_handler))
        .route("/delete", post(delete_handler))
        .route("/delete_by_id", post(delete_by_id_handler))
        .with_state(store)
}

type Body = Result<Json<DbRequest>, JsonRejection>;
type Reply<T> = ApiResult<Json<ApiResponse<T>>>;

/// Run `op` on a parsed body, logging any failure with its operation name
fn dispatch<T, F>(operation: &'static str, store: &SharedStore, body: Body, op: F) -> Reply<T>
where
    T: Serialize,
    F: FnOnce(&dyn DocumentStore, &DbRequest) -> ApiResult<T>,
{
    let outcome = match body {
        Ok(Json(req)) => op(store.as_ref(), &req).map_err(|e| (req.collection, e)),
        Err(rejection) => Err((None, ApiError::from(rejection))),
    };

    match outcome {
        Ok(data) => Ok(ok(data)),
        Err((collection, err)) => {
            log_failure(operation, collection.as_deref().unwrap_or(""), &err);
            Err(err)
        }
    }
}

fn log_failure(operation: &str, collection: &str, err: &ApiError) {
    let message = err.to_string();
    let fields = [
        ("collection", collection),
        ("error", message.as_str()),
        ("operation", operation),
    ];
    match err {
        ApiError::Store(_) => Logger::error(Event::DbOperationFailed, &fields),
        _ => Logger::warn(Event::QueryRejected, &fields),
    }
}

async fn query_handler(State(store): State<SharedStore>, body: Body) -> Reply<Vec<Value>> {
    dispatch("query", &store, body, query)
}

async fn get_one_handler(State(store): State<SharedStore>, body: Body) -> Reply<Option<Value>> {
    dispatch("get_one", &store, body, get_one)
}

async fn add_handler(State(store): State<SharedStore>, body: Body) -> Reply<AddResult> {
    dispatch("add", &store, body, add)
}

async fn update_handler(State(store): State<SharedStore>, body: Body) -> Reply<UpdateResult> {
    dispatch("update", &store, body, update)
}

async fn update_by_id_handler(State(store): State<SharedStore>, body: Body) -> Reply<UpdateResult> {
    dispatch("update_by_id", &store, body, update_by_id)
}

async fn delete_handler(State(store): State<SharedStore>, body: Body) -> Reply<RemoveResult> {
    dispatch("delete", &store, body, delete)
}

async fn delete_by_id_handler(State(store): State<SharedStore>, body: Body) -> Reply<RemoveResult> {
    dispatch("delete_by_id", &store, body, delete_by_id)
}
