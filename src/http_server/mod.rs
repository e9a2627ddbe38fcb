//! # HTTP Server Module
//!
//! The proxy's HTTP surface: an axum router forwarding JSON requests to a
//! [`DocumentStore`](crate::store::DocumentStore).
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /` - Service name and environment id
//! - `POST /db/{query,get_one,add,update,update_by_id,delete,delete_by_id}`

pub mod config;
pub mod db_routes;
pub mod errors;
pub mod health_routes;
pub mod response;
pub mod server;

pub use config::{ConfigError, HttpServerConfig, ProxyConfig, DEFAULT_BODY_LIMIT};
pub use db_routes::{DbRequest, SharedStore, DEFAULT_LIMIT};
pub use errors::{ApiError, ApiResult};
pub use response::ApiResponse;
pub use server::HttpServer;
