//! nodedb-proxy - HTTP-to-document-database proxy
//!
//! Translates Mongo-style JSON filters and update payloads into the command
//! expressions of a document database and serves them over HTTP.

pub mod cli;
pub mod http_server;
pub mod observability;
pub mod query;
pub mod store;
