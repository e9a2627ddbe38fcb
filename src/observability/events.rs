//! Observable events of the proxy
//!
//! Events are explicit and typed; log lines carry their `as_str` name.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Server is binding its listener
    ServerStarting,
    /// Listener bound, ready to serve
    ServerReady,
    /// Server loop exited with an error
    ServerFailed,

    // Request handling
    /// One HTTP request completed
    HttpRequest,
    /// Filter normalized into the store's expression tree
    QueryNormalized,
    /// Request body or parameters rejected before reaching the store
    QueryRejected,
    /// Store call failed
    DbOperationFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ServerStarting => "SERVER_STARTING",
            Event::ServerReady => "SERVER_READY",
            Event::ServerFailed => "SERVER_FAILED",
            Event::HttpRequest => "HTTP_REQUEST",
            Event::QueryNormalized => "QUERY_NORMALIZED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::DbOperationFailed => "DB_OPERATION_FAILED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
