//! Observability for the proxy
//!
//! Structured JSON log lines, one per event.
//!
//! ```ignore
//! use nodedb_proxy::observability::{Event, Logger};
//!
//! Logger::info(Event::HttpRequest, &[("path", "/db/query"), ("status", "200")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity, UnknownSeverity};
