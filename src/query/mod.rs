//! # Query Translation
//!
//! Turns Mongo-style JSON filters and update payloads into the expression
//! tree of the document database's command layer.
//!
//! ```ignore
//! use nodedb_proxy::query::{normalize, wrap_for_replacement, StandardCommands};
//!
//! let f = StandardCommands;
//! let filter = normalize(&json!({"age": {"$gte": 18, "$lt": 30}}), Some(&f))?;
//! let update = wrap_for_replacement(normalize(&payload, Some(&f))?, &f);
//! ```

pub mod command;
pub mod errors;
pub mod node;
pub mod normalizer;
pub mod replace;

pub use command::{Command, CommandFactory, CompareOp, LogicOp, StandardCommands};
pub use errors::{NotLiteral, QueryError, QueryResult};
pub use node::{date_from_marker, date_marker, parse_date, Fields, Node};
pub use normalizer::{normalize, Normalizer, MAX_QUERY_DEPTH};
pub use replace::wrap_for_replacement;
