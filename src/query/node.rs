//! # Normalized Value Tree
//!
//! `Node` is what a query or update payload becomes after normalization:
//! JSON shapes plus native dates and command expressions.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

use super::command::Command;
use super::errors::NotLiteral;

/// Key of the extended-JSON date marker
pub const DATE_KEY: &str = "$date";

/// Ordered object fields; key order is the payload's insertion order
pub type Fields = Vec<(String, Node)>;

/// A normalized query/update value
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Parsed `{"$date": ...}` marker
    Date(DateTime<Utc>),
    Array(Vec<Node>),
    Object(Fields),
    /// Expression or replacement marker built by a command factory
    Command(Command),
}

impl Node {
    /// Build an object node from `(key, value)` pairs
    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Node)>,
    {
        Node::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Copy a JSON value verbatim, without recognizing any markers
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(*b),
            Value::Number(n) => Node::Number(n.clone()),
            Value::String(s) => Node::String(s.clone()),
            Value::Array(items) => Node::Array(items.iter().map(Node::from_json).collect()),
            Value::Object(map) => Node::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Node::from_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn as_fields(&self) -> Option<&Fields> {
        match self {
            Node::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Look up a top-level field of an object node
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_fields()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn is_command(&self) -> bool {
        matches!(self, Node::Command(_))
    }

    /// True if a command appears anywhere in the tree
    pub fn contains_command(&self) -> bool {
        match self {
            Node::Command(_) => true,
            Node::Array(items) => items.iter().any(Node::contains_command),
            Node::Object(fields) => fields.iter().any(|(_, v)| v.contains_command()),
            _ => false,
        }
    }

    /// Render to Mongo-style JSON
    ///
    /// Dates become `{"$date": "<RFC 3339>"}`, comparisons `{"$op": operand}`,
    /// logic `{"$and"|"$or": [...]}` and replacement markers `{"$set": value}`.
    pub fn to_wire(&self) -> Value {
        match self {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Number(n) => Value::Number(n.clone()),
            Node::String(s) => Value::String(s.clone()),
            Node::Date(dt) => date_marker(dt),
            Node::Array(items) => Value::Array(items.iter().map(Node::to_wire).collect()),
            Node::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_wire()))
                    .collect(),
            ),
            Node::Command(cmd) => {
                let inner = match cmd {
                    Command::Compare { operand, .. } => operand.to_wire(),
                    Command::Logic { operands, .. } => {
                        Value::Array(operands.iter().map(Node::to_wire).collect())
                    }
                    Command::Set(value) => value.to_wire(),
                };
                let mut map = Map::new();
                map.insert(cmd.operator_key().to_string(), inner);
                Value::Object(map)
            }
        }
    }

    /// Convert to the JSON value stored in a document
    ///
    /// Same as [`Node::to_wire`] for plain data, but any command is an error.
    pub fn to_literal(&self) -> Result<Value, NotLiteral> {
        Ok(match self {
            Node::Command(cmd) => {
                return Err(NotLiteral {
                    operator: cmd.operator_key(),
                })
            }
            Node::Array(items) => Value::Array(
                items
                    .iter()
                    .map(Node::to_literal)
                    .collect::<Result<_, _>>()?,
            ),
            Node::Object(fields) => {
                let mut map = Map::with_capacity(fields.len());
                for (k, v) in fields {
                    map.insert(k.clone(), v.to_literal()?);
                }
                Value::Object(map)
            }
            other => other.to_wire(),
        })
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::Number(Number::from(n))
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}

impl From<DateTime<Utc>> for Node {
    fn from(dt: DateTime<Utc>) -> Self {
        Node::Date(dt)
    }
}

impl From<Command> for Node {
    fn from(cmd: Command) -> Self {
        Node::Command(cmd)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Array(items)
    }
}

/// ISO-8601 date-times with an explicit offset (`+08:00`, `+0800`, `+08`)
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M%#z"];

/// ISO-8601 date-times without an offset, read as UTC
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse the string carried by a `$date` marker
///
/// Accepts RFC 3339, ISO-8601 date-times with or without seconds and with a
/// `Z`, extended or basic offset, naive date-times (read as UTC) and a bare
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let naive = s.strip_suffix(['Z', 'z']).unwrap_or(s);
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Render a date as an extended-JSON marker, millisecond precision
pub fn date_marker(dt: &DateTime<Utc>) -> Value {
    let mut map = Map::new();
    map.insert(
        DATE_KEY.to_string(),
        Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    Value::Object(map)
}

/// Read a stored `{"$date": "..."}` value back into a date
pub fn date_from_marker(value: &Value) -> Option<DateTime<Utc>> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }
    map.get(DATE_KEY)?.as_str().and_then(parse_date)
}
