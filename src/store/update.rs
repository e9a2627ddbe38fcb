//! # Update Application
//!
//! Applies a normalized update payload to a stored document with the target
//! database's partial-update semantics:
//! - `set` markers replace the whole field
//! - plain nested objects merge path by path (`{"a": {"b": 1}}` writes `a.b`)
//! - dotted keys address sub-paths directly
//! - numeric segments address existing array elements (`tags.0`)
//! - a path cannot be created below a `null` or other scalar value

use serde_json::{Map, Value};

use crate::query::{Command, Node};

use super::errors::{StoreError, StoreResult};

const ID_FIELD: &str = "_id";

/// Apply `update` to `doc` in place
///
/// On error `doc` may be partially modified; callers apply to a copy.
pub fn apply_update(doc: &mut Map<String, Value>, update: &Node) -> StoreResult<()> {
    let fields = update.as_fields().ok_or_else(|| {
        StoreError::UnsupportedUpdate("update payload must be an object".to_string())
    })?;

    if fields
        .iter()
        .any(|(k, _)| k == ID_FIELD || k.starts_with("_id."))
    {
        return Err(StoreError::ImmutableId);
    }

    for (path, value) in fields {
        apply_field(doc, path, value)?;
    }
    Ok(())
}

fn apply_field(doc: &mut Map<String, Value>, path: &str, value: &Node) -> StoreResult<()> {
    match value {
        Node::Command(Command::Set(inner)) => set_path(doc, path, inner.to_literal()?),
        Node::Command(cmd) => Err(StoreError::UnsupportedUpdate(format!(
            "operator {} cannot be used in an update",
            cmd.operator_key()
        ))),
        Node::Object(fields) if !fields.is_empty() => {
            for (key, sub) in fields {
                apply_field(doc, &format!("{}.{}", path, key), sub)?;
            }
            Ok(())
        }
        other => set_path(doc, path, other.to_literal()?),
    }
}

/// Write `value` at a dotted path, creating missing intermediate objects
///
/// Numeric segments index into existing array elements; they never extend
/// an array.
fn set_path(doc: &mut Map<String, Value>, path: &str, value: Value) -> StoreResult<()> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut root = Value::Object(std::mem::take(doc));
    let result = write_at(&mut root, &segments, 0, value);
    if let Value::Object(map) = root {
        *doc = map;
    }
    result
}

fn write_at(target: &mut Value, segments: &[&str], at: usize, value: Value) -> StoreResult<()> {
    let segment = segments[at];
    let is_last = at + 1 == segments.len();
    let blocked = |found| StoreError::BlockedPath {
        path: segments[..=at].join("."),
        found,
    };

    match target {
        Value::Object(map) if is_last => {
            map.insert(segment.to_string(), value);
            Ok(())
        }
        Value::Object(map) => {
            let child = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            write_at(child, segments, at + 1, value)
        }
        Value::Array(items) => {
            match segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                Some(slot) if is_last => {
                    *slot = value;
                    Ok(())
                }
                Some(slot) => write_at(slot, segments, at + 1, value),
                None => Err(blocked("array")),
            }
        }
        other => Err(blocked(type_name(other))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
