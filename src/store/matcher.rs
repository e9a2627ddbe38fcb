//! # Filter Evaluation
//!
//! Evaluates a normalized filter [`Node`] against stored JSON documents.
//!
//! A filter is either an object of `path -> condition` pairs (all must hold)
//! or a logical command whose operands are such objects. A condition is a
//! comparison command, a logical command over conditions, a nested object
//! (partial match on a sub-document) or a literal (equality, or membership
//! when the stored field is an array).

use std::cmp::Ordering;

use serde_json::Value;

use crate::query::{date_from_marker, Command, CompareOp, LogicOp, Node};

use super::errors::{StoreError, StoreResult};

/// Longest dotted path followed during lookup
pub const MAX_PATH_DEPTH: usize = 32;

/// Reject filters the matcher cannot evaluate
pub fn validate_filter(filter: &Node) -> StoreResult<()> {
    match filter {
        Node::Command(Command::Set(_)) => Err(StoreError::UnsupportedFilter(
            "$set is only valid in update payloads".to_string(),
        )),
        Node::Command(Command::Compare { operand, .. }) => validate_filter(operand),
        Node::Command(Command::Logic { operands, .. }) => {
            operands.iter().try_for_each(validate_filter)
        }
        Node::Array(items) => items.iter().try_for_each(validate_filter),
        Node::Object(fields) => fields.iter().try_for_each(|(_, v)| validate_filter(v)),
        _ => Ok(()),
    }
}

/// Check whether `doc` satisfies `filter`
pub fn matches(filter: &Node, doc: &Value) -> bool {
    match filter {
        Node::Object(fields) => fields
            .iter()
            .all(|(path, cond)| field_matches(cond, lookup(doc, path))),
        Node::Command(Command::Logic { op, operands }) => {
            combine(*op, operands, |operand| matches(operand, doc))
        }
        _ => false,
    }
}

/// Resolve a dotted path; numeric segments index into arrays
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for (depth, segment) in path.split('.').enumerate() {
        if depth >= MAX_PATH_DEPTH {
            return None;
        }
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn combine<F>(op: LogicOp, operands: &[Node], mut f: F) -> bool
where
    F: FnMut(&Node) -> bool,
{
    match op {
        LogicOp::And => operands.iter().all(|n| f(n)),
        LogicOp::Or => operands.iter().any(|n| f(n)),
    }
}

fn field_matches(cond: &Node, value: Option<&Value>) -> bool {
    match cond {
        Node::Command(Command::Compare { op, operand }) => compare_matches(*op, operand, value),
        Node::Command(Command::Logic { op, operands }) => {
            combine(*op, operands, |operand| field_matches(operand, value))
        }
        Node::Command(Command::Set(_)) => false,
        Node::Object(fields) => match value {
            Some(sub @ Value::Object(_)) => fields
                .iter()
                .all(|(path, c)| field_matches(c, lookup(sub, path))),
            _ => false,
        },
        literal => equals_or_contains(literal, value),
    }
}

fn compare_matches(op: CompareOp, operand: &Node, value: Option<&Value>) -> bool {
    match op {
        CompareOp::Eq => equals_or_contains(operand, value),
        CompareOp::Neq => !equals_or_contains(operand, value),
        CompareOp::Gt => ordered(operand, value, |o| o == Ordering::Greater),
        CompareOp::Gte => ordered(operand, value, |o| o != Ordering::Less),
        CompareOp::Lt => ordered(operand, value, |o| o == Ordering::Less),
        CompareOp::Lte => ordered(operand, value, |o| o != Ordering::Greater),
        CompareOp::In => in_list(operand, value),
        CompareOp::Nin => !in_list(operand, value),
        CompareOp::All => match (operand, value) {
            (Node::Array(wanted), Some(Value::Array(items))) if !wanted.is_empty() => wanted
                .iter()
                .all(|w| items.iter().any(|item| equals(w, item))),
            _ => false,
        },
    }
}

/// Equality, with `null` matching a missing field and array fields matching
/// any element
fn equals_or_contains(literal: &Node, value: Option<&Value>) -> bool {
    match value {
        None => matches!(literal, Node::Null),
        Some(v) => {
            equals(literal, v)
                || match v {
                    Value::Array(items) if !matches!(literal, Node::Array(_)) => {
                        items.iter().any(|item| equals(literal, item))
                    }
                    _ => false,
                }
        }
    }
}

fn in_list(operand: &Node, value: Option<&Value>) -> bool {
    match operand {
        Node::Array(candidates) => candidates.iter().any(|c| equals_or_contains(c, value)),
        _ => false,
    }
}

/// Range comparison of the stored value against the operand; array fields
/// match if any element does
fn ordered<F>(operand: &Node, value: Option<&Value>, accept: F) -> bool
where
    F: Fn(Ordering) -> bool,
{
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| compare_to(item, operand).is_some_and(&accept)),
        Some(v) => compare_to(v, operand).is_some_and(&accept),
        None => false,
    }
}

/// Order a stored value relative to an operand of the same kind
fn compare_to(value: &Value, operand: &Node) -> Option<Ordering> {
    match operand {
        Node::Number(n) => value.as_f64()?.partial_cmp(&n.as_f64()?),
        Node::String(s) => Some(value.as_str()?.cmp(s.as_str())),
        Node::Bool(b) => Some(value.as_bool()?.cmp(b)),
        Node::Date(dt) => Some(date_from_marker(value)?.cmp(dt)),
        _ => None,
    }
}

/// Structural equality between a filter literal and a stored value
pub fn equals(literal: &Node, value: &Value) -> bool {
    match (literal, value) {
        (Node::Null, Value::Null) => true,
        (Node::Bool(a), Value::Bool(b)) => a == b,
        (Node::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Node::String(a), Value::String(b)) => a == b,
        (Node::Date(dt), v) => date_from_marker(v) == Some(*dt),
        (Node::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| equals(x, y))
        }
        (Node::Object(fields), Value::Object(map)) => {
            fields.len() == map.len()
                && fields
                    .iter()
                    .all(|(k, n)| map.get(k).is_some_and(|v| equals(n, v)))
        }
        _ => false,
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(v) if date_from_marker(v).is_some() => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Object(_)) => 6,
    }
}

/// Total order used for sorting query results
pub fn sort_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (ra, rb) = (type_rank(a), type_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .unwrap_or(0.0)
            .total_cmp(&y.as_f64().unwrap_or(0.0)),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) if ra == 4 => date_from_marker(x).cmp(&date_from_marker(y)),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{normalize, CommandFactory, StandardCommands};
    use serde_json::json;

    fn filter(value: Value) -> Node {
        normalize(&value, Some(&StandardCommands)).unwrap()
    }

    #[test]
    fn test_lookup_paths() {
        let doc = json!({"a": {"b": [10, {"c": 3}]}});
        assert_eq!(lookup(&doc, "a.b.0"), Some(&json!(10)));
        assert_eq!(lookup(&doc, "a.b.1.c"), Some(&json!(3)));
        assert_eq!(lookup(&doc, "a.x"), None);
        assert_eq!(lookup(&doc, "a.b.9"), None);
    }

    #[test]
    fn test_equality_and_membership() {
        let doc = json!({"name": "ann", "tags": ["x", "y"], "n": 1.0});
        assert!(matches(&filter(json!({"name": "ann"})), &doc));
        assert!(matches(&filter(json!({"tags": "y"})), &doc));
        assert!(matches(&filter(json!({"n": 1})), &doc));
        assert!(!matches(&filter(json!({"name": "bob"})), &doc));
    }

    #[test]
    fn test_null_matches_missing() {
        let doc = json!({"a": 1});
        assert!(matches(&filter(json!({"gone": null})), &doc));
        assert!(!matches(&filter(json!({"a": null})), &doc));
    }

    #[test]
    fn test_range() {
        let f = filter(json!({"age": {"$gte": 18, "$lt": 30}}));
        assert!(matches(&f, &json!({"age": 18})));
        assert!(matches(&f, &json!({"age": 29.5})));
        assert!(!matches(&f, &json!({"age": 30})));
        assert!(!matches(&f, &json!({"age": "20"})));
        assert!(!matches(&f, &json!({})));
    }

    #[test]
    fn test_dates_compare() {
        let f = filter(json!({"at": {"$gt": {"$date": "2024-01-01T00:00:00Z"}}}));
        assert!(matches(&f, &json!({"at": {"$date": "2024-06-01T00:00:00.000Z"}})));
        assert!(!matches(&f, &json!({"at": {"$date": "2023-06-01T00:00:00.000Z"}})));
    }

    #[test]
    fn test_in_nin_neq_all() {
        let doc = json!({"s": "b", "tags": ["x", "y", "z"]});
        assert!(matches(&filter(json!({"s": {"$in": ["a", "b"]}})), &doc));
        assert!(!matches(&filter(json!({"s": {"$nin": ["a", "b"]}})), &doc));
        assert!(matches(&filter(json!({"s": {"$neq": "a"}})), &doc));
        assert!(matches(&filter(json!({"missing": {"$neq": "a"}})), &doc));
        assert!(matches(&filter(json!({"tags": {"$all": ["z", "x"]}})), &doc));
        assert!(!matches(&filter(json!({"tags": {"$all": ["z", "q"]}})), &doc));
    }

    #[test]
    fn test_logical() {
        let f = filter(json!({"$or": [{"a": 1}, {"b": 2}], "c": 3}));
        assert!(matches(&f, &json!({"a": 1, "c": 3})));
        assert!(matches(&f, &json!({"b": 2, "c": 3})));
        assert!(!matches(&f, &json!({"a": 1, "c": 4})));
        assert!(!matches(&f, &json!({"a": 2, "b": 3, "c": 3})));
    }

    #[test]
    fn test_nested_partial_match() {
        let doc = json!({"profile": {"age": 30, "city": "x"}});
        assert!(matches(&filter(json!({"profile": {"age": 30}})), &doc));
        assert!(matches(&filter(json!({"profile.city": "x"})), &doc));
        assert!(!matches(&filter(json!({"profile": {"age": 31}})), &doc));
    }

    #[test]
    fn test_set_rejected_in_filter() {
        let f = Node::object([("a", Node::Command(StandardCommands.set(Node::Null)))]);
        assert!(matches!(
            validate_filter(&f),
            Err(StoreError::UnsupportedFilter(_))
        ));
        assert!(validate_filter(&filter(json!({"a": {"$gt": 1}}))).is_ok());
    }

    #[test]
    fn test_sort_order_across_types() {
        let values = [json!("b"), json!(2), json!(null), json!(true), json!("a"), json!(1)];
        let mut sorted: Vec<_> = values.iter().collect();
        sorted.sort_by(|a, b| sort_cmp(Some(a), Some(b)));
        assert_eq!(
            sorted,
            vec![&json!(null), &json!(true), &json!(1), &json!(2), &json!("a"), &json!("b")]
        );
        assert_eq!(sort_cmp(None, Some(&json!(0))), Ordering::Less);
    }
}
