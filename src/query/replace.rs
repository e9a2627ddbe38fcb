//! # Nested-Object Replacement
//!
//! Partial updates merge nested objects path by path. When the stored field
//! is `null`, the database refuses to create sub-paths under it, so plain
//! object values at the top level of an update are wrapped in a `set` marker
//! and replace the whole field instead.

use super::command::CommandFactory;
use super::node::Node;

/// Wrap top-level plain-object values of an update payload in `set` markers
///
/// Left untouched: scalars, `null`, dates, arrays, values that already are
/// commands, and dotted keys (`"a.b"` already addresses a sub-path).
/// Nested levels are never inspected. Non-object payloads pass through.
pub fn wrap_for_replacement(data: Node, commands: &dyn CommandFactory) -> Node {
    match data {
        Node::Object(fields) => Node::Object(
            fields
                .into_iter()
                .map(|(key, value)| {
                    let value = match value {
                        obj @ Node::Object(_) if !key.contains('.') => {
                            Node::Command(commands.set(obj))
                        }
                        other => other,
                    };
                    (key, value)
                })
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::command::StandardCommands;
    use crate::query::normalizer::normalize;
    use serde_json::json;

    const F: StandardCommands = StandardCommands;

    fn wrap(value: serde_json::Value) -> Node {
        wrap_for_replacement(normalize(&value, Some(&F)).unwrap(), &F)
    }

    #[test]
    fn test_nested_object_is_wrapped() {
        assert_eq!(
            wrap(json!({"profile": {"age": 30}})),
            Node::object([(
                "profile",
                Node::Command(F.set(Node::object([("age", Node::from(30))])))
            )])
        );
    }

    #[test]
    fn test_dotted_key_untouched() {
        assert_eq!(
            wrap(json!({"unreadCount.total": {"chat": 1}})),
            Node::object([(
                "unreadCount.total",
                Node::object([("chat", Node::from(1))])
            )])
        );
    }

    #[test]
    fn test_leaves_untouched() {
        let node = wrap(json!({
            "name": "x",
            "gone": null,
            "tags": [{"a": 1}],
            "at": {"$date": "2024-01-01T00:00:00Z"}
        }));
        let fields = node.as_fields().unwrap();
        assert!(fields.iter().all(|(_, v)| !v.is_command()));
    }

    #[test]
    fn test_existing_command_untouched() {
        let node = wrap(json!({"score": {"$gt": 1}}));
        assert_eq!(
            node,
            Node::object([("score", Node::Command(F.gt(Node::from(1))))])
        );
    }

    #[test]
    fn test_only_top_level_is_wrapped() {
        let node = wrap(json!({"a": {"b": {"c": 1}}}));
        let inner = match node.get("a") {
            Some(Node::Command(crate::query::Command::Set(inner))) => inner.as_ref().clone(),
            other => panic!("expected set marker, got {:?}", other),
        };
        assert_eq!(inner.get("b"), Some(&Node::object([("c", Node::from(1))])));
    }

    #[test]
    fn test_non_object_payload_passes_through() {
        assert_eq!(
            wrap(json!([{"a": 1}])),
            Node::Array(vec![Node::object([("a", Node::from(1))])])
        );
    }
}
