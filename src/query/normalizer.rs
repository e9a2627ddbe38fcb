//! # Query/Update Normalizer
//!
//! Rewrites a Mongo-style JSON payload into a [`Node`] tree:
//! - `{"$date": "<ISO-8601>"}` becomes a native date
//! - operator objects (`{"$gte": 5, "$lt": 10}`) become one composed expression
//! - `$or` / `$and` become logical expressions, AND-merged with sibling fields
//! - everything else keeps its shape
//!
//! Malformed operator input never fails: unknown `$` keys are skipped and
//! ill-typed markers fall through to plain objects. The one hard limit is
//! nesting depth.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::command::{Command, CommandFactory, CompareOp};
use super::errors::{QueryError, QueryResult};
use super::node::{parse_date, Fields, Node, DATE_KEY};

/// Deepest container nesting accepted in a payload
pub const MAX_QUERY_DEPTH: usize = 64;

const OR_KEY: &str = "$or";
const AND_KEY: &str = "$and";

/// Shape of an object node, decided once on entry
#[derive(Debug)]
enum NodeKind<'a> {
    /// `{"$date": "<parseable string>"}`
    DateMarker(DateTime<Utc>),
    /// Has an `$or` array, possibly next to other fields
    Or(&'a [Value]),
    /// Has an `$and` array, possibly next to other fields
    And(&'a [Value]),
    /// Non-empty, every key `$`-prefixed
    Operators,
    Plain,
}

/// Recursive payload normalizer
///
/// Without a command factory only dates are rewritten; operator and logical
/// objects are copied as plain objects.
#[derive(Clone, Copy)]
pub struct Normalizer<'a> {
    commands: Option<&'a dyn CommandFactory>,
    max_depth: usize,
}

impl<'a> Normalizer<'a> {
    pub fn new(commands: Option<&'a dyn CommandFactory>) -> Self {
        Self {
            commands,
            max_depth: MAX_QUERY_DEPTH,
        }
    }

    /// Override the nesting limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Normalize a payload
    pub fn normalize(&self, value: &Value) -> QueryResult<Node> {
        self.value(value, 0)
    }

    fn value(&self, value: &Value, depth: usize) -> QueryResult<Node> {
        match value {
            Value::Array(items) => {
                let depth = self.enter(depth)?;
                items
                    .iter()
                    .map(|item| self.value(item, depth))
                    .collect::<QueryResult<Vec<_>>>()
                    .map(Node::Array)
            }
            Value::Object(map) => {
                let depth = self.enter(depth)?;
                self.object(map, depth)
            }
            scalar => Ok(Node::from_json(scalar)),
        }
    }

    fn enter(&self, depth: usize) -> QueryResult<usize> {
        let next = depth + 1;
        if next > self.max_depth {
            return Err(QueryError::TooDeep {
                max_depth: self.max_depth,
            });
        }
        Ok(next)
    }

    fn classify<'v>(&self, map: &'v Map<String, Value>) -> NodeKind<'v> {
        if map.len() == 1 {
            if let Some(Value::String(s)) = map.get(DATE_KEY) {
                if let Some(dt) = parse_date(s) {
                    return NodeKind::DateMarker(dt);
                }
            }
        }

        if self.commands.is_none() {
            return NodeKind::Plain;
        }

        if let Some(Value::Array(branches)) = map.get(OR_KEY) {
            return NodeKind::Or(branches);
        }
        if let Some(Value::Array(branches)) = map.get(AND_KEY) {
            return NodeKind::And(branches);
        }
        if !map.is_empty() && map.keys().all(|k| k.starts_with('$')) {
            return NodeKind::Operators;
        }
        NodeKind::Plain
    }

    fn object(&self, map: &Map<String, Value>, depth: usize) -> QueryResult<Node> {
        // Every kind but DateMarker/Plain requires a factory; classify() checks.
        match (self.classify(map), self.commands) {
            (NodeKind::DateMarker(dt), _) => Ok(Node::Date(dt)),
            (NodeKind::Or(branches), Some(commands)) => {
                let or = commands.or(self.branches(branches, depth)?);
                match self.siblings(map, OR_KEY, depth)? {
                    None => Ok(Node::Command(or)),
                    // Best-effort merge; the target service may not accept
                    // this shape for every sibling combination.
                    Some(rest) => Ok(Node::Command(
                        commands.and(vec![rest, Node::Command(or)]),
                    )),
                }
            }
            (NodeKind::And(branches), Some(commands)) => {
                let mut members = self.branches(branches, depth)?;
                if let Some(rest) = self.siblings(map, AND_KEY, depth)? {
                    members.push(rest);
                }
                Ok(Node::Command(commands.and(members)))
            }
            (NodeKind::Operators, Some(commands)) => self.operators(map, commands, depth),
            _ => self.fields(map, depth).map(Node::Object),
        }
    }

    fn branches(&self, branches: &[Value], depth: usize) -> QueryResult<Vec<Node>> {
        branches.iter().map(|b| self.value(b, depth)).collect()
    }

    /// Everything except the consumed logical key, normalized as an object
    fn siblings(
        &self,
        map: &Map<String, Value>,
        consumed: &str,
        depth: usize,
    ) -> QueryResult<Option<Node>> {
        if map.len() == 1 {
            return Ok(None);
        }
        let rest: Map<String, Value> = map
            .iter()
            .filter(|(k, _)| k.as_str() != consumed)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.object(&rest, depth).map(Some)
    }

    fn operators(
        &self,
        map: &Map<String, Value>,
        commands: &dyn CommandFactory,
        depth: usize,
    ) -> QueryResult<Node> {
        let mut composed: Option<Command> = None;
        let mut operands = Fields::with_capacity(map.len());

        for (key, raw) in map {
            let operand = self.value(raw, depth)?;
            if let Some(op) = CompareOp::from_key(key) {
                let expr = build(commands, op, operand.clone());
                composed = Some(match composed {
                    None => expr,
                    Some(acc) => acc.and(expr),
                });
            }
            operands.push((key.clone(), operand));
        }

        Ok(match composed {
            Some(expr) => Node::Command(expr),
            // Nothing recognized: keep the object as data.
            None => Node::Object(operands),
        })
    }

    fn fields(&self, map: &Map<String, Value>, depth: usize) -> QueryResult<Fields> {
        map.iter()
            .map(|(k, v)| Ok((k.clone(), self.value(v, depth)?)))
            .collect()
    }
}

fn build(commands: &dyn CommandFactory, op: CompareOp, operand: Node) -> Command {
    match op {
        CompareOp::Eq => commands.eq(operand),
        CompareOp::Neq => commands.neq(operand),
        CompareOp::Gt => commands.gt(operand),
        CompareOp::Gte => commands.gte(operand),
        CompareOp::Lt => commands.lt(operand),
        CompareOp::Lte => commands.lte(operand),
        CompareOp::In => commands.in_list(operand),
        CompareOp::Nin => commands.nin(operand),
        CompareOp::All => commands.all(operand),
    }
}

/// Normalize `value` with the default depth limit
pub fn normalize(value: &Value, commands: Option<&dyn CommandFactory>) -> QueryResult<Node> {
    Normalizer::new(commands).normalize(value)
}
