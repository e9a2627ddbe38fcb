//! # Command Expressions
//!
//! Expressions understood by the document database's command layer, and the
//! factory that builds them. An expression never changes after construction;
//! composition always yields a new value.

use super::node::Node;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Equal
    Eq,
    /// Not equal
    Neq,
    /// Greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Less than
    Lt,
    /// Less than or equal
    Lte,
    /// Value is one of a list
    In,
    /// Value is none of a list
    Nin,
    /// Array field contains every listed value
    All,
}

impl CompareOp {
    /// Resolve a `$`-prefixed query key to its operator
    ///
    /// Unknown keys return `None`; callers skip them.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "$eq" => Some(CompareOp::Eq),
            "$neq" | "$ne" => Some(CompareOp::Neq),
            "$gt" => Some(CompareOp::Gt),
            "$gte" => Some(CompareOp::Gte),
            "$lt" => Some(CompareOp::Lt),
            "$lte" => Some(CompareOp::Lte),
            "$in" => Some(CompareOp::In),
            "$nin" => Some(CompareOp::Nin),
            "$all" => Some(CompareOp::All),
            _ => None,
        }
    }

    /// Canonical key used when rendering to wire JSON
    pub fn key(&self) -> &'static str {
        match self {
            CompareOp::Eq => "$eq",
            CompareOp::Neq => "$neq",
            CompareOp::Gt => "$gt",
            CompareOp::Gte => "$gte",
            CompareOp::Lt => "$lt",
            CompareOp::Lte => "$lte",
            CompareOp::In => "$in",
            CompareOp::Nin => "$nin",
            CompareOp::All => "$all",
        }
    }
}

/// Logical connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicOp {
    And,
    Or,
}

impl LogicOp {
    pub fn key(&self) -> &'static str {
        match self {
            LogicOp::And => "$and",
            LogicOp::Or => "$or",
        }
    }
}

/// An expression or replacement marker produced by a [`CommandFactory`]
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Field-level comparison against an operand
    Compare { op: CompareOp, operand: Box<Node> },

    /// Logical combination of sub-conditions
    Logic { op: LogicOp, operands: Vec<Node> },

    /// Replace the whole field with this value instead of merging into it
    Set(Box<Node>),
}

impl Command {
    /// Conjunction of `self` and `other`.
    ///
    /// A left-hand side that is already an AND absorbs the new member, so
    /// `a.and(b).and(c)` is a single three-way AND in construction order.
    pub fn and(self, other: Command) -> Command {
        match self {
            Command::Logic {
                op: LogicOp::And,
                mut operands,
            } => {
                operands.push(Node::Command(other));
                Command::Logic {
                    op: LogicOp::And,
                    operands,
                }
            }
            lhs => Command::Logic {
                op: LogicOp::And,
                operands: vec![Node::Command(lhs), Node::Command(other)],
            },
        }
    }

    /// Name of the outermost operator, as it appears on the wire
    pub fn operator_key(&self) -> &'static str {
        match self {
            Command::Compare { op, .. } => op.key(),
            Command::Logic { op, .. } => op.key(),
            Command::Set(_) => "$set",
        }
    }
}

/// Constructor capability exposed by a document database client
///
/// Every comparison funnels through [`CommandFactory::compare`], so a backend
/// that needs a different representation only overrides that one method
/// (plus `or`/`and`/`set` if its logical shapes differ).
pub trait CommandFactory: Send + Sync {
    /// Build a comparison expression
    fn compare(&self, op: CompareOp, operand: Node) -> Command {
        Command::Compare {
            op,
            operand: Box::new(operand),
        }
    }

    fn eq(&self, value: Node) -> Command {
        self.compare(CompareOp::Eq, value)
    }

    fn neq(&self, value: Node) -> Command {
        self.compare(CompareOp::Neq, value)
    }

    fn gt(&self, value: Node) -> Command {
        self.compare(CompareOp::Gt, value)
    }

    fn gte(&self, value: Node) -> Command {
        self.compare(CompareOp::Gte, value)
    }

    fn lt(&self, value: Node) -> Command {
        self.compare(CompareOp::Lt, value)
    }

    fn lte(&self, value: Node) -> Command {
        self.compare(CompareOp::Lte, value)
    }

    /// `in` is a keyword, hence the suffix
    fn in_list(&self, values: Node) -> Command {
        self.compare(CompareOp::In, values)
    }

    fn nin(&self, values: Node) -> Command {
        self.compare(CompareOp::Nin, values)
    }

    fn all(&self, values: Node) -> Command {
        self.compare(CompareOp::All, values)
    }

    /// Disjunction of normalized sub-conditions
    fn or(&self, operands: Vec<Node>) -> Command {
        Command::Logic {
            op: LogicOp::Or,
            operands,
        }
    }

    /// Conjunction of normalized sub-conditions
    fn and(&self, operands: Vec<Node>) -> Command {
        Command::Logic {
            op: LogicOp::And,
            operands,
        }
    }

    /// Whole-field replacement marker
    fn set(&self, value: Node) -> Command {
        Command::Set(Box::new(value))
    }
}

/// Factory producing the default command tree
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCommands;

impl CommandFactory for StandardCommands {}
