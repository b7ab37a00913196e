//! Predicate compilation and evaluation
//!
//! A predicate document is compiled once into a [`Filter`] tree and then
//! evaluated against any number of documents. Regex operands are compiled
//! at this point too, so a scan pays for them once.
//!
//! Evaluation is total: malformed pieces compile to [`Filter::Never`] or
//! [`Condition::Never`] instead of failing.

use std::cmp::Ordering;

use regex::Regex;
use tracing::warn;

use crate::document::{Document, Value};

/// Logical combinator keys
pub const AND: &str = "$and";
pub const OR: &str = "$or";
pub const NOT: &str = "$not";

/// A compiled predicate
#[derive(Debug, Clone)]
pub enum Filter {
    /// Every child must match (also the shape of a top-level predicate)
    And(Vec<Filter>),
    /// At least one child must match
    Or(Vec<Filter>),
    /// The child must not match
    Not(Box<Filter>),
    /// A field resolved by [`resolve_field`] must satisfy every condition
    Field {
        key: String,
        conditions: Vec<Condition>,
    },
    /// Malformed input; matches nothing
    Never,
}

/// A single operator applied to a resolved field value
#[derive(Debug, Clone)]
pub enum Condition {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Regex(Regex),
    /// Unknown operator or operand of the wrong shape
    Never,
}

impl Filter {
    /// Compile a predicate document
    pub fn compile(predicate: &Document) -> Filter {
        Filter::And(
            predicate
                .iter()
                .map(|(key, operand)| Self::compile_clause(key, operand))
                .collect(),
        )
    }

    /// Evaluate against a document
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::And(children) => children.iter().all(|c| c.matches(doc)),
            Filter::Or(children) => children.iter().any(|c| c.matches(doc)),
            Filter::Not(child) => !child.matches(doc),
            Filter::Field { key, conditions } => match resolve_field(doc, key) {
                Some(value) => conditions.iter().all(|c| c.matches(value)),
                None => false,
            },
            Filter::Never => false,
        }
    }

    fn compile_clause(key: &str, operand: &Value) -> Filter {
        match key {
            AND => match Self::compile_list(operand) {
                Some(children) => Filter::And(children),
                None => Filter::Never,
            },
            OR => match Self::compile_list(operand) {
                Some(children) => Filter::Or(children),
                None => Filter::Never,
            },
            NOT => match operand {
                Value::Map(map) => Filter::Not(Box::new(Self::compile(&Document::from(map.clone())))),
                _ => Filter::Never,
            },
            _ => Filter::Field {
                key: key.to_string(),
                conditions: Self::compile_conditions(operand),
            },
        }
    }

    /// Compile the operand of `$and`/`$or`: a list of predicate documents
    fn compile_list(operand: &Value) -> Option<Vec<Filter>> {
        let items = operand.as_list()?;
        Some(
            items
                .iter()
                .map(|item| match item {
                    Value::Map(map) => Self::compile(&Document::from(map.clone())),
                    _ => Filter::Never,
                })
                .collect(),
        )
    }

    fn compile_conditions(operand: &Value) -> Vec<Condition> {
        match operand {
            Value::Map(ops) if is_operator_map(operand) => ops
                .iter()
                .map(|(op, arg)| Condition::compile(op, arg))
                .collect(),
            literal => vec![Condition::Eq(literal.clone())],
        }
    }
}

impl Condition {
    fn compile(op: &str, arg: &Value) -> Condition {
        match op {
            "$eq" => Condition::Eq(arg.clone()),
            "$ne" => Condition::Ne(arg.clone()),
            "$gt" => Condition::Gt(arg.clone()),
            "$gte" => Condition::Gte(arg.clone()),
            "$lt" => Condition::Lt(arg.clone()),
            "$lte" => Condition::Lte(arg.clone()),
            "$in" => match arg {
                Value::List(items) => Condition::In(items.clone()),
                _ => Condition::Never,
            },
            "$nin" => match arg {
                Value::List(items) => Condition::Nin(items.clone()),
                _ => Condition::Never,
            },
            "$regex" => match arg.as_str().map(Regex::new) {
                Some(Ok(re)) => Condition::Regex(re),
                Some(Err(err)) => {
                    warn!(pattern = ?arg, error = %err, "invalid $regex pattern");
                    Condition::Never
                }
                None => Condition::Never,
            },
            _ => Condition::Never,
        }
    }

    /// Apply to a resolved value
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Condition::Eq(expected) => value == expected,
            Condition::Ne(expected) => value != expected,
            Condition::Gt(bound) => compare_numbers(value, bound) == Ordering::Greater,
            Condition::Gte(bound) => compare_numbers(value, bound) != Ordering::Less,
            Condition::Lt(bound) => compare_numbers(value, bound) == Ordering::Less,
            Condition::Lte(bound) => compare_numbers(value, bound) != Ordering::Greater,
            Condition::In(items) => items.contains(value),
            Condition::Nin(items) => !items.contains(value),
            Condition::Regex(re) => value.as_str().map(|s| re.is_match(s)).unwrap_or(false),
            Condition::Never => false,
        }
    }
}

/// Evaluate a predicate document against a document
pub fn matches(doc: &Document, predicate: &Document) -> bool {
    Filter::compile(predicate).matches(doc)
}

/// Resolve a filter key against a document
///
/// Tries the dot path first. Failing that, the first top-level field (in key
/// order) whose name contains `key` as a substring is used.
pub fn resolve_field<'a>(doc: &'a Document, key: &str) -> Option<&'a Value> {
    doc.get_path(key).or_else(|| {
        doc.iter()
            .find(|(name, _)| name.contains(key))
            .map(|(_, value)| value)
    })
}

/// Numeric-only comparator
///
/// Two numbers compare by value. Every other pairing, including NaN, is
/// reported as `Equal`: `$gt`/`$lt` never match such operands while
/// `$gte`/`$lte` always do.
pub fn compare_numbers(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

/// A non-empty map operand whose keys all start with `$` is an operator map;
/// any other operand (`{}` included) is a literal compared with `$eq`
pub fn is_operator_map(operand: &Value) -> bool {
    match operand {
        Value::Map(map) => !map.is_empty() && map.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

/// Literal equality value of a top-level predicate key, if it has one
pub fn literal_operand(operand: &Value) -> Option<&Value> {
    if is_operator_map(operand) {
        None
    } else {
        Some(operand)
    }
}
