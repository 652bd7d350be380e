//! Token payloads.
//!
//! A token's "color" is a dynamically typed [`Value`]. Values are produced by
//! the expression evaluator when arc inscriptions run and compared by the
//! engine when input arcs withdraw tokens.

use std::fmt;

use itertools::Itertools;

/// Dynamically typed token payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Value {
    /// The payload of a plain, colorless token.
    #[default]
    Unit,
    Bool(bool),
    Int(i64),
    Str(String),
    /// A compound color, always a single token.
    Tuple(Vec<Value>),
    /// A collection of colors; an execute inscription evaluating to a list
    /// produces one token per element.
    List(Vec<Value>),
}

impl Value {
    /// Name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
        }
    }

    /// Renders the value as an expression literal that evaluates back to it.
    ///
    /// Unlike [`Display`](fmt::Display), strings are quoted and escaped.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Unit => "()".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Str(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            Value::Tuple(items) if items.len() == 1 => format!("({},)", items[0].to_literal()),
            Value::Tuple(items) => format!("({})", items.iter().map(Value::to_literal).join(", ")),
            Value::List(items) => format!("[{}]", items.iter().map(Value::to_literal).join(", ")),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
            Value::Tuple(items) => write!(f, "({})", items.iter().join(", ")),
            Value::List(items) => write!(f, "[{}]", items.iter().join(", ")),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}
