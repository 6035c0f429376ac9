//! Runtime values produced by the evaluator.
//!
//! # Factory Methods
//!
//! Composite payloads live behind [`Heap`], whose constructor is private to
//! this module. Build values through the factories:
//!
//! ```text
//! let s = Value::string("hello");
//! let list = Value::list(vec![Value::number(1.0)]);
//! let map = Value::map([("a".to_string(), Value::Bool(true))]);
//! ```
//!
//! # Truthiness
//!
//! Only `Null` and `Bool(false)` are falsy. Zero, the empty string and empty
//! collections are truthy.
//!
//! # Equality
//!
//! Equality is structural. Numbers compare as IEEE doubles except that NaN
//! equals NaN, so every value is equal to itself.

mod heap;

use std::collections::BTreeMap;
use std::fmt;

use hcl_ir::Literal;

use crate::function::FunctionRef;

pub use heap::Heap;

/// Runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    /// All numbers are IEEE 754 doubles.
    Number(f64),
    Str(Heap<String>),
    List(Heap<Vec<Value>>),
    /// Keys are kept sorted so rendering is stable; entry order carries no meaning.
    Map(Heap<BTreeMap<String, Value>>),
    /// A callable, compared by identity.
    Function(FunctionRef),
}

impl Value {
    #[inline]
    pub fn number(n: f64) -> Self {
        Value::Number(n)
    }

    #[inline]
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Heap::new(s.into()))
    }

    #[inline]
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Heap::new(items))
    }

    /// Build a map. Later duplicates of a key replace earlier ones.
    pub fn map(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Value::Map(Heap::new(entries.into_iter().collect()))
    }

    #[inline]
    pub fn from_map(map: BTreeMap<String, Value>) -> Self {
        Value::Map(Heap::new(map))
    }

    #[inline]
    pub fn function(function: FunctionRef) -> Self {
        Value::Function(function)
    }

    /// Convert a literal from the document tree.
    pub fn from_literal(literal: &Literal) -> Self {
        match literal {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::string(s.as_str()),
        }
    }

    /// Name of the variant, used in type errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Function(_) => "function",
        }
    }

    /// `Null` and `Bool(false)` are falsy; everything else is truthy.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(&**map),
            _ => None,
        }
    }

    /// Render for user-facing text: strings without quotes, everything else
    /// as [`Display`](fmt::Display).
    pub fn render_plain(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{:?}", s.as_str()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                write!(f, "}}")
            }
            Value::Function(function) => write!(f, "<function {}>", function.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}
