//! Expression Types
//!
//! Expressions are owned trees (`Box<Expr>` children). The evaluator only ever
//! reads them, so nothing here has interior mutability.

use std::fmt;

use super::operators::{BinaryOp, UnaryOp};
use crate::{Span, Spanned};

/// Expression node.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

impl Spanned for Expr {
    fn span(&self) -> Span {
        self.span
    }
}

/// Literal constants.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

/// One segment of a string template: `"${name} (${where})"`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TemplatePart {
    /// Literal text between interpolations.
    Text(String),
    /// An interpolated `${...}` expression.
    Interp(Expr),
}

/// A `key = value` entry of an object literal.
///
/// Keys are expressions; they must evaluate to strings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectEntry {
    pub key: Expr,
    pub value: Expr,
}

/// Expression variants.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExprKind {
    /// `null`, `true`, `1.5`, `"text"`
    Literal(Literal),

    /// Variable reference: `name`
    Ident(String),

    /// `-x`, `!x`
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// `left op right`
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `name(args...)`
    Call { name: String, args: Vec<Expr> },

    /// `[a, b, c]`
    Tuple(Vec<Expr>),

    /// `{ key = value, ... }`
    Object(Vec<ObjectEntry>),

    /// `cond ? then : otherwise`
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },

    /// `on.name`
    GetAttr { on: Box<Expr>, name: String },

    /// `"text ${expr} text"`
    Template(Vec<TemplatePart>),
}

impl ExprKind {
    /// Short name of the variant, for diagnostics and logging.
    pub const fn name(&self) -> &'static str {
        match self {
            ExprKind::Literal(_) => "literal",
            ExprKind::Ident(_) => "identifier",
            ExprKind::Unary { .. } => "unary operation",
            ExprKind::Binary { .. } => "binary operation",
            ExprKind::Call { .. } => "function call",
            ExprKind::Tuple(_) => "tuple",
            ExprKind::Object(_) => "object",
            ExprKind::Conditional { .. } => "conditional",
            ExprKind::GetAttr { .. } => "attribute access",
            ExprKind::Template(_) => "template",
        }
    }
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    /// Replace the span of a programmatically built node.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn null() -> Self {
        Self::new(ExprKind::Literal(Literal::Null), Span::DUMMY)
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ExprKind::Literal(Literal::Bool(value)), Span::DUMMY)
    }

    pub fn number(value: f64) -> Self {
        Self::new(ExprKind::Literal(Literal::Number(value)), Span::DUMMY)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ExprKind::Literal(Literal::String(value.into())), Span::DUMMY)
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Ident(name.into()), Span::DUMMY)
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            Span::DUMMY,
        )
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            Span::DUMMY,
        )
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(
            ExprKind::Call {
                name: name.into(),
                args,
            },
            Span::DUMMY,
        )
    }

    pub fn tuple(elements: Vec<Expr>) -> Self {
        Self::new(ExprKind::Tuple(elements), Span::DUMMY)
    }

    /// Object literal with string-literal keys.
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Expr)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(key, value)| ObjectEntry {
                key: Expr::string(key),
                value,
            })
            .collect();
        Self::new(ExprKind::Object(entries), Span::DUMMY)
    }

    /// Object literal with computed keys.
    pub fn object_entries(entries: Vec<ObjectEntry>) -> Self {
        Self::new(ExprKind::Object(entries), Span::DUMMY)
    }

    pub fn conditional(cond: Expr, then: Expr, otherwise: Expr) -> Self {
        Self::new(
            ExprKind::Conditional {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            Span::DUMMY,
        )
    }

    pub fn get_attr(on: Expr, name: impl Into<String>) -> Self {
        Self::new(
            ExprKind::GetAttr {
                on: Box::new(on),
                name: name.into(),
            },
            Span::DUMMY,
        )
    }

    pub fn template(parts: Vec<TemplatePart>) -> Self {
        Self::new(ExprKind::Template(parts), Span::DUMMY)
    }

    /// Direct sub-expressions, in evaluation order.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Literal(_) | ExprKind::Ident(_) => Vec::new(),
            ExprKind::Unary { operand, .. } => vec![&**operand],
            ExprKind::Binary { left, right, .. } => vec![&**left, &**right],
            ExprKind::Call { args, .. } | ExprKind::Tuple(args) => args.iter().collect(),
            ExprKind::Object(entries) => entries
                .iter()
                .flat_map(|entry| [&entry.key, &entry.value])
                .collect(),
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => vec![&**cond, &**then, &**otherwise],
            ExprKind::GetAttr { on, .. } => vec![&**on],
            ExprKind::Template(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    TemplatePart::Interp(expr) => Some(expr),
                    TemplatePart::Text(_) => None,
                })
                .collect(),
        }
    }
}
