//! Statements: the structural part of a configuration document.

use super::expr::Expr;
use crate::{Span, Spanned};

/// `key = value`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    pub key: String,
    pub value: Expr,
    pub span: Span,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: Expr) -> Self {
        Attribute {
            key: key.into(),
            value,
            span: Span::DUMMY,
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl Spanned for Attribute {
    fn span(&self) -> Span {
        self.span
    }
}

/// `name "label"... { body }`
///
/// `name` is the block type that selects the stanza; labels are expressions
/// evaluated in the enclosing scope.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    pub name: String,
    pub labels: Vec<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn new(name: impl Into<String>) -> Self {
        Block {
            name: name.into(),
            labels: Vec::new(),
            body: Vec::new(),
            span: Span::DUMMY,
        }
    }

    /// Append a label expression.
    #[must_use]
    pub fn label(mut self, label: Expr) -> Self {
        self.labels.push(label);
        self
    }

    /// Append a `key = value` attribute to the body.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: Expr) -> Self {
        self.body.push(Stmt::Attribute(Attribute::new(key, value)));
        self
    }

    /// Append a nested block to the body.
    #[must_use]
    pub fn block(mut self, block: Block) -> Self {
        self.body.push(Stmt::Block(block));
        self
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Attributes of the body, in document order.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.body.iter().filter_map(|stmt| match stmt {
            Stmt::Attribute(attr) => Some(attr),
            Stmt::Block(_) => None,
        })
    }

    /// Nested blocks of the body, in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.body.iter().filter_map(|stmt| match stmt {
            Stmt::Block(block) => Some(block),
            Stmt::Attribute(_) => None,
        })
    }
}

impl Spanned for Block {
    fn span(&self) -> Span {
        self.span
    }
}

/// A body element.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stmt {
    Attribute(Attribute),
    Block(Block),
}

impl Spanned for Stmt {
    fn span(&self) -> Span {
        match self {
            Stmt::Attribute(attr) => attr.span,
            Stmt::Block(block) => block.span,
        }
    }
}

/// Root of a parsed configuration document.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Module {
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl Module {
    pub fn new(body: Vec<Stmt>) -> Self {
        Module {
            body,
            span: Span::DUMMY,
        }
    }

    /// Append a top-level block.
    #[must_use]
    pub fn block(mut self, block: Block) -> Self {
        self.body.push(Stmt::Block(block));
        self
    }

    /// Append a top-level attribute.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: Expr) -> Self {
        self.body.push(Stmt::Attribute(Attribute::new(key, value)));
        self
    }
}

impl Spanned for Module {
    fn span(&self) -> Span {
        self.span
    }
}
