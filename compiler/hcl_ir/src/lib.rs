//! HCL IR - document tree types for the stanza evaluator.
//!
//! This crate contains the read-only input of the evaluation core:
//! - Spans for source locations
//! - AST nodes (Module, Block, Attribute, Expr)
//! - Operators
//!
//! Parsing text into this tree happens upstream; nothing here reads source.

pub mod ast;
mod span;

pub use ast::{
    Attribute, BinaryOp, Block, Expr, ExprKind, Literal, Module, ObjectEntry, Stmt, TemplatePart,
    UnaryOp,
};
pub use span::{Span, SpanError, Spanned};
