//! AST node types.
//!
//! The tree is produced by an external parser and is immutable while it is
//! evaluated. Every node carries a [`Span`](crate::Span).

mod expr;
mod operators;
mod stmt;

pub use expr::{Expr, ExprKind, Literal, ObjectEntry, TemplatePart};
pub use operators::{BinaryOp, UnaryOp};
pub use stmt::{Attribute, Block, Module, Stmt};
