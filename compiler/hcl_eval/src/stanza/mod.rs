//! Block handlers.
//!
//! A [`Stanza`] decides what a block's attributes and nested blocks mean. The
//! embedding binds a [`StanzaOpener`] per block type into a [`Context`]; the
//! interpreter asks the opener for a fresh stanza for every block it runs and
//! drops that instance once the block is closed.
//!
//! # Protocol
//!
//! ```text
//! open ──► attribute* ──► nested_block* ──► close
//!   │                                         ▲
//!   └── on failure nothing else runs          └── always runs once open succeeded
//! ```

mod common;
mod matrix;

use std::fmt;
use std::rc::Rc;

use hcl_ir::Block;

use crate::errors::stanza_error;
use crate::{Context, EvalResult, Interpreter, Value};

pub use common::{CommonStanza, StanzaRecord, StanzaRecords, StanzaSchema};
pub use matrix::MatrixStanza;

/// What the interpreter should do with a nested block after
/// [`Stanza::nested_block`] returns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NestedBlock {
    /// Resolve the block's type and run it through the normal protocol.
    Dispatch,
    /// The stanza already handled the block.
    Handled,
}

/// Capability set of a block handler.
///
/// Every hook has a default, so a stanza only implements what it cares about.
/// Hooks report their own failures with [`stanza_error`]; the interpreter
/// attaches the span of the offending node.
pub trait Stanza {
    /// Enter the block and produce the scope its body runs in.
    ///
    /// Nested block types and functions that only make sense inside this
    /// block are registered into the returned scope.
    fn open<'c>(&mut self, ctx: &'c Context<'_>, _block: &Block) -> EvalResult<Context<'c>> {
        Ok(ctx.child())
    }

    /// Receive one evaluated attribute. Attributes arrive in document order.
    fn attribute(&mut self, _ctx: &Context<'_>, name: &str, _value: Value) -> EvalResult<()> {
        Err(stanza_error(format!("unexpected attribute `{name}`")))
    }

    /// Called before a nested block is dispatched.
    ///
    /// Returning [`NestedBlock::Handled`] lets a stanza run the block itself,
    /// usually through [`Interpreter::execute_block`] with a scope of its own.
    fn nested_block(
        &mut self,
        _ctx: &Context<'_>,
        _block: &Block,
        _interpreter: &mut Interpreter,
    ) -> EvalResult<NestedBlock> {
        Ok(NestedBlock::Dispatch)
    }

    /// Leave the block. Runs exactly once after a successful `open`, even if
    /// the body failed.
    fn close(&mut self, _ctx: &Context<'_>) -> EvalResult<()> {
        Ok(())
    }
}

type OpenFn = dyn Fn(&[Value]) -> EvalResult<Box<dyn Stanza>>;

/// Factory bound to a block type. Receives the block's evaluated labels.
#[derive(Clone)]
pub struct StanzaOpener(Rc<OpenFn>);

impl StanzaOpener {
    pub fn new<S, F>(open: F) -> Self
    where
        S: Stanza + 'static,
        F: Fn(&[Value]) -> EvalResult<S> + 'static,
    {
        StanzaOpener(Rc::new(move |labels: &[Value]| {
            open(labels).map(|stanza| Box::new(stanza) as Box<dyn Stanza>)
        }))
    }

    /// Opener for a stanza that takes no labels.
    pub fn unlabeled<S, F>(type_name: &'static str, make: F) -> Self
    where
        S: Stanza + 'static,
        F: Fn() -> S + 'static,
    {
        Self::new(move |labels: &[Value]| {
            if labels.is_empty() {
                Ok(make())
            } else {
                Err(stanza_error(format!(
                    "`{type_name}` blocks take no labels, got {}",
                    labels.len()
                )))
            }
        })
    }

    pub fn from_boxed<F>(open: F) -> Self
    where
        F: Fn(&[Value]) -> EvalResult<Box<dyn Stanza>> + 'static,
    {
        StanzaOpener(Rc::new(open))
    }

    /// Create the stanza instance for one block.
    pub fn open(&self, labels: &[Value]) -> EvalResult<Box<dyn Stanza>> {
        (self.0)(labels)
    }
}

impl fmt::Debug for StanzaOpener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StanzaOpener")
    }
}

/// Bind the built-in block types (`matrix`) into `ctx`.
pub fn register_builtin_stanzas(ctx: &Context<'_>) -> EvalResult<()> {
    ctx.bind_stanza("matrix", MatrixStanza::opener())
}
