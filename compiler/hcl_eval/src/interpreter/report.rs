//! Per-block state and the result of a run.

use std::fmt;

use hcl_ir::Span;

use crate::errors::{EvalError, EvalErrors};

/// Where a block is in the open/attributes/nested/close protocol.
///
/// ```text
/// Unopened ──► Opened ──► AttributesProcessed ──► Closed
///     │           │                │
///     └───────────┴────────────────┴──────────► Errored
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlockState {
    Unopened,
    Opened,
    /// The last attribute of the body was accepted. Nested blocks that
    /// follow it in the document may still be running.
    AttributesProcessed,
    /// Terminal: every step succeeded.
    Closed,
    /// Absorbing: something in the block or its subtree failed.
    Errored,
}

impl BlockState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unopened => "unopened",
            Self::Opened => "opened",
            Self::AttributesProcessed => "attributes processed",
            Self::Closed => "closed",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Final state of one top-level block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockOutcome {
    pub name: String,
    pub span: Span,
    pub state: BlockState,
}

/// What a run produced: one outcome per executed top-level block, and every
/// recorded error in the order it happened.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub outcomes: Vec<BlockOutcome>,
    pub errors: Vec<EvalError>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of top-level blocks that ended in `state`.
    pub fn count(&self, state: BlockState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }

    pub fn into_result(self) -> Result<(), EvalErrors> {
        match EvalErrors::from_vec(self.errors) {
            None => Ok(()),
            Some(errors) => Err(errors),
        }
    }
}
