//! Block execution driver.
//!
//! The interpreter walks a module's blocks in document order and runs each one
//! through its stanza:
//!
//! 1. resolve the stanza bound to the block type in the enclosing scope;
//! 2. evaluate the labels in the enclosing scope and open a stanza instance;
//! 3. `open` it to obtain the body scope;
//! 4. walk the body in document order: evaluate each attribute and hand it to
//!    `attribute`, and run each nested block the same way with the body scope
//!    as its parent. A failing attribute skips the rest of the body;
//! 5. `close`, whenever step 3 succeeded;
//! 6. drop the body scope.
//!
//! In best-effort mode a failed block is recorded and its siblings still run.
//! In fail-fast mode the first failure unwinds to the caller, closing every
//! block opened along the way.

mod builder;
mod policy;
mod report;

use hcl_ir::{Block, Expr, Module, Stmt};
use tracing::{debug, trace};

use crate::errors::{nesting_too_deep, EvalError, EvalErrors};
use crate::stack::ensure_sufficient_stack;
use crate::stanza::{NestedBlock, Stanza};
use crate::{Context, EvalResult, Evaluator, Value};

pub use builder::InterpreterBuilder;
pub use policy::{BlockFilter, ErrorPolicy};
pub use report::{BlockOutcome, BlockState, RunReport};

/// Drives stanzas over a document tree.
#[derive(Debug)]
pub struct Interpreter {
    evaluator: Evaluator,
    policy: ErrorPolicy,
    filter: BlockFilter,
    max_nesting: Option<usize>,
    /// Blocks currently being executed.
    nesting: usize,
    errors: Vec<EvalError>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Best-effort interpreter with no filters or limits.
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    pub fn evaluator(&self) -> Evaluator {
        self.evaluator
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Errors recorded so far in the current run.
    pub fn errors(&self) -> &[EvalError] {
        &self.errors
    }

    /// Evaluate an expression with this interpreter's evaluator.
    pub fn evaluate(&self, expr: &Expr, ctx: &Context<'_>) -> EvalResult {
        self.evaluator.evaluate(expr, ctx)
    }

    /// Run `module` against `root` and report per-block outcomes and every
    /// recorded error.
    ///
    /// Top-level attributes are declared into `root`, so later blocks can read
    /// them. In fail-fast mode the run stops at the first failure.
    #[tracing::instrument(level = "debug", skip_all, fields(statements = module.body.len()))]
    pub fn run(&mut self, module: &Module, root: &Context<'_>) -> RunReport {
        self.errors.clear();
        self.nesting = 0;
        let mut outcomes = Vec::new();

        for stmt in &module.body {
            match stmt {
                Stmt::Attribute(attr) => {
                    let declared = self
                        .evaluator
                        .evaluate(&attr.value, root)
                        .and_then(|value| root.declare(attr.key.as_str(), value))
                        .map_err(|err| err.or_span(attr.span));
                    if let Err(err) = declared {
                        self.record(err);
                        if self.policy.aborts_on_error() {
                            break;
                        }
                    }
                }
                Stmt::Block(block) => {
                    if !self.filter.allows(&block.name) {
                        debug!(block = %block.name, "skipping filtered block");
                        continue;
                    }
                    let before = self.errors.len();
                    let result = self.exec_block(block, root);
                    let failed = result.is_err();
                    if let Err(err) = result {
                        self.record(err);
                    }
                    let state = if failed || self.errors.len() > before {
                        BlockState::Errored
                    } else {
                        BlockState::Closed
                    };
                    outcomes.push(BlockOutcome {
                        name: block.name.clone(),
                        span: block.span,
                        state,
                    });
                    if failed && self.policy.aborts_on_error() {
                        break;
                    }
                }
            }
        }

        debug!(
            blocks = outcomes.len(),
            errors = self.errors.len(),
            "run finished"
        );
        RunReport {
            outcomes,
            errors: std::mem::take(&mut self.errors),
        }
    }

    /// Run `module` and collapse the report into success or the ordered list
    /// of errors.
    pub fn execute(&mut self, module: &Module, root: &Context<'_>) -> Result<(), EvalErrors> {
        self.run(module, root).into_result()
    }

    /// Run one block with `parent` as its enclosing scope, applying the error
    /// policy.
    ///
    /// Stanzas that handle nested blocks themselves call this. In best-effort
    /// mode a failure is recorded and `Ok` is returned; in fail-fast mode it is
    /// returned. A block removed by the filter is skipped.
    pub fn execute_block(&mut self, block: &Block, parent: &Context<'_>) -> EvalResult<()> {
        if !self.filter.allows(&block.name) {
            debug!(block = %block.name, "skipping filtered block");
            return Ok(());
        }
        match self.exec_block(block, parent) {
            Ok(()) => Ok(()),
            Err(err) if self.policy.collects_errors() => {
                self.record(err);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn record(&mut self, err: EvalError) {
        debug!(code = err.code(), error = %err.kind, "recording error");
        self.errors.push(err);
    }

    #[tracing::instrument(level = "debug", skip_all, fields(block = %block.name))]
    fn exec_block(&mut self, block: &Block, parent: &Context<'_>) -> EvalResult<()> {
        if let Some(limit) = self.max_nesting {
            if self.nesting >= limit {
                return Err(tag(nesting_too_deep(limit).with_span(block.span), parent));
            }
        }
        self.nesting += 1;
        let result = ensure_sufficient_stack(|| self.run_protocol(block, parent));
        self.nesting -= 1;
        result
    }

    fn run_protocol(&mut self, block: &Block, parent: &Context<'_>) -> EvalResult<()> {
        let mut state = BlockState::Unopened;

        let mut stanza = match self.open_stanza(block, parent) {
            Ok(stanza) => stanza,
            Err(err) => {
                advance(block, &mut state, BlockState::Errored);
                return Err(tag(err, parent));
            }
        };
        let body = match stanza.open(parent, block) {
            Ok(body) => body,
            Err(err) => {
                advance(block, &mut state, BlockState::Errored);
                return Err(tag(err.or_span(block.span), parent));
            }
        };
        body.enter_block(&block.name);
        advance(block, &mut state, BlockState::Opened);

        let outcome = self.exec_body(stanza.as_mut(), block, &body, &mut state);
        let closed = stanza.close(&body).map_err(|err| err.or_span(block.span));

        let result = match (outcome, closed) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(err), Ok(())) | (Ok(()), Err(err)) => Err(err),
            (Err(err), Err(close_err)) => Err(err.with_cause(close_err)),
        };
        let result = result.map_err(|err| tag(err, &body));
        let terminal = if result.is_ok() {
            BlockState::Closed
        } else {
            BlockState::Errored
        };
        advance(block, &mut state, terminal);
        result
    }

    /// Resolve the stanza for `block` and create its instance from the
    /// evaluated labels.
    fn open_stanza(&self, block: &Block, parent: &Context<'_>) -> EvalResult<Box<dyn Stanza>> {
        let opener = parent
            .resolve_stanza(&block.name)
            .map_err(|err| err.or_span(block.span))?;
        let labels = block
            .labels
            .iter()
            .map(|label| self.evaluator.evaluate(label, parent))
            .collect::<EvalResult<Vec<Value>>>()?;
        opener.open(&labels).map_err(|err| err.or_span(block.span))
    }

    fn exec_body(
        &mut self,
        stanza: &mut dyn Stanza,
        block: &Block,
        body: &Context<'_>,
        state: &mut BlockState,
    ) -> EvalResult<()> {
        let last_attribute = block
            .body
            .iter()
            .rposition(|stmt| matches!(stmt, Stmt::Attribute(_)));
        if last_attribute.is_none() {
            advance(block, state, BlockState::AttributesProcessed);
        }

        for (index, stmt) in block.body.iter().enumerate() {
            match stmt {
                Stmt::Attribute(attr) => {
                    let value = self.evaluator.evaluate(&attr.value, body)?;
                    stanza
                        .attribute(body, &attr.key, value)
                        .map_err(|err| err.or_span(attr.span))?;
                    if last_attribute == Some(index) {
                        advance(block, state, BlockState::AttributesProcessed);
                    }
                }
                Stmt::Block(nested) => {
                    if !self.filter.allows(&nested.name) {
                        debug!(block = %nested.name, "skipping filtered block");
                        continue;
                    }
                    let dispatch = stanza
                        .nested_block(body, nested, self)
                        .map_err(|err| err.or_span(nested.span))?;
                    match dispatch {
                        NestedBlock::Dispatch => self.execute_block(nested, body)?,
                        NestedBlock::Handled => trace!(block = %nested.name, "handled by stanza"),
                    }
                }
            }
        }
        Ok(())
    }
}

fn advance(block: &Block, state: &mut BlockState, next: BlockState) {
    trace!(block = %block.name, from = %state, to = %next, "block state");
    *state = next;
}

/// Attach the block path of `ctx` unless the error already has one.
fn tag(err: EvalError, ctx: &Context<'_>) -> EvalError {
    let path = ctx.block_path();
    if path.is_empty() {
        err
    } else {
        err.in_block(&path)
    }
}

#[cfg(test)]
mod tests;
