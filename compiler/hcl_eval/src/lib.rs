//! HCL Eval - scoped evaluator and stanza interpreter for HCL documents.
//!
//! This crate walks an already-parsed [`hcl_ir::Module`] once, resolving
//! expressions to values and dispatching each block to the stanza bound to its
//! type.
//!
//! # Architecture
//!
//! - [`Value`]: immutable runtime values
//! - [`Context`]: scope chain holding attributes, functions and stanza bindings
//! - [`Evaluator`]: expression-to-value resolution, read-only on the context
//! - [`Interpreter`]: the open/attributes/nested/close block protocol, error
//!   collection and run policy
//! - [`Stanza`] / [`StanzaOpener`]: block handlers supplied by the embedding
//!
//! # Usage
//!
//! ```text
//! let records = StanzaRecords::new();
//! let root = Context::new();
//! root.bind_stanza("greet", StanzaSchema::new().required("name").opener("greet", records.clone()))?;
//! Interpreter::new().execute(&module, &root)?;
//! assert_eq!(records.values("name"), [Value::string("a"), Value::string("b")]);
//! ```

mod context;
pub mod errors;
mod evaluator;
mod function;
mod functions;
pub mod interpreter;
mod stack;
pub mod stanza;
mod value;

use std::sync::Once;

pub use context::{Context, Mutability};
pub use errors::{EvalError, EvalErrorKind, EvalErrors, EvalNote, EvalResult};
pub use evaluator::{evaluate_binary, evaluate_unary, Evaluator};
pub use function::{FunctionRef, ParamType, Signature};
pub use functions::{builtin_functions, register_builtin_functions};
pub use interpreter::{
    BlockFilter, BlockOutcome, BlockState, ErrorPolicy, Interpreter, InterpreterBuilder, RunReport,
};
pub use stack::ensure_sufficient_stack;
pub use stanza::{
    register_builtin_stanzas, CommonStanza, MatrixStanza, NestedBlock, Stanza, StanzaOpener,
    StanzaRecord, StanzaRecords, StanzaSchema,
};
pub use value::{Heap, Value};

/// Initialize tracing based on the `RUST_LOG` environment variable.
///
/// Call once at startup. Does nothing when `RUST_LOG` is unset, and later
/// calls are no-ops.
///
/// ```bash
/// RUST_LOG=hcl_eval=debug my-tool config.hcl
/// RUST_LOG=hcl_eval::interpreter=trace my-tool config.hcl
/// ```
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();

    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

#[cfg(test)]
mod tests;
