//! `InterpreterBuilder` for creating Interpreter instances with various configurations.

use super::policy::{BlockFilter, ErrorPolicy};
use super::Interpreter;
use crate::Evaluator;

/// Builder for [`Interpreter`].
///
/// The defaults are best-effort error handling, no block filter, and no
/// nesting limit:
///
/// ```text
/// let interpreter = Interpreter::builder()
///     .fail_fast()
///     .disable_blocks(["experimental"])
///     .max_nesting(16)
///     .build();
/// ```
#[derive(Clone, Debug, Default)]
pub struct InterpreterBuilder {
    policy: ErrorPolicy,
    filter: BlockFilter,
    max_nesting: Option<usize>,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shorthand for `policy(ErrorPolicy::FailFast)`.
    #[must_use]
    pub fn fail_fast(self) -> Self {
        self.policy(ErrorPolicy::FailFast)
    }

    /// Only run blocks of these types. Calls accumulate.
    #[must_use]
    pub fn enable_blocks<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter.enable(names);
        self
    }

    /// Skip blocks of these types. Calls accumulate.
    #[must_use]
    pub fn disable_blocks<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter.disable(names);
        self
    }

    /// Fail blocks nested deeper than `depth` levels; top-level blocks are
    /// level 1.
    #[must_use]
    pub fn max_nesting(mut self, depth: usize) -> Self {
        self.max_nesting = Some(depth);
        self
    }

    pub fn build(self) -> Interpreter {
        Interpreter {
            evaluator: Evaluator::new(),
            policy: self.policy,
            filter: self.filter,
            max_nesting: self.max_nesting,
            nesting: 0,
            errors: Vec::new(),
        }
    }
}
