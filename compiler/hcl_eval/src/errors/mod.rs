//! Error types for evaluation and stanza dispatch.
//!
//! # Structured Error Categories
//!
//! `EvalErrorKind` carries typed data for each failure. Factory functions
//! (e.g. `unresolved_reference()`) are the construction API; stanza
//! implementations return [`stanza_error`] for their own failures.
//!
//! # Error Codes
//!
//! - E1001–E1009: lookup failures (reference, function, stanza)
//! - E1010–E1019: type and call-signature failures
//! - E1020–E1029: scope discipline (redeclaration, nesting)
//! - E1030: stanza-raised failures

use std::fmt;

use hcl_ir::Span;

/// Result of evaluation. Defaults to producing a [`Value`](crate::Value).
pub type EvalResult<T = crate::Value> = Result<T, EvalError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalErrorKind {
    /// An identifier did not resolve in the scope chain.
    #[error("unresolved reference `{name}`")]
    UnresolvedReference { name: String },

    /// A call named a function absent from the function tables.
    #[error("unknown function `{name}`")]
    UnknownFunction { name: String },

    /// Operand types outside an operator's domain.
    #[error("{operation} expects {expected}, got {got}")]
    TypeMismatch {
        operation: String,
        expected: String,
        got: String,
    },

    /// A call violated the callee's declared signature.
    #[error("{function}(): {message}")]
    ArityOrTypeError { function: String, message: String },

    /// No stanza is bound to a block type.
    #[error("unknown block type `{name}`")]
    UnknownStanza { name: String },

    /// A write-once name was declared twice in one scope.
    #[error("`{name}` is already declared in this scope")]
    Redeclaration { name: String },

    /// Raised by a stanza hook.
    #[error("{message}")]
    StanzaError { message: String },

    /// `/` or `%` with a zero divisor.
    #[error("division by zero")]
    DivisionByZero,

    /// Block nesting went past the configured limit.
    #[error("block nesting exceeds the limit of {limit}")]
    NestingTooDeep { limit: usize },
}

impl EvalErrorKind {
    /// Stable code for this kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnresolvedReference { .. } => "E1001",
            Self::UnknownFunction { .. } => "E1002",
            Self::UnknownStanza { .. } => "E1003",
            Self::TypeMismatch { .. } => "E1010",
            Self::ArityOrTypeError { .. } => "E1011",
            Self::DivisionByZero => "E1012",
            Self::Redeclaration { .. } => "E1020",
            Self::NestingTooDeep { .. } => "E1021",
            Self::StanzaError { .. } => "E1030",
        }
    }

    /// Concise label for the primary span.
    pub fn primary_label(&self) -> &'static str {
        match self {
            Self::UnresolvedReference { .. } => "not found in this scope",
            Self::UnknownFunction { .. } => "no such function",
            Self::UnknownStanza { .. } => "no stanza bound to this block type",
            Self::TypeMismatch { .. } => "type mismatch",
            Self::ArityOrTypeError { .. } => "bad arguments",
            Self::DivisionByZero => "zero divisor",
            Self::Redeclaration { .. } => "declared again here",
            Self::NestingTooDeep { .. } => "nested too deeply",
            Self::StanzaError { .. } => "rejected by block handler",
        }
    }
}

/// Additional context note attached to an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalNote {
    pub message: String,
    pub span: Option<Span>,
}

impl EvalNote {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span: Some(span),
        }
    }
}

/// Evaluation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    /// Structured error category.
    pub kind: EvalErrorKind,
    /// Source location of the offending node.
    pub span: Option<Span>,
    /// Path of blocks enclosing the failure, outermost first (`project > hello`).
    pub block_path: Option<String>,
    /// Secondary information.
    pub notes: Vec<EvalNote>,
    /// Failures that happened while handling this one (e.g. a failing `close`).
    pub causes: Vec<EvalError>,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind) -> Self {
        Self {
            kind,
            span: None,
            block_path: None,
            notes: Vec::new(),
            causes: Vec::new(),
        }
    }

    /// Human-readable message without location.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    pub fn code(&self) -> &'static str {
        self.kind.error_code()
    }

    /// Set the span unconditionally.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Set the span unless a more precise one is already present.
    #[must_use]
    pub fn or_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    /// Record the enclosing block path unless an inner block already did.
    #[must_use]
    pub fn in_block(mut self, path: &str) -> Self {
        if self.block_path.is_none() {
            self.block_path = Some(path.to_string());
        }
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: EvalNote) -> Self {
        self.notes.push(note);
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: EvalError) -> Self {
        self.causes.push(cause);
        self
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);
        write!(f, "{pad}error[{}]: {}", self.code(), self.kind)?;
        if let Some(span) = self.span {
            write!(f, " at {span}")?;
        }
        if let Some(path) = &self.block_path {
            write!(f, " (in {path})")?;
        }
        for note in &self.notes {
            write!(f, "\n{pad}  note: {}", note.message)?;
            if let Some(span) = note.span {
                write!(f, " at {span}")?;
            }
        }
        for cause in &self.causes {
            writeln!(f)?;
            cause.render(f, indent + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<EvalErrorKind> for EvalError {
    fn from(kind: EvalErrorKind) -> Self {
        EvalError::new(kind)
    }
}

/// Ordered, non-empty collection of the errors of one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalErrors(Vec<EvalError>);

impl EvalErrors {
    /// `None` when there is nothing to report.
    pub fn from_vec(errors: Vec<EvalError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(EvalErrors(errors))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EvalError> {
        self.0.iter()
    }

    pub fn first(&self) -> &EvalError {
        &self.0[0]
    }

    pub fn into_vec(self) -> Vec<EvalError> {
        self.0
    }
}

impl fmt::Display for EvalErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.0.len();
        writeln!(
            f,
            "evaluation failed with {count} error{}",
            if count == 1 { "" } else { "s" }
        )?;
        for error in &self.0 {
            writeln!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalErrors {}

impl IntoIterator for EvalErrors {
    type Item = EvalError;
    type IntoIter = std::vec::IntoIter<EvalError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a EvalErrors {
    type Item = &'a EvalError;
    type IntoIter = std::slice::Iter<'a, EvalError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// Factory functions

pub fn unresolved_reference(name: &str) -> EvalError {
    EvalError::new(EvalErrorKind::UnresolvedReference {
        name: name.to_string(),
    })
}

pub fn unknown_function(name: &str) -> EvalError {
    EvalError::new(EvalErrorKind::UnknownFunction {
        name: name.to_string(),
    })
}

pub fn type_mismatch(
    operation: impl Into<String>,
    expected: impl Into<String>,
    got: impl Into<String>,
) -> EvalError {
    EvalError::new(EvalErrorKind::TypeMismatch {
        operation: operation.into(),
        expected: expected.into(),
        got: got.into(),
    })
}

pub fn arity_or_type_error(function: &str, message: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::ArityOrTypeError {
        function: function.to_string(),
        message: message.into(),
    })
}

pub fn unknown_stanza(name: &str) -> EvalError {
    EvalError::new(EvalErrorKind::UnknownStanza {
        name: name.to_string(),
    })
}

pub fn redeclaration(name: &str) -> EvalError {
    EvalError::new(EvalErrorKind::Redeclaration {
        name: name.to_string(),
    })
}

/// Failure raised by a stanza hook: missing required attribute, bad value, etc.
pub fn stanza_error(message: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::StanzaError {
        message: message.into(),
    })
}

pub fn division_by_zero() -> EvalError {
    EvalError::new(EvalErrorKind::DivisionByZero)
}

pub fn nesting_too_deep(limit: usize) -> EvalError {
    EvalError::new(EvalErrorKind::NestingTooDeep { limit })
}
