//! Expression evaluation.
//!
//! The [`Evaluator`] maps an expression and a [`Context`] to a [`Value`]. It
//! reads the context and never writes to it; declaring names is the job of the
//! interpreter and of stanzas.
//!
//! # Evaluation order
//!
//! - Operands, call arguments, tuple elements and object entries are evaluated
//!   eagerly, left to right.
//! - `&&` and `||` short-circuit: the right operand is not evaluated when the
//!   left one decides the result. Both operands must be `Bool`.
//! - A conditional evaluates its condition, then exactly one branch. The
//!   condition is tested for truthiness.
//! - Object literals keep the last value written for a duplicated key.

mod operators;

use std::collections::BTreeMap;

use hcl_ir::{BinaryOp, Expr, ExprKind, ObjectEntry, TemplatePart};
use smallvec::SmallVec;

use crate::errors::{type_mismatch, unresolved_reference};
use crate::stack::ensure_sufficient_stack;
use crate::{Context, EvalResult, Value};

pub use operators::{evaluate_binary, evaluate_unary};

/// Stateless expression evaluator.
#[derive(Copy, Clone, Debug, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Evaluator
    }

    /// Evaluate `expr` against `ctx`.
    ///
    /// Errors carry the span of the innermost node that failed.
    #[tracing::instrument(level = "trace", skip_all, fields(kind = expr.kind.name()))]
    pub fn evaluate(&self, expr: &Expr, ctx: &Context<'_>) -> EvalResult {
        self.eval(expr, ctx)
    }

    fn eval(&self, expr: &Expr, ctx: &Context<'_>) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_kind(&expr.kind, ctx))
            .map_err(|err| err.or_span(expr.span))
    }

    fn eval_kind(&self, kind: &ExprKind, ctx: &Context<'_>) -> EvalResult {
        match kind {
            ExprKind::Literal(literal) => Ok(Value::from_literal(literal)),
            ExprKind::Ident(name) => ctx.lookup(name),
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand, ctx)?;
                evaluate_unary(&value, *op)
            }
            ExprKind::Binary { op, left, right } if op.is_short_circuit() => {
                self.eval_logical(*op, left, right, ctx)
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval(left, ctx)?;
                let right = self.eval(right, ctx)?;
                evaluate_binary(&left, &right, *op)
            }
            ExprKind::Call { name, args } => self.eval_call(name, args, ctx),
            ExprKind::Tuple(elements) => {
                let items = elements
                    .iter()
                    .map(|element| self.eval(element, ctx))
                    .collect::<EvalResult<Vec<_>>>()?;
                Ok(Value::list(items))
            }
            ExprKind::Object(entries) => self.eval_object(entries, ctx),
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond, ctx)?.is_truthy() {
                    self.eval(then, ctx)
                } else {
                    self.eval(otherwise, ctx)
                }
            }
            ExprKind::GetAttr { on, name } => {
                let target = self.eval(on, ctx)?;
                match target.as_map() {
                    Some(map) => map
                        .get(name)
                        .cloned()
                        .ok_or_else(|| unresolved_reference(name)),
                    None => Err(type_mismatch(
                        format!("attribute access `.{name}`"),
                        "map",
                        target.type_name(),
                    )),
                }
            }
            ExprKind::Template(parts) => self.eval_template(parts, ctx),
        }
    }

    fn eval_logical(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        ctx: &Context<'_>,
    ) -> EvalResult {
        let lhs = self.expect_bool(op, left, ctx)?;
        match (op, lhs) {
            (BinaryOp::And, false) => Ok(Value::Bool(false)),
            (BinaryOp::Or, true) => Ok(Value::Bool(true)),
            _ => self.expect_bool(op, right, ctx).map(Value::Bool),
        }
    }

    fn expect_bool(&self, op: BinaryOp, operand: &Expr, ctx: &Context<'_>) -> EvalResult<bool> {
        match self.eval(operand, ctx)? {
            Value::Bool(b) => Ok(b),
            other => Err(type_mismatch(
                operators::operator_name(op.as_symbol()),
                operators::expected_operands(op),
                other.type_name(),
            )
            .with_span(operand.span)),
        }
    }

    fn eval_call(&self, name: &str, args: &[Expr], ctx: &Context<'_>) -> EvalResult {
        let function = ctx.lookup_function(name)?;
        let args = args
            .iter()
            .map(|arg| self.eval(arg, ctx))
            .collect::<EvalResult<SmallVec<[Value; 4]>>>()?;
        function.call(&args)
    }

    fn eval_object(&self, entries: &[ObjectEntry], ctx: &Context<'_>) -> EvalResult {
        let mut map = BTreeMap::new();
        for entry in entries {
            let key = match self.eval(&entry.key, ctx)? {
                Value::Str(key) => key.to_string(),
                other => {
                    return Err(type_mismatch("object key", "string", other.type_name())
                        .with_span(entry.key.span))
                }
            };
            let value = self.eval(&entry.value, ctx)?;
            map.insert(key, value);
        }
        Ok(Value::from_map(map))
    }

    fn eval_template(&self, parts: &[TemplatePart], ctx: &Context<'_>) -> EvalResult {
        let mut out = String::new();
        for part in parts {
            match part {
                TemplatePart::Text(text) => out.push_str(text),
                TemplatePart::Interp(expr) => match self.eval(expr, ctx)? {
                    value @ (Value::Str(_) | Value::Number(_) | Value::Bool(_)) => {
                        out.push_str(&value.render_plain());
                    }
                    other => {
                        return Err(type_mismatch(
                            "template interpolation",
                            "string, number or bool",
                            other.type_name(),
                        )
                        .with_span(expr.span))
                    }
                },
            }
        }
        Ok(Value::string(out))
    }
}
