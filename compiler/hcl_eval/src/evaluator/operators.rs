//! Operator implementations for the evaluator.
//!
//! Direct enum dispatch on the operand variants. The operator set is fixed, so
//! pattern matching gives exhaustiveness checking for free.
//!
//! `&&` and `||` are handled here only once both operands are known; the
//! short-circuit itself lives in the evaluator.

use hcl_ir::{BinaryOp, UnaryOp};

use crate::errors::{division_by_zero, type_mismatch, EvalError};
use crate::{EvalResult, Value};

/// Evaluate a binary operation on two already-evaluated operands.
pub fn evaluate_binary(left: &Value, right: &Value, op: BinaryOp) -> EvalResult {
    match op {
        BinaryOp::Eq => return Ok(Value::Bool(left == right)),
        BinaryOp::NotEq => return Ok(Value::Bool(left != right)),
        _ => {}
    }
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => eval_number_binary(*a, *b, op),
        (Value::Str(a), Value::Str(b)) => eval_string_binary(a, b, op),
        (Value::Bool(a), Value::Bool(b)) => eval_bool_binary(*a, *b, op),
        _ => Err(binary_mismatch(op, left, right)),
    }
}

/// Evaluate a unary operation.
pub fn evaluate_unary(value: &Value, op: UnaryOp) -> EvalResult {
    match (value, op) {
        (Value::Number(n), UnaryOp::Neg) => Ok(Value::Number(-n)),
        (Value::Bool(b), UnaryOp::Not) => Ok(Value::Bool(!b)),
        (_, UnaryOp::Neg) => Err(type_mismatch(
            operator_name(op.as_symbol()),
            "number",
            value.type_name(),
        )),
        (_, UnaryOp::Not) => Err(type_mismatch(
            operator_name(op.as_symbol()),
            "bool",
            value.type_name(),
        )),
    }
}

fn eval_number_binary(a: f64, b: f64, op: BinaryOp) -> EvalResult {
    let value = match op {
        BinaryOp::Add => Value::Number(a + b),
        BinaryOp::Sub => Value::Number(a - b),
        BinaryOp::Mul => Value::Number(a * b),
        BinaryOp::Div if b == 0.0 => return Err(division_by_zero()),
        BinaryOp::Div => Value::Number(a / b),
        BinaryOp::Mod if b == 0.0 => return Err(division_by_zero()),
        BinaryOp::Mod => Value::Number(a % b),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::LtEq => Value::Bool(a <= b),
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::GtEq => Value::Bool(a >= b),
        BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::And | BinaryOp::Or => {
            return Err(binary_mismatch(op, &Value::Number(a), &Value::Number(b)))
        }
    };
    Ok(value)
}

fn eval_string_binary(a: &str, b: &str, op: BinaryOp) -> EvalResult {
    match op {
        BinaryOp::Add => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            Ok(Value::string(joined))
        }
        BinaryOp::Lt => Ok(Value::Bool(a < b)),
        BinaryOp::LtEq => Ok(Value::Bool(a <= b)),
        BinaryOp::Gt => Ok(Value::Bool(a > b)),
        BinaryOp::GtEq => Ok(Value::Bool(a >= b)),
        _ => Err(binary_mismatch(op, &Value::string(a), &Value::string(b))),
    }
}

fn eval_bool_binary(a: bool, b: bool, op: BinaryOp) -> EvalResult {
    match op {
        BinaryOp::And => Ok(Value::Bool(a && b)),
        BinaryOp::Or => Ok(Value::Bool(a || b)),
        _ => Err(binary_mismatch(op, &Value::Bool(a), &Value::Bool(b))),
    }
}

/// Operand types each binary operator accepts.
pub(super) fn expected_operands(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "two numbers or two strings",
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => "two numbers",
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            "two numbers or two strings"
        }
        BinaryOp::And | BinaryOp::Or => "bool operands",
        BinaryOp::Eq | BinaryOp::NotEq => "any operands",
    }
}

pub(super) fn operator_name(symbol: &str) -> String {
    format!("operator `{symbol}`")
}

#[cold]
fn binary_mismatch(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    type_mismatch(
        operator_name(op.as_symbol()),
        expected_operands(op),
        format!("{} and {}", left.type_name(), right.type_name()),
    )
}
