//! Built-in functions (`tostring`, `length`, `join`, ...).
//!
//! Each function declares its [`Signature`]; arity and parameter types are
//! checked by [`FunctionRef::call`] before the body runs, so the bodies only
//! match on shapes the signature admits.

use crate::errors::{arity_or_type_error, EvalResult};
use crate::{Context, FunctionRef, ParamType, Signature, Value};

/// Register every built-in function into `ctx`.
pub fn register_builtin_functions(ctx: &Context<'_>) -> EvalResult<()> {
    for function in builtin_functions() {
        let name = function.name().to_string();
        ctx.register_function(name, function)?;
    }
    Ok(())
}

/// The built-in functions, unregistered.
pub fn builtin_functions() -> Vec<FunctionRef> {
    use ParamType::{Any, List, Map, String};

    vec![
        FunctionRef::new("tostring", Signature::new([Any]), function_tostring),
        FunctionRef::new("tonumber", Signature::new([Any]), function_tonumber),
        FunctionRef::new("length", Signature::new([Any]), function_length),
        FunctionRef::new("upper", Signature::new([String]), function_upper),
        FunctionRef::new("lower", Signature::new([String]), function_lower),
        FunctionRef::new("join", Signature::new([String, List]), function_join),
        FunctionRef::new("keys", Signature::new([Map]), function_keys),
        FunctionRef::new("coalesce", Signature::new([]).variadic(Any), function_coalesce),
    ]
}

/// Render a scalar as a string. Strings pass through unchanged.
fn function_tostring(args: &[Value]) -> EvalResult {
    match args {
        [value @ Value::Str(_)] => Ok(value.clone()),
        [value @ (Value::Number(_) | Value::Bool(_))] => Ok(Value::string(value.render_plain())),
        [other] => Err(arity_or_type_error(
            "tostring",
            format!("cannot convert {} to string", other.type_name()),
        )),
        _ => Err(arity_or_type_error("tostring", "expected 1 argument")),
    }
}

/// Parse a string as a number. Numbers pass through unchanged.
fn function_tonumber(args: &[Value]) -> EvalResult {
    match args {
        [value @ Value::Number(_)] => Ok(value.clone()),
        [Value::Str(s)] => s
            .trim()
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|_| {
                arity_or_type_error(
                    "tonumber",
                    format!("cannot parse {:?} as number", s.as_str()),
                )
            }),
        [other] => Err(arity_or_type_error(
            "tonumber",
            format!("cannot convert {} to number", other.type_name()),
        )),
        _ => Err(arity_or_type_error("tonumber", "expected 1 argument")),
    }
}

/// Element count of a list or map, character count of a string.
fn function_length(args: &[Value]) -> EvalResult {
    let len = match args {
        [Value::List(items)] => items.len(),
        [Value::Map(map)] => map.len(),
        [Value::Str(s)] => s.chars().count(),
        [other] => {
            return Err(arity_or_type_error(
                "length",
                format!("cannot take the length of {}", other.type_name()),
            ))
        }
        _ => return Err(arity_or_type_error("length", "expected 1 argument")),
    };
    u32::try_from(len)
        .map(|n| Value::Number(f64::from(n)))
        .map_err(|_| arity_or_type_error("length", format!("length {len} out of range")))
}

fn function_upper(args: &[Value]) -> EvalResult {
    match args {
        [Value::Str(s)] => Ok(Value::string(s.to_uppercase())),
        _ => Err(arity_or_type_error("upper", "expected a string")),
    }
}

fn function_lower(args: &[Value]) -> EvalResult {
    match args {
        [Value::Str(s)] => Ok(Value::string(s.to_lowercase())),
        _ => Err(arity_or_type_error("lower", "expected a string")),
    }
}

/// Join a list of strings (or numbers and bools) with a separator.
fn function_join(args: &[Value]) -> EvalResult {
    let [Value::Str(sep), Value::List(items)] = args else {
        return Err(arity_or_type_error("join", "expected a separator and a list"));
    };
    let mut parts = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match item {
            Value::Str(_) | Value::Number(_) | Value::Bool(_) => parts.push(item.render_plain()),
            other => {
                return Err(arity_or_type_error(
                    "join",
                    format!("element {} is {}, expected a scalar", index + 1, other.type_name()),
                ))
            }
        }
    }
    Ok(Value::string(parts.join(sep.as_str())))
}

/// Sorted keys of a map.
fn function_keys(args: &[Value]) -> EvalResult {
    match args {
        [Value::Map(map)] => Ok(Value::list(map.keys().map(Value::string).collect())),
        _ => Err(arity_or_type_error("keys", "expected a map")),
    }
}

/// First argument that is not null, or null.
fn function_coalesce(args: &[Value]) -> EvalResult {
    Ok(args
        .iter()
        .find(|value| !value.is_null())
        .cloned()
        .unwrap_or(Value::Null))
}
