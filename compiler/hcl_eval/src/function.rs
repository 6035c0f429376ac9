//! Callables registered into a context's function table.
//!
//! Every callable declares a [`Signature`]; [`FunctionRef::call`] checks it
//! before running the body, so native code only ever sees well-typed input.

use std::fmt;
use std::rc::Rc;

use crate::errors::{arity_or_type_error, EvalResult};
use crate::Value;

/// Accepted type of one parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParamType {
    Any,
    Bool,
    Number,
    String,
    List,
    Map,
    Function,
}

impl ParamType {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ParamType::Any => true,
            ParamType::Bool => matches!(value, Value::Bool(_)),
            ParamType::Number => matches!(value, Value::Number(_)),
            ParamType::String => matches!(value, Value::Str(_)),
            ParamType::List => matches!(value, Value::List(_)),
            ParamType::Map => matches!(value, Value::Map(_)),
            ParamType::Function => matches!(value, Value::Function(_)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ParamType::Any => "any",
            ParamType::Bool => "bool",
            ParamType::Number => "number",
            ParamType::String => "string",
            ParamType::List => "list",
            ParamType::Map => "map",
            ParamType::Function => "function",
        }
    }
}

/// Declared argument shape: fixed positional parameters, optionally followed
/// by any number of variadic arguments of one type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    params: Vec<ParamType>,
    variadic: Option<ParamType>,
}

impl Signature {
    pub fn new(params: impl IntoIterator<Item = ParamType>) -> Self {
        Signature {
            params: params.into_iter().collect(),
            variadic: None,
        }
    }

    /// Accept extra trailing arguments of `ty`.
    #[must_use]
    pub fn variadic(mut self, ty: ParamType) -> Self {
        self.variadic = Some(ty);
        self
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    /// Check `args` against this signature on behalf of `function`.
    pub fn check(&self, function: &str, args: &[Value]) -> EvalResult<()> {
        let fixed = self.params.len();
        let arity_ok = match self.variadic {
            Some(_) => args.len() >= fixed,
            None => args.len() == fixed,
        };
        if !arity_ok {
            let arg_word = if fixed == 1 { "argument" } else { "arguments" };
            let expected = if self.variadic.is_some() {
                format!("at least {fixed} {arg_word}")
            } else {
                format!("{fixed} {arg_word}")
            };
            return Err(arity_or_type_error(
                function,
                format!("expected {expected}, got {}", args.len()),
            ));
        }

        for (index, arg) in args.iter().enumerate() {
            let ty = self
                .params
                .get(index)
                .copied()
                .or(self.variadic)
                .unwrap_or(ParamType::Any);
            if !ty.accepts(arg) {
                return Err(arity_or_type_error(
                    function,
                    format!(
                        "argument {} must be {}, got {}",
                        index + 1,
                        ty.name(),
                        arg.type_name()
                    ),
                ));
            }
        }
        Ok(())
    }
}

type NativeFn = dyn Fn(&[Value]) -> EvalResult;

struct FunctionDef {
    name: String,
    signature: Signature,
    body: Box<NativeFn>,
}

/// Shared handle to a callable. Cheap to clone; equality is identity.
#[derive(Clone)]
pub struct FunctionRef(Rc<FunctionDef>);

impl FunctionRef {
    pub fn new<F>(name: impl Into<String>, signature: Signature, body: F) -> Self
    where
        F: Fn(&[Value]) -> EvalResult + 'static,
    {
        FunctionRef(Rc::new(FunctionDef {
            name: name.into(),
            signature,
            body: Box::new(body),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn signature(&self) -> &Signature {
        &self.0.signature
    }

    /// Check the signature, then run the body.
    pub fn call(&self, args: &[Value]) -> EvalResult {
        self.0.signature.check(&self.0.name, args)?;
        (self.0.body)(args)
    }
}

impl PartialEq for FunctionRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRef")
            .field("name", &self.0.name)
            .field("signature", &self.0.signature)
            .finish_non_exhaustive()
    }
}
