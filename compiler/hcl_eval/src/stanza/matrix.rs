//! The `matrix` block type.
//!
//! ```text
//! matrix "targets" {
//!   os   = ["linux", "macos"]
//!   arch = ["x86_64", "aarch64"]
//!
//!   build { name = "${os}-${arch}" }
//! }
//! ```
//!
//! Each attribute is a factor: a List contributes its elements, any other value
//! is a one-element factor. Every nested block runs once per combination of the
//! factors declared above it, in a scope that declares one variable per factor.
//! Combinations follow factor declaration order with the last factor varying
//! fastest. An empty factor means no combinations, so nested blocks do not run
//! at all.
//!
//! A labelled matrix declares its rows (a List of Maps) under the label in the
//! enclosing scope when it closes.

use std::collections::BTreeMap;

use hcl_ir::Block;
use tracing::debug;

use super::{NestedBlock, Stanza, StanzaOpener};
use crate::errors::{redeclaration, stanza_error};
use crate::{Context, EvalResult, Interpreter, Value};

#[derive(Debug, Default)]
pub struct MatrixStanza {
    id: Option<String>,
    factors: Vec<(String, Vec<Value>)>,
}

impl MatrixStanza {
    pub fn new(id: Option<String>) -> Self {
        MatrixStanza {
            id,
            factors: Vec::new(),
        }
    }

    /// Opener accepting at most one String label.
    pub fn opener() -> StanzaOpener {
        StanzaOpener::new(|labels: &[Value]| match labels {
            [] => Ok(MatrixStanza::new(None)),
            [Value::Str(id)] => Ok(MatrixStanza::new(Some(id.to_string()))),
            [other] => Err(stanza_error(format!(
                "matrix label must be a string, got {}",
                other.type_name()
            ))),
            _ => Err(stanza_error(format!(
                "matrix takes at most one label, got {}",
                labels.len()
            ))),
        })
    }

    /// Cartesian product of the factors, one map per combination.
    pub fn rows(&self) -> Vec<BTreeMap<String, Value>> {
        let mut rows = vec![BTreeMap::new()];
        for (name, values) in &self.factors {
            rows = rows
                .iter()
                .flat_map(|row| {
                    values.iter().map(move |value| {
                        let mut next = row.clone();
                        next.insert(name.clone(), value.clone());
                        next
                    })
                })
                .collect();
        }
        rows
    }
}

impl Stanza for MatrixStanza {
    fn attribute(&mut self, _ctx: &Context<'_>, name: &str, value: Value) -> EvalResult<()> {
        if self.factors.iter().any(|(factor, _)| factor == name) {
            return Err(redeclaration(name));
        }
        let values = match value {
            Value::List(items) => items.to_vec(),
            other => vec![other],
        };
        self.factors.push((name.to_string(), values));
        Ok(())
    }

    fn nested_block(
        &mut self,
        ctx: &Context<'_>,
        block: &Block,
        interpreter: &mut Interpreter,
    ) -> EvalResult<NestedBlock> {
        let rows = self.rows();
        debug!(block = %block.name, combinations = rows.len(), "expanding matrix");
        for row in rows {
            let scope = ctx.child();
            for (name, value) in row {
                scope.declare(name, value)?;
            }
            interpreter.execute_block(block, &scope)?;
        }
        Ok(NestedBlock::Handled)
    }

    fn close(&mut self, ctx: &Context<'_>) -> EvalResult<()> {
        let (Some(id), Some(enclosing)) = (&self.id, ctx.parent()) else {
            return Ok(());
        };
        let rows = self.rows().into_iter().map(Value::from_map).collect();
        enclosing.declare(id.as_str(), Value::list(rows))
    }
}
