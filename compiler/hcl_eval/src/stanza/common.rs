//! Schema-driven stanza for the common case.
//!
//! Most block types only need to accept a known set of attributes, apply a few
//! defaults, and hand the result to the embedding. [`StanzaSchema`] describes
//! that; [`CommonStanza`] enforces it and appends a [`StanzaRecord`] per
//! closed block to a caller-owned [`StanzaRecords`] sink.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use hcl_ir::Block;

use super::{Stanza, StanzaOpener};
use crate::errors::stanza_error;
use crate::{Context, EvalResult, FunctionRef, Value};

#[derive(Clone, Debug, Default)]
struct AttributeSpec {
    required: bool,
    default: Option<Value>,
}

/// Declarative description of a block type.
#[derive(Clone, Debug, Default)]
pub struct StanzaSchema {
    attributes: BTreeMap<String, AttributeSpec>,
    nested: Vec<(String, StanzaOpener)>,
    functions: Vec<FunctionRef>,
    labels: Option<usize>,
}

impl StanzaSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept an optional attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.entry(name.into()).or_default();
        self
    }

    /// Accept an attribute that must be present by `close`.
    #[must_use]
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.attributes.entry(name.into()).or_default().required = true;
        self
    }

    /// Accept an attribute, using `value` when the block omits it.
    ///
    /// The default is visible to the block body before the attribute is seen,
    /// and the block's own declaration replaces it.
    #[must_use]
    pub fn with_default(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.entry(name.into()).or_default().default = Some(value);
        self
    }

    /// Bind a block type that is only valid inside this one.
    #[must_use]
    pub fn nested(mut self, type_name: impl Into<String>, opener: StanzaOpener) -> Self {
        self.nested.push((type_name.into(), opener));
        self
    }

    /// Expose a function to the block body.
    #[must_use]
    pub fn function(mut self, function: FunctionRef) -> Self {
        self.functions.push(function);
        self
    }

    /// Require exactly `count` labels. Any number is accepted otherwise.
    #[must_use]
    pub fn labels(mut self, count: usize) -> Self {
        self.labels = Some(count);
        self
    }

    /// Build the opener for `type_name`, recording closed blocks into `sink`.
    pub fn opener(self, type_name: impl Into<String>, sink: StanzaRecords) -> StanzaOpener {
        let type_name = type_name.into();
        let schema = Rc::new(self);
        StanzaOpener::new(move |labels: &[Value]| {
            if let Some(expected) = schema.labels {
                if labels.len() != expected {
                    return Err(stanza_error(format!(
                        "`{type_name}` expects {expected} label(s), got {}",
                        labels.len()
                    )));
                }
            }
            Ok(CommonStanza {
                type_name: type_name.clone(),
                schema: Rc::clone(&schema),
                labels: labels.to_vec(),
                attributes: BTreeMap::new(),
                sink: sink.clone(),
            })
        })
    }
}

/// What one closed block looked like.
#[derive(Clone, Debug, PartialEq)]
pub struct StanzaRecord {
    /// Block type name.
    pub block: String,
    pub labels: Vec<Value>,
    /// Attributes set by the block, plus defaults for the ones it omitted.
    pub attributes: BTreeMap<String, Value>,
}

/// Caller-owned, append-only list of records. Clones share storage.
#[derive(Clone, Debug, Default)]
pub struct StanzaRecords(Rc<RefCell<Vec<StanzaRecord>>>);

impl StanzaRecords {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, record: StanzaRecord) {
        self.0.borrow_mut().push(record);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Copy of every record, in close order.
    pub fn snapshot(&self) -> Vec<StanzaRecord> {
        self.0.borrow().clone()
    }

    /// Value of `attribute` in each record that has it, in close order.
    pub fn values(&self, attribute: &str) -> Vec<Value> {
        self.0
            .borrow()
            .iter()
            .filter_map(|record| record.attributes.get(attribute).cloned())
            .collect()
    }
}

/// Stanza driven by a [`StanzaSchema`].
pub struct CommonStanza {
    type_name: String,
    schema: Rc<StanzaSchema>,
    labels: Vec<Value>,
    attributes: BTreeMap<String, Value>,
    sink: StanzaRecords,
}

impl Stanza for CommonStanza {
    fn open<'c>(&mut self, ctx: &'c Context<'_>, _block: &Block) -> EvalResult<Context<'c>> {
        let body = ctx.child();
        for (type_name, opener) in &self.schema.nested {
            body.bind_stanza(type_name.as_str(), opener.clone())?;
        }
        for function in &self.schema.functions {
            body.register_function(function.name(), function.clone())?;
        }
        for (name, spec) in &self.schema.attributes {
            if let Some(default) = &spec.default {
                body.declare_mutable(name.as_str(), default.clone())?;
            }
        }
        Ok(body)
    }

    fn attribute(&mut self, ctx: &Context<'_>, name: &str, value: Value) -> EvalResult<()> {
        if !self.schema.attributes.contains_key(name) {
            return Err(stanza_error(format!(
                "`{}` does not accept attribute `{name}`",
                self.type_name
            )));
        }
        ctx.declare(name, value.clone())?;
        self.attributes.insert(name.to_string(), value);
        Ok(())
    }

    fn close(&mut self, _ctx: &Context<'_>) -> EvalResult<()> {
        for (name, spec) in &self.schema.attributes {
            if self.attributes.contains_key(name) {
                continue;
            }
            if let Some(default) = &spec.default {
                self.attributes.insert(name.clone(), default.clone());
            } else if spec.required {
                return Err(stanza_error(format!(
                    "`{}` is missing required attribute `{name}`",
                    self.type_name
                )));
            }
        }
        self.sink.push(StanzaRecord {
            block: self.type_name.clone(),
            labels: std::mem::take(&mut self.labels),
            attributes: std::mem::take(&mut self.attributes),
        });
        Ok(())
    }
}
