//! Scope chain for evaluation.
//!
//! A [`Context`] is one scope in a singly-linked chain. Each scope owns three
//! separate namespaces (attributes, functions, stanza bindings) and borrows its
//! parent, so a child can never outlive the scope it was created from and the
//! chain cannot form a cycle. Lookup walks outward; nothing is copied.
//!
//! Scopes are mutated through `&self`: a child holds a shared borrow of its
//! parent, and stanzas occasionally write into an enclosing scope (e.g. a
//! named matrix exporting its rows) while that borrow is live.

use std::cell::RefCell;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::errors::{redeclaration, unknown_function, unknown_stanza, unresolved_reference};
use crate::{EvalResult, FunctionRef, StanzaOpener, Value};

/// Whether a declared attribute may be declared again in the same scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutability {
    /// Write-once. A second declaration in the same scope is a `Redeclaration`.
    Immutable,
    /// A later declaration in the same scope replaces it (stanza defaults).
    Mutable,
}

impl Mutability {
    #[inline]
    pub fn is_mutable(self) -> bool {
        matches!(self, Mutability::Mutable)
    }
}

#[derive(Clone, Debug)]
struct Binding {
    value: Value,
    mutability: Mutability,
}

#[derive(Default)]
struct Scope {
    attributes: FxHashMap<String, Binding>,
    functions: FxHashMap<String, FunctionRef>,
    stanzas: FxHashMap<String, StanzaOpener>,
    /// Type name of the block whose body this scope holds, if any.
    block: Option<String>,
}

/// One scope in the lookup chain.
pub struct Context<'p> {
    parent: Option<&'p Context<'p>>,
    scope: RefCell<Scope>,
    depth: usize,
}

impl Context<'static> {
    /// Create a root context with empty tables.
    pub fn new() -> Self {
        Context {
            parent: None,
            scope: RefCell::new(Scope::default()),
            depth: 0,
        }
    }
}

impl Default for Context<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'p> Context<'p> {
    /// Create an empty scope whose parent is `self`. O(1).
    pub fn child(&self) -> Context<'_> {
        Context {
            parent: Some(self),
            scope: RefCell::new(Scope::default()),
            depth: self.depth + 1,
        }
    }

    pub fn parent(&self) -> Option<&'p Context<'p>> {
        self.parent
    }

    /// Number of ancestors; the root is at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// This scope followed by its ancestors, innermost first.
    fn ancestors(&self) -> impl Iterator<Item = &Context<'_>> {
        let mut next: Option<&Context<'_>> = Some(self);
        std::iter::from_fn(move || {
            let current = next?;
            next = current.parent;
            Some(current)
        })
    }

    fn find<T>(&self, mut probe: impl FnMut(&Scope) -> Option<T>) -> Option<T> {
        self.ancestors().find_map(|ctx| probe(&ctx.scope.borrow()))
    }

    // Attributes

    /// Declare a write-once attribute in this scope.
    ///
    /// Shadowing a binding of an ancestor scope is allowed.
    pub fn declare(&self, name: impl Into<String>, value: Value) -> EvalResult<()> {
        self.declare_with(name, value, Mutability::Immutable)
    }

    /// Declare an attribute that a later declaration in this scope may replace.
    pub fn declare_mutable(&self, name: impl Into<String>, value: Value) -> EvalResult<()> {
        self.declare_with(name, value, Mutability::Mutable)
    }

    pub fn declare_with(
        &self,
        name: impl Into<String>,
        value: Value,
        mutability: Mutability,
    ) -> EvalResult<()> {
        let name = name.into();
        let mut scope = self.scope.borrow_mut();
        if let Some(existing) = scope.attributes.get(&name) {
            if !existing.mutability.is_mutable() {
                return Err(redeclaration(&name));
            }
        }
        scope.attributes.insert(name, Binding { value, mutability });
        Ok(())
    }

    /// Resolve `name` in this scope, then in each ancestor.
    pub fn lookup(&self, name: &str) -> EvalResult {
        self.find(|scope| scope.attributes.get(name).map(|b| b.value.clone()))
            .ok_or_else(|| unresolved_reference(name))
    }

    /// Resolve `name` in this scope only.
    pub fn lookup_local(&self, name: &str) -> Option<Value> {
        self.scope
            .borrow()
            .attributes
            .get(name)
            .map(|b| b.value.clone())
    }

    /// Attribute names declared in this scope, sorted.
    pub fn local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scope.borrow().attributes.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    // Functions

    /// Register a callable in this scope's function table.
    pub fn register_function(&self, name: impl Into<String>, function: FunctionRef) -> EvalResult<()> {
        let name = name.into();
        let mut scope = self.scope.borrow_mut();
        if scope.functions.contains_key(&name) {
            return Err(redeclaration(&name));
        }
        scope.functions.insert(name, function);
        Ok(())
    }

    pub fn lookup_function(&self, name: &str) -> EvalResult<FunctionRef> {
        self.find(|scope| scope.functions.get(name).cloned())
            .ok_or_else(|| unknown_function(name))
    }

    // Stanzas

    /// Bind a block type to a stanza opener in this scope.
    ///
    /// A binding in a child scope shadows the parent's binding for the same
    /// block type, which is how a stanza restricts a block type to its body.
    pub fn bind_stanza(&self, type_name: impl Into<String>, opener: StanzaOpener) -> EvalResult<()> {
        let type_name = type_name.into();
        let mut scope = self.scope.borrow_mut();
        if scope.stanzas.contains_key(&type_name) {
            return Err(redeclaration(&type_name));
        }
        scope.stanzas.insert(type_name, opener);
        Ok(())
    }

    pub fn resolve_stanza(&self, type_name: &str) -> EvalResult<StanzaOpener> {
        self.find(|scope| scope.stanzas.get(type_name).cloned())
            .ok_or_else(|| unknown_stanza(type_name))
    }

    // Block bookkeeping

    /// Mark this scope as the body of a block of type `name`.
    pub(crate) fn enter_block(&self, name: &str) {
        self.scope.borrow_mut().block = Some(name.to_string());
    }

    /// Names of the enclosing blocks, outermost first, joined with ` > `.
    /// Empty outside any block.
    pub fn block_path(&self) -> String {
        let mut names: Vec<String> = self
            .ancestors()
            .filter_map(|ctx| ctx.scope.borrow().block.clone())
            .collect();
        names.reverse();
        names.join(" > ")
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = self.scope.borrow();
        let mut functions: Vec<&String> = scope.functions.keys().collect();
        functions.sort_unstable();
        let mut stanzas: Vec<&String> = scope.stanzas.keys().collect();
        stanzas.sort_unstable();
        f.debug_struct("Context")
            .field("depth", &self.depth)
            .field("block", &scope.block)
            .field("attributes", &self.local_names())
            .field("functions", &functions)
            .field("stanzas", &stanzas)
            .finish()
    }
}
