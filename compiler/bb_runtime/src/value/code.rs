//! Code blocks: an instruction range plus the scope it was declared in.

use std::fmt;
use std::sync::{Arc, Weak};

use bb_ir::Symbol;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::Value;
use crate::errors::{metadata_redefined, missing_metadata, EvalResult};
use crate::program::Program;
use crate::scope::{Scope, WeakScope};

/// How a closure refers to its declaring scope.
///
/// A block materialized by `BEGIN` only observes its scope weakly: the
/// scope usually binds the closure, and a strong reference would form a
/// cycle. Reading a method off a struct rebinds it strongly to the struct's
/// field scope, and a closure that escapes a call loses its declaration.
#[derive(Clone)]
pub enum Declaration {
    Strong(Scope),
    Weak(WeakScope),
    Detached,
}

impl Declaration {
    /// The declaring scope, if it is still alive.
    pub fn scope(&self) -> Option<Scope> {
        match self {
            Declaration::Strong(scope) => Some(scope.clone()),
            Declaration::Weak(weak) => weak.upgrade(),
            Declaration::Detached => None,
        }
    }
}

/// Write-once key/value entries attached to a code block.
///
/// Shared by every rebinding of the same block.
#[derive(Clone, Default)]
pub struct Metadata(Arc<Mutex<FxHashMap<Symbol, Value>>>);

impl Metadata {
    pub fn get(&self, key: Symbol) -> EvalResult<Value> {
        self.0
            .lock()
            .get(&key)
            .cloned()
            .ok_or_else(|| missing_metadata(key))
    }

    pub fn set(&self, key: Symbol, value: Value) -> EvalResult<()> {
        let mut entries = self.0.lock();
        if entries.contains_key(&key) {
            return Err(metadata_redefined(key));
        }
        entries.insert(key, value);
        Ok(())
    }
}

struct ClosureInner {
    program: Program,
    /// First instruction of the body.
    start: usize,
    /// The matching `END`.
    end: usize,
    declaration: Declaration,
    metadata: Metadata,
}

/// First-class code block.
#[derive(Clone)]
pub struct Closure(Arc<ClosureInner>);

/// Non-owning handle used by per-instruction memoization.
#[derive(Clone)]
pub struct WeakClosure(Weak<ClosureInner>);

impl WeakClosure {
    pub fn upgrade(&self) -> Option<Closure> {
        self.0.upgrade().map(Closure)
    }
}

impl Closure {
    pub fn new(program: Program, start: usize, end: usize, declaration: Declaration) -> Self {
        Closure(Arc::new(ClosureInner {
            program,
            start,
            end,
            declaration,
            metadata: Metadata::default(),
        }))
    }

    pub fn program(&self) -> &Program {
        &self.0.program
    }

    pub fn start(&self) -> usize {
        self.0.start
    }

    pub fn end(&self) -> usize {
        self.0.end
    }

    pub fn declaration(&self) -> &Declaration {
        &self.0.declaration
    }

    pub fn declaration_scope(&self) -> Option<Scope> {
        self.0.declaration.scope()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.0.metadata
    }

    /// Same body and metadata, different declaring scope.
    #[must_use]
    pub fn rebind(&self, declaration: Declaration) -> Closure {
        Closure(Arc::new(ClosureInner {
            program: self.0.program.clone(),
            start: self.0.start,
            end: self.0.end,
            declaration,
            metadata: self.0.metadata.clone(),
        }))
    }

    /// Drop the declaring scope, for closures escaping a call.
    #[must_use]
    pub fn detached(&self) -> Closure {
        self.rebind(Declaration::Detached)
    }

    pub fn downgrade(&self) -> WeakClosure {
        WeakClosure(Arc::downgrade(&self.0))
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Closure) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code block in lines {} to {}", self.0.start, self.0.end)
    }
}
