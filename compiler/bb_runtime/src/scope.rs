//! Hierarchical binding environments.
//!
//! A [`Scope`] maps symbols to values, remembers which symbols are final,
//! optionally falls back to a parent scope, and tracks the futures spawned
//! while executing inside it. Scopes are shared handles: call scopes move to
//! the thread that runs the callee, and struct field scopes may be reached
//! from several execution units at once, so all state sits behind one lock.
//!
//! # Locking
//!
//! The lock is never held while awaiting a future, while visiting another
//! scope, or while dropping values. Lookups copy what they need out of the
//! guard and release it before walking to the parent.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use bb_ir::Symbol;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::errors::{final_violation, mutable_from_nested_block, undefined_symbol, EvalResult};
use crate::future::Future;
use crate::value::Value;

/// Process-unique scope identity, used to key per-instruction memos.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(0);

impl ScopeId {
    fn fresh() -> Self {
        ScopeId(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

struct ScopeState {
    bindings: FxHashMap<Symbol, Value>,
    finals: FxHashSet<Symbol>,
    parent: Option<Scope>,
    /// Futures spawned from this scope, in spawn order.
    attached: Vec<Future>,
    /// Whether lookups passing through this scope may see non-final
    /// ancestor bindings. Cleared on call boundaries.
    allow_mutables: bool,
}

struct ScopeInner {
    id: ScopeId,
    state: Mutex<ScopeState>,
}

/// Shared handle to a binding environment.
#[derive(Clone)]
pub struct Scope(Arc<ScopeInner>);

/// Non-owning handle to a scope.
#[derive(Clone)]
pub struct WeakScope(Weak<ScopeInner>);

impl WeakScope {
    pub fn upgrade(&self) -> Option<Scope> {
        self.0.upgrade().map(Scope)
    }
}

impl Scope {
    /// A scope with no parent.
    pub fn new_root() -> Self {
        Scope::with_parent(None)
    }

    /// A nested scope that falls back to `parent`.
    pub fn child(parent: &Scope) -> Self {
        Scope::with_parent(Some(parent.clone()))
    }

    pub fn with_parent(parent: Option<Scope>) -> Self {
        Scope(Arc::new(ScopeInner {
            id: ScopeId::fresh(),
            state: Mutex::new(ScopeState {
                bindings: FxHashMap::default(),
                finals: FxHashSet::default(),
                parent,
                attached: Vec::new(),
                allow_mutables: true,
            }),
        }))
    }

    #[inline]
    pub fn id(&self) -> ScopeId {
        self.0.id
    }

    pub fn downgrade(&self) -> WeakScope {
        WeakScope(Arc::downgrade(&self.0))
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn parent(&self) -> Option<Scope> {
        self.0.state.lock().parent.clone()
    }

    pub fn allows_mutables(&self) -> bool {
        self.0.state.lock().allow_mutables
    }

    // Lookup

    /// Resolve `symbol` locally, then through the parent chain.
    pub fn get(&self, symbol: Symbol) -> EvalResult<Value> {
        self.get_or_null(symbol)?
            .ok_or_else(|| undefined_symbol(symbol))
    }

    /// Like [`Scope::get`], but a missing symbol is `None`.
    ///
    /// Crossing a scope whose `allow_mutables` flag is cleared restricts the
    /// rest of the walk to final bindings; finding a non-final one there is
    /// an error rather than a miss.
    pub fn get_or_null(&self, symbol: Symbol) -> EvalResult<Option<Value>> {
        let mut scope = self.clone();
        let mut mutables_visible = true;
        loop {
            let (binding, is_final, allow_mutables, parent) = {
                let state = scope.0.state.lock();
                (
                    state.bindings.get(&symbol).cloned(),
                    state.finals.contains(&symbol),
                    state.allow_mutables,
                    state.parent.clone(),
                )
            };
            if let Some(value) = binding {
                if !mutables_visible && !is_final {
                    return Err(mutable_from_nested_block(symbol));
                }
                return scope.settle(symbol, value);
            }
            mutables_visible &= allow_mutables;
            match parent {
                Some(next) => scope = next,
                None => return Ok(None),
            }
        }
    }

    /// Resolve `symbol` in this scope only.
    pub fn get_local_or_null(&self, symbol: Symbol) -> EvalResult<Option<Value>> {
        let binding = self.0.state.lock().bindings.get(&symbol).cloned();
        match binding {
            Some(value) => self.settle(symbol, value),
            None => Ok(None),
        }
    }

    pub fn contains_local(&self, symbol: Symbol) -> bool {
        self.0.state.lock().bindings.contains_key(&symbol)
    }

    /// Await a future binding and store its outcome in place of it.
    fn settle(&self, symbol: Symbol, value: Value) -> EvalResult<Option<Value>> {
        let Value::Future(future) = value else {
            return Ok(Some(value.strengthened()));
        };
        let outcome = future.await_result();

        let mut state = self.0.state.lock();
        state.attached.retain(|f| !f.ptr_eq(&future));
        let resolved = outcome?;
        let still_pending = matches!(
            state.bindings.get(&symbol),
            Some(Value::Future(f)) if f.ptr_eq(&future)
        );
        if still_pending {
            match &resolved {
                Some(v) => {
                    state.bindings.insert(symbol, v.clone());
                }
                None => {
                    state.bindings.remove(&symbol);
                }
            }
        }
        Ok(resolved)
    }

    // Mutation

    /// Bind `symbol` in this scope.
    ///
    /// A final symbol accepts its first binding and nothing after it.
    pub fn set(&self, symbol: Symbol, value: Value) -> EvalResult<()> {
        let previous = {
            let mut state = self.0.state.lock();
            if state.finals.contains(&symbol) && state.bindings.contains_key(&symbol) {
                return Err(final_violation(symbol));
            }
            state.bindings.insert(symbol, value)
        };
        drop(previous);
        Ok(())
    }

    /// Remove a local binding, as when an instruction produces no value.
    pub fn remove(&self, symbol: Symbol) -> EvalResult<()> {
        let previous = {
            let mut state = self.0.state.lock();
            if state.finals.contains(&symbol) && state.bindings.contains_key(&symbol) {
                return Err(final_violation(symbol));
            }
            state.bindings.remove(&symbol)
        };
        drop(previous);
        Ok(())
    }

    pub fn set_final(&self, symbol: Symbol) {
        self.0.state.lock().finals.insert(symbol);
    }

    pub fn is_final(&self, symbol: Symbol) -> bool {
        self.0.state.lock().finals.contains(&symbol)
    }

    /// Copy every binding of `other` into this scope.
    ///
    /// `this` is never copied: it always names the scope's own struct.
    pub fn pull(&self, other: &Scope) -> EvalResult<()> {
        if self.ptr_eq(other) {
            return Ok(());
        }
        for (symbol, value) in other.settled_bindings()? {
            self.set(symbol, value)?;
        }
        Ok(())
    }

    /// Copy the bindings of `other` that this scope lacks locally.
    pub fn replace_missing(&self, other: &Scope) -> EvalResult<()> {
        if self.ptr_eq(other) {
            return Ok(());
        }
        for (symbol, value) in other.settled_bindings()? {
            if !self.contains_local(symbol) {
                self.set(symbol, value)?;
            }
        }
        Ok(())
    }

    /// Local bindings except `this`, with futures awaited.
    fn settled_bindings(&self) -> EvalResult<Vec<(Symbol, Value)>> {
        let snapshot: Vec<(Symbol, Value)> = {
            let state = self.0.state.lock();
            state
                .bindings
                .iter()
                .filter(|(symbol, _)| **symbol != Symbol::THIS)
                .map(|(symbol, value)| (*symbol, value.clone()))
                .collect()
        };
        let mut settled = Vec::with_capacity(snapshot.len());
        for (symbol, value) in snapshot {
            if let Some(value) = self.settle(symbol, value)? {
                settled.push((symbol, value));
            }
        }
        Ok(settled)
    }

    /// Re-point this scope at `new_parent` and make it a call boundary.
    ///
    /// Code running here keeps full access to its own bindings but only
    /// sees final bindings of its ancestors.
    pub fn detach(&self, new_parent: Option<Scope>) {
        let previous = {
            let mut state = self.0.state.lock();
            state.allow_mutables = false;
            std::mem::replace(&mut state.parent, new_parent)
        };
        drop(previous);
    }

    /// Whether `ancestor` is this scope or one of its ancestors.
    pub fn is_or_derived_from(&self, ancestor: &Scope) -> bool {
        let mut visited = FxHashSet::default();
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            if scope.ptr_eq(ancestor) {
                return true;
            }
            if !visited.insert(scope.id()) {
                return false;
            }
            current = scope.parent();
        }
        false
    }

    // Structured concurrency

    /// Record a future spawned from this scope.
    pub fn attach(&self, future: Future) {
        self.0.state.lock().attached.push(future);
    }

    pub fn attached_count(&self) -> usize {
        self.0.state.lock().attached.len()
    }

    /// Await every attached future in spawn order.
    ///
    /// All futures are joined even if one fails; the first failure is
    /// returned.
    pub fn join_attached(&self) -> EvalResult<()> {
        let mut first_error = None;
        loop {
            let pending = std::mem::take(&mut self.0.state.lock().attached);
            if pending.is_empty() {
                break;
            }
            for future in pending {
                if let Err(err) = future.await_result() {
                    warn!(error = %err.message, "execution unit failed during join");
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Join attached futures, then drop every binding.
    ///
    /// Clearing the bindings breaks the cycles closures and structs form
    /// with the scopes they reference. The parent link stays: a struct built
    /// here still resolves names through this scope's ancestors.
    pub fn release(&self) -> EvalResult<()> {
        let joined = self.join_attached();
        let bindings = {
            let mut state = self.0.state.lock();
            state.finals.clear();
            std::mem::take(&mut state.bindings)
        };
        debug!(scope = self.0.id.0, bindings = bindings.len(), "released scope");
        drop(bindings);
        joined
    }

    /// Symbols bound locally, in no particular order.
    pub fn local_symbols(&self) -> Vec<Symbol> {
        self.0.state.lock().bindings.keys().copied().collect()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.state.lock();
        f.debug_struct("Scope")
            .field("id", &self.0.id)
            .field("bindings", &state.bindings.len())
            .field("finals", &state.finals.len())
            .field("attached", &state.attached.len())
            .field("allow_mutables", &state.allow_mutables)
            .finish()
    }
}
