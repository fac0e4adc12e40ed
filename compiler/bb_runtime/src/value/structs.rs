//! Struct values: objects backed by a scope of fields.

use bb_ir::Symbol;

use super::Value;
use crate::errors::{EvalError, EvalResult};
use crate::scope::{Scope, WeakScope};

/// Handle to a struct's field scope.
///
/// The struct's own `this` binding holds the `This` flavor so that the
/// field scope does not keep itself alive; reading `this` yields an owning
/// handle again.
#[derive(Clone)]
pub enum StructValue {
    Owned(Scope),
    This(WeakScope),
}

impl StructValue {
    /// Turn `scope` into a struct, binding `this` as a final field.
    pub fn construct(scope: Scope) -> EvalResult<StructValue> {
        scope.set(Symbol::THIS, Value::Struct(StructValue::This(scope.downgrade())))?;
        scope.set_final(Symbol::THIS);
        Ok(StructValue::Owned(scope))
    }

    /// The field scope.
    pub fn scope(&self) -> EvalResult<Scope> {
        match self {
            StructValue::Owned(scope) => Ok(scope.clone()),
            StructValue::This(weak) => weak
                .upgrade()
                .ok_or_else(|| EvalError::new("Struct is no longer alive")),
        }
    }

    /// Field-by-field copy under a fresh `this`.
    pub fn copy(&self) -> EvalResult<StructValue> {
        let source = self.scope()?;
        let fields = Scope::with_parent(source.parent());
        fields.pull(&source)?;
        StructValue::construct(fields)
    }

    pub(crate) fn strengthened(self) -> StructValue {
        if let StructValue::This(weak) = &self {
            if let Some(scope) = weak.upgrade() {
                return StructValue::Owned(scope);
            }
        }
        self
    }

    pub fn ptr_eq(&self, other: &StructValue) -> bool {
        match (self.scope(), other.scope()) {
            (Ok(a), Ok(b)) => a.ptr_eq(&b),
            _ => false,
        }
    }
}
