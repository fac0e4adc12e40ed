//! Runtime values for the Blombly virtual machine.
//!
//! # Sharing
//!
//! Scalars and strings are immutable and cloned freely. Lists, vectors,
//! closures, structs, files, errors and futures are handles over `Arc`
//! storage: cloning a `Value` shares the underlying object. Containers that
//! several execution units may touch at once (list and vector storage,
//! struct field scopes) guard their contents with a lock; the `copy`
//! operator produces an unshared container when a caller needs to mutate
//! without affecting other owners.

mod code;
mod error_value;
mod file;
mod list;
mod structs;
mod vector;

use std::fmt;
use std::sync::Arc;

pub use code::{Closure, Declaration, Metadata, WeakClosure};
pub use error_value::ErrorValue;
pub use file::FileValue;
pub use list::ListValue;
pub use structs::StructValue;
pub use vector::NumVector;

use crate::errors::{type_mismatch, EvalResult};
use crate::future::Future;

/// Runtime value.
#[derive(Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    /// Numeric vector, possibly a view into shared storage.
    Vector(NumVector),
    /// Ordered list with shared, lock-guarded storage.
    List(ListValue),
    /// Code block with its declaring scope.
    Code(Closure),
    /// Object backed by a scope of fields.
    Struct(StructValue),
    File(FileValue),
    /// First-class error value.
    Error(ErrorValue),
    /// Result of a call that may still be running.
    Future(Future),
}

impl Value {
    #[inline]
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(ListValue::new(items))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(ErrorValue::new(message))
    }

    /// Type name used in diagnostics and dispatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Vector(_) => "vector",
            Value::List(_) => "list",
            Value::Code(_) => "code",
            Value::Struct(_) => "struct",
            Value::File(_) => "file",
            Value::Error(_) => "error",
            Value::Future(_) => "future",
        }
    }

    /// Condition value of an `if` or `while`. Only booleans qualify.
    pub fn is_true(&self) -> EvalResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(type_mismatch("bool", other.type_name())),
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Numeric view used by arithmetic and vector conversion.
    #[allow(clippy::cast_precision_loss, reason = "int to float promotion")]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Copy the outer container so it can be mutated without affecting
    /// other owners. Elements stay shared.
    pub fn shallow_copy(&self) -> EvalResult<Value> {
        Ok(match self {
            Value::List(list) => Value::List(list.copy()),
            Value::Vector(vector) => Value::Vector(vector.copy()),
            Value::Struct(object) => Value::Struct(object.copy()?),
            Value::Error(error) => Value::Error(ErrorValue::new(error.message())),
            other => other.clone(),
        })
    }

    /// Whether two values are the same shared object.
    ///
    /// Scalars and strings never compare identical: only handles do.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Vector(a), Value::Vector(b)) => a.ptr_eq(b),
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Code(a), Value::Code(b)) => a.ptr_eq(b),
            (Value::Struct(a), Value::Struct(b)) => a.ptr_eq(b),
            (Value::File(a), Value::File(b)) => a.ptr_eq(b),
            (Value::Error(a), Value::Error(b)) => a.ptr_eq(b),
            (Value::Future(a), Value::Future(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Turn a weak `this` reference into an owning one.
    pub(crate) fn strengthened(self) -> Value {
        match self {
            Value::Struct(object) => Value::Struct(object.strengthened()),
            other => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x:.6}"),
            Value::Str(s) => f.write_str(s),
            Value::Vector(v) => write!(f, "{v}"),
            Value::List(l) => write!(f, "{l}"),
            Value::Code(c) => write!(f, "{c}"),
            Value::Struct(_) => f.write_str("struct"),
            Value::File(file) => f.write_str(file.path()),
            Value::Error(e) => f.write_str(e.message()),
            Value::Future(_) => f.write_str("future"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Error(e) => write!(f, "Error({:?})", e.message()),
            other => write!(f, "{}({other})", other.type_name()),
        }
    }
}

impl PartialEq for Value {
    /// Structural for scalars and strings, identity for handles.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => self.ptr_eq(other),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
