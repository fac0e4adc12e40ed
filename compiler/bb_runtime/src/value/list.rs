//! Lists with shared, lock-guarded storage.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::Value;
use crate::errors::{index_out_of_range, EvalResult};

/// Ordered list whose storage is shared by every clone of the handle.
///
/// Every structural operation takes the lock for its whole duration, so
/// pushes from concurrent execution units are never lost.
#[derive(Clone, Default)]
pub struct ListValue(Arc<Mutex<Vec<Value>>>);

impl ListValue {
    pub fn new(items: Vec<Value>) -> Self {
        ListValue(Arc::new(Mutex::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    pub fn push(&self, value: Value) {
        self.0.lock().push(value);
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Option<Value> {
        self.0.lock().pop()
    }

    /// Remove and return the first element.
    pub fn next(&self) -> Option<Value> {
        let mut items = self.0.lock();
        if items.is_empty() {
            None
        } else {
            Some(items.remove(0))
        }
    }

    pub fn at(&self, index: i64) -> EvalResult<Value> {
        let items = self.0.lock();
        checked_index(index, items.len()).map(|i| items[i].clone())
    }

    /// Overwrite an existing element.
    pub fn put(&self, index: i64, value: Value) -> EvalResult<()> {
        let mut items = self.0.lock();
        let i = checked_index(index, items.len())?;
        items[i] = value;
        Ok(())
    }

    /// Clone of the current contents.
    pub fn snapshot(&self) -> Vec<Value> {
        self.0.lock().clone()
    }

    /// New list with its own storage holding the same elements.
    pub fn copy(&self) -> ListValue {
        ListValue::new(self.snapshot())
    }

    #[inline]
    pub fn ptr_eq(&self, other: &ListValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

pub(super) fn checked_index(index: i64, len: usize) -> EvalResult<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| index_out_of_range(index, len))
}

impl fmt::Display for ListValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Render from a snapshot: elements may be lists that lock themselves.
        let items = self.snapshot();
        f.write_str("[")?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        f.write_str("]")
    }
}
