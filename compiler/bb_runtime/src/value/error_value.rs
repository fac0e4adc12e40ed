//! First-class error values.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct ErrorInner {
    message: String,
    consumed: AtomicBool,
}

/// Error carried as ordinary data.
///
/// An error is "consumed" once a catching construct has acknowledged it.
/// Dropping an unconsumed error has no effect.
#[derive(Clone)]
pub struct ErrorValue(Arc<ErrorInner>);

impl ErrorValue {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorValue(Arc::new(ErrorInner {
            message: message.into(),
            consumed: AtomicBool::new(false),
        }))
    }

    /// An error that starts out consumed.
    pub fn consumed(message: impl Into<String>) -> Self {
        let error = ErrorValue::new(message);
        error.consume();
        error
    }

    pub fn message(&self) -> &str {
        &self.0.message
    }

    pub fn consume(&self) {
        self.0.consumed.store(true, Ordering::Release);
    }

    pub fn is_consumed(&self) -> bool {
        self.0.consumed.load(Ordering::Acquire)
    }

    #[inline]
    pub fn ptr_eq(&self, other: &ErrorValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
