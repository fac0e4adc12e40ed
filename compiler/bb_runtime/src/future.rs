//! Handles to calls running on their own execution unit.
//!
//! A future owns the join handle of the thread running a call body and a
//! single result slot. The first [`Future::await_result`] joins the thread
//! and fills the slot; later calls return a clone of the stored outcome.

use std::any::Any;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::debug;

use crate::errors::{spawned_unit_failed, EvalResult};
use crate::value::Value;

/// Outcome of a call: an explicit return value, or nothing.
pub type CallOutcome = EvalResult<Option<Value>>;

enum FutureState {
    Running(JoinHandle<CallOutcome>),
    Resolved(CallOutcome),
}

/// Result of a call that may still be running.
#[derive(Clone)]
pub struct Future(Arc<Mutex<FutureState>>);

impl Future {
    /// Run `body` on a new named thread.
    pub fn spawn<F>(name: String, stack_size: usize, body: F) -> io::Result<Future>
    where
        F: FnOnce() -> CallOutcome + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(name)
            .stack_size(stack_size)
            .spawn(body)?;
        debug!(thread = ?handle.thread().id(), "spawned execution unit");
        Ok(Future(Arc::new(Mutex::new(FutureState::Running(handle)))))
    }

    /// A future whose outcome is already known.
    pub fn resolved(outcome: CallOutcome) -> Future {
        Future(Arc::new(Mutex::new(FutureState::Resolved(outcome))))
    }

    /// Block until the call finishes and return its outcome.
    ///
    /// The lock is held while joining, so concurrent awaiters queue behind
    /// the first one and all observe the same outcome.
    pub fn await_result(&self) -> CallOutcome {
        let mut state = self.0.lock();
        let placeholder = FutureState::Resolved(Ok(None));
        let handle = match std::mem::replace(&mut *state, placeholder) {
            FutureState::Running(handle) => handle,
            FutureState::Resolved(outcome) => {
                *state = FutureState::Resolved(outcome.clone());
                return outcome;
            }
        };
        let id = handle.thread().id();
        let outcome = handle.join().unwrap_or_else(|payload| {
            Err(spawned_unit_failed(format!(
                "Execution unit panicked: {}",
                panic_message(payload.as_ref())
            )))
        });
        debug!(thread = ?id, ok = outcome.is_ok(), "joined execution unit");
        *state = FutureState::Resolved(outcome.clone());
        outcome
    }

    pub fn is_resolved(&self) -> bool {
        matches!(&*self.0.lock(), FutureState::Resolved(_))
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Future) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

impl fmt::Debug for Future {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
