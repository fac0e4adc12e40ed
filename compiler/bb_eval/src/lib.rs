//! Interpreter loop for the Blombly virtual machine.
//!
//! A [`Vm`] executes a loaded [`Program`] against a [`Scope`]:
//! - [`Vm::execute`]: run an instruction range in a caller-owned scope
//! - [`Vm::run`]: run a whole program in a fresh root scope and join every
//!   execution unit it spawned
//! - [`Vm::new_root_scope`]: top-level scope constructor
//!
//! Calls to code blocks run on their own execution units; see
//! [`VmConfig::max_threads`] for bounding them.

mod config;
mod interpreter;
mod print_handler;
mod stack;
mod vm;

use std::sync::Once;

pub use bb_runtime::{EvalError, EvalErrorKind, EvalResult, Program, Scope, Value};
pub use config::{VmBuilder, VmConfig, DEFAULT_THREAD_NAME, DEFAULT_THREAD_STACK_SIZE};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, BufferPrintHandler, PrintHandlerImpl,
    SharedPrintHandler, StdoutPrintHandler,
};
pub use stack::ensure_sufficient_stack;
pub use vm::{load, Vm};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set, and only runs once per process.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_thread_names(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

#[cfg(test)]
mod tests;
