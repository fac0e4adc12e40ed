//! VM configuration and its builder.

use std::fmt;

use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::vm::Vm;

/// Stack size of spawned execution units.
pub const DEFAULT_THREAD_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Name given to spawned execution units.
pub const DEFAULT_THREAD_NAME: &str = "bb-call";

/// Settings shared by every execution unit of a VM.
#[derive(Clone)]
pub struct VmConfig {
    /// Cap on concurrently live spawned units. When reached, calls run
    /// synchronously in the caller's thread. `None` spawns a thread per call.
    pub max_threads: Option<usize>,
    pub thread_stack_size: usize,
    pub thread_name: String,
    pub print_handler: SharedPrintHandler,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            max_threads: None,
            thread_stack_size: DEFAULT_THREAD_STACK_SIZE,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            print_handler: stdout_handler(),
        }
    }
}

impl fmt::Debug for VmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VmConfig")
            .field("max_threads", &self.max_threads)
            .field("thread_stack_size", &self.thread_stack_size)
            .field("thread_name", &self.thread_name)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Vm`] instances.
///
/// ```text
/// let vm = Vm::builder()
///     .max_threads(4)
///     .print_handler(buffer_handler())
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct VmBuilder {
    config: VmConfig,
}

impl VmBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of concurrently running spawned calls.
    #[must_use]
    pub fn max_threads(mut self, limit: usize) -> Self {
        self.config.max_threads = Some(limit);
        self
    }

    /// Run every call synchronously.
    #[must_use]
    pub fn sequential(self) -> Self {
        self.max_threads(0)
    }

    #[must_use]
    pub fn thread_stack_size(mut self, bytes: usize) -> Self {
        self.config.thread_stack_size = bytes;
        self
    }

    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Set where `print` writes. Default is stdout.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.config.print_handler = handler;
        self
    }

    pub fn build(self) -> Vm {
        Vm::with_config(self.config)
    }
}
