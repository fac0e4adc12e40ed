//! The virtual machine entry points.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bb_ir::{parse_program, SymbolTable};
use bb_runtime::{io_error, malformed_instruction, EvalError, EvalResult, Program, Scope, Value};
use tracing::debug;

use crate::config::{VmBuilder, VmConfig};
use crate::interpreter::Interpreter;
use crate::print_handler::SharedPrintHandler;

/// State shared by every execution unit of one VM.
pub(crate) struct VmContext {
    pub(crate) config: VmConfig,
    /// Origin of the `time` instruction's clock.
    pub(crate) started: Instant,
    live_threads: AtomicUsize,
}

/// A reserved spawn slot; frees itself when the unit finishes.
pub(crate) struct ThreadSlot(Arc<VmContext>);

impl Drop for ThreadSlot {
    fn drop(&mut self) {
        self.0.live_threads.fetch_sub(1, Ordering::AcqRel);
    }
}

impl VmContext {
    /// Claim a slot for a new execution unit, unless the cap is reached.
    pub(crate) fn reserve_thread(self: &Arc<Self>) -> Option<ThreadSlot> {
        let reserved = match self.config.max_threads {
            None => {
                self.live_threads.fetch_add(1, Ordering::AcqRel);
                true
            }
            Some(limit) => self
                .live_threads
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                    (live < limit).then_some(live + 1)
                })
                .is_ok(),
        };
        reserved.then(|| ThreadSlot(Arc::clone(self)))
    }

    pub(crate) fn live_threads(&self) -> usize {
        self.live_threads.load(Ordering::Acquire)
    }
}

/// A Blombly virtual machine.
///
/// Cloning is cheap; clones share configuration, clock and thread budget.
#[derive(Clone)]
pub struct Vm {
    interpreter: Interpreter,
}

impl Default for Vm {
    fn default() -> Self {
        Vm::new()
    }
}

impl Vm {
    /// A VM with the default configuration.
    pub fn new() -> Self {
        Vm::with_config(VmConfig::default())
    }

    pub fn builder() -> VmBuilder {
        VmBuilder::new()
    }

    pub fn with_config(config: VmConfig) -> Self {
        let ctx = Arc::new(VmContext {
            config,
            started: Instant::now(),
            live_threads: AtomicUsize::new(0),
        });
        Vm {
            interpreter: Interpreter::new(ctx),
        }
    }

    pub fn config(&self) -> &VmConfig {
        &self.interpreter.ctx().config
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.config().print_handler
    }

    /// Spawned execution units currently running.
    pub fn live_threads(&self) -> usize {
        self.interpreter.ctx().live_threads()
    }

    /// A fresh top-level scope.
    pub fn new_root_scope(&self) -> Scope {
        Scope::new_root()
    }

    /// Execute instructions `start..end` of `program` in `scope`.
    ///
    /// Returns the value of an explicit `return`, if one ran. The caller
    /// owns `scope` and is responsible for releasing it.
    pub fn execute(
        &self,
        program: &Program,
        start: usize,
        end: usize,
        scope: &Scope,
    ) -> EvalResult<Option<Value>> {
        if start > end || end > program.len() {
            return Err(malformed_instruction(format!(
                "range {start}..{end} outside a program of {} instructions",
                program.len()
            )));
        }
        let mut returned = false;
        self.interpreter
            .execute_range(program, start, end, scope, &mut returned)
    }

    /// Run a whole program in a new root scope and wait for every unit it
    /// spawned.
    pub fn run(&self, program: &Program) -> EvalResult<()> {
        debug!(instructions = program.len(), "running program");
        let root = self.new_root_scope();
        let mut returned = false;
        let outcome =
            self.interpreter
                .execute_range(program, 0, program.len(), &root, &mut returned);
        let released = root.release();
        outcome?;
        released?;
        if returned {
            return Err(EvalError::new("The virtual machine cannot return a value"));
        }
        Ok(())
    }

    /// Load a bytecode listing from `path` and run it.
    pub fn run_file(&self, path: &Path) -> EvalResult<()> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|err| io_error(&display, &err))?;
        let program = load(&text, &display)?;
        self.run(&program)
    }
}

/// Parse `text` into a program with its own symbol table.
pub fn load(text: &str, path: &str) -> EvalResult<Program> {
    let symbols = SymbolTable::shared();
    let instructions = parse_program(text, path, &symbols)
        .map_err(|err| malformed_instruction(format!("{path}: {err}")))?;
    Ok(Program::new(instructions, symbols))
}
