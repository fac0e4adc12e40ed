//! Scenario tests: bytecode listings run through the interpreter.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

mod control_tests;
mod error_tests;

use bb_ir::Symbol;
use bb_runtime::{EvalResult, Program, Scope, Value};

use crate::{buffer_handler, load, Vm};

/// A loaded listing, the VM running it and the root scope it runs in.
///
/// The root scope is released on drop so spawned units are always joined.
pub(crate) struct Session {
    pub vm: Vm,
    pub program: Program,
    pub scope: Scope,
}

impl Session {
    pub fn new(vm: Vm, lines: &[&str]) -> Self {
        let program = load(&lines.join("\n"), "test.bbvm").unwrap();
        let scope = vm.new_root_scope();
        Session { vm, program, scope }
    }

    /// Execute the whole listing in the session's root scope.
    pub fn execute(&self) -> EvalResult<Option<Value>> {
        self.vm
            .execute(&self.program, 0, self.program.len(), &self.scope)
    }

    pub fn sym(&self, name: &str) -> Symbol {
        self.program.symbols().intern(name)
    }

    pub fn get(&self, name: &str) -> Value {
        self.scope.get(self.sym(name)).unwrap()
    }

    pub fn get_or_null(&self, name: &str) -> Option<Value> {
        self.scope.get_or_null(self.sym(name)).unwrap()
    }

    pub fn output(&self) -> String {
        self.vm.print_handler().output()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = self.scope.release();
    }
}

/// A VM that captures printed lines.
pub(crate) fn capturing_vm() -> Vm {
    Vm::builder().print_handler(buffer_handler()).build()
}

/// A capturing VM that runs every call in place.
pub(crate) fn sequential_vm() -> Vm {
    Vm::builder()
        .print_handler(buffer_handler())
        .sequential()
        .build()
}

/// Run `lines` on a capturing VM, expecting success.
pub(crate) fn run_ok(lines: &[&str]) -> Session {
    let session = Session::new(capturing_vm(), lines);
    if let Err(err) = session.execute() {
        panic!("listing failed: {err}");
    }
    session
}

/// Run `lines` on a capturing VM, expecting failure.
pub(crate) fn run_err(lines: &[&str]) -> (Session, bb_runtime::EvalError) {
    let session = Session::new(capturing_vm(), lines);
    match session.execute() {
        Ok(value) => panic!("listing succeeded with {value:?}"),
        Err(err) => (session, err),
    }
}
