//! The interpreter loop.
//!
//! Execution is a state machine over instruction ranges. A range runs in
//! one scope until it reaches its end or a `return` sets the return signal;
//! nested blocks (`if`, `while`, `catch`, `inline`) run in the same scope
//! and share the signal, so a `return` inside them unwinds every range up to
//! the enclosing call. Calls, `try`, `new` and `default` start a fresh
//! signal.
//!
//! # Errors
//!
//! Each instruction an error unwinds through adds a breadcrumb frame to it.
//! Errors stay Rust-level failures until a `try` turns them into Error
//! values.

mod blocks;
mod call;
mod fields;
mod ops;

use std::sync::Arc;

use bb_ir::{Instruction, Opcode, SymbolTable};
use bb_runtime::{
    type_mismatch, undefined_symbol, Closure, EvalError, EvalResult, Program, Scope, Value,
};
use smallvec::SmallVec;
use tracing::trace;

use crate::stack::ensure_sufficient_stack;
use crate::vm::VmContext;

/// Executes instruction ranges. Cheap to clone into spawned units.
#[derive(Clone)]
pub(crate) struct Interpreter {
    ctx: Arc<VmContext>,
}

/// State of the range being executed.
struct Frame<'a> {
    program: &'a Program,
    scope: &'a Scope,
    /// Index of the current instruction. Block openers move it to their
    /// matching `END`.
    pc: usize,
    returned: &'a mut bool,
    /// Set when the destination already holds the instruction's result and
    /// must not be written again.
    dest_kept: bool,
}

impl Frame<'_> {
    /// Value of operand `index`.
    fn read(&self, inst: &Instruction, index: usize) -> EvalResult<Value> {
        let symbol = inst.arg(index);
        if inst.arg_is_local(index) {
            self.scope
                .get_local_or_null(symbol)?
                .ok_or_else(|| undefined_symbol(symbol))
        } else {
            self.scope.get(symbol)
        }
    }

    /// Value of operand `index`, or `None` when the operand is `#`.
    fn read_optional(&self, inst: &Instruction, index: usize) -> EvalResult<Option<Value>> {
        if inst.arg(index).is_none() {
            return Ok(None);
        }
        self.read(inst, index).map(Some)
    }

    /// Every operand, in order.
    fn read_operands(&self, inst: &Instruction) -> EvalResult<SmallVec<[Value; 3]>> {
        (0..inst.args.len()).map(|i| self.read(inst, i)).collect()
    }

    /// Operand `index`, which must be a code block.
    fn read_code(&self, inst: &Instruction, index: usize) -> EvalResult<Closure> {
        expect_code(self.read(inst, index)?)
    }

    /// Optional operand `index`, which must be a code block when present.
    fn read_optional_code(&self, inst: &Instruction, index: usize) -> EvalResult<Option<Closure>> {
        self.read_optional(inst, index)?.map(expect_code).transpose()
    }

    fn symbols(&self) -> &SymbolTable {
        self.program.symbols()
    }
}

fn expect_code(value: Value) -> EvalResult<Closure> {
    match value {
        Value::Code(code) => Ok(code),
        other => Err(type_mismatch("code", other.type_name())),
    }
}

/// Breadcrumb describing `inst` in an error trail.
pub(crate) fn describe(inst: &Instruction, symbols: &SymbolTable) -> String {
    let head = match &inst.context {
        Some(text) => text.to_string(),
        None => inst.display(symbols).to_string(),
    };
    format!("{head:<40}  {}", inst.location)
}

impl Interpreter {
    pub(crate) fn new(ctx: Arc<VmContext>) -> Self {
        Interpreter { ctx }
    }

    pub(crate) fn ctx(&self) -> &VmContext {
        &self.ctx
    }

    /// Execute instructions `start..end` in `scope`.
    ///
    /// Returns the value of a `return` reached inside the range, which also
    /// sets `returned`.
    pub(crate) fn execute_range(
        &self,
        program: &Program,
        start: usize,
        end: usize,
        scope: &Scope,
        returned: &mut bool,
    ) -> EvalResult<Option<Value>> {
        ensure_sufficient_stack(|| self.run_range(program, start, end, scope, returned))
    }

    /// Execute the body of `code` in `scope`.
    fn execute_block(
        &self,
        code: &Closure,
        scope: &Scope,
        returned: &mut bool,
    ) -> EvalResult<Option<Value>> {
        self.execute_range(code.program(), code.start(), code.end(), scope, returned)
    }

    fn run_range(
        &self,
        program: &Program,
        start: usize,
        end: usize,
        scope: &Scope,
        returned: &mut bool,
    ) -> EvalResult<Option<Value>> {
        let instructions = program.instructions();
        let mut pc = start;
        while pc < end {
            let inst = &instructions[pc];
            trace!(pc, op = inst.opcode.mnemonic(), "execute");
            let mut frame = Frame {
                program,
                scope,
                pc,
                returned: &mut *returned,
                dest_kept: false,
            };
            let result = self
                .step(&mut frame, inst)
                .map_err(|err| enrich(err, inst, program.symbols()))?;
            pc = frame.pc;
            let dest_kept = frame.dest_kept;
            if *returned {
                return Ok(result);
            }
            if !dest_kept {
                store(scope, inst, result)
                    .map_err(|err| enrich(err, inst, program.symbols()))?;
            }
            pc += 1;
        }
        Ok(None)
    }

    fn step(&self, f: &mut Frame<'_>, inst: &Instruction) -> EvalResult<Option<Value>> {
        match inst.opcode {
            Opcode::Builtin => f.program.literal(f.pc).map(Some),
            Opcode::Begin | Opcode::BeginCached | Opcode::BeginFinal => {
                self.begin(f, inst).map(Some)
            }
            Opcode::End => Ok(None),
            Opcode::Call => self.call(f, inst),
            Opcode::Return => {
                let value = f.read_optional(inst, 0)?;
                *f.returned = true;
                Ok(value)
            }
            Opcode::Get => self.get_field(f, inst).map(Some),
            Opcode::Is => self.assign(f, inst).map(Some),
            Opcode::As => self.assign_tolerant(f, inst).map(Some),
            Opcode::Exists => self.exists(f, inst).map(Some),
            Opcode::Set => self.set_field(f, inst),
            Opcode::SetFinal => self.set_metadata(f, inst),
            Opcode::While => self.run_while(f, inst),
            Opcode::If => self.run_if(f, inst),
            Opcode::Try => self.run_try(f, inst),
            Opcode::Catch => self.run_catch(f, inst),
            Opcode::Inline => self.inline(f, inst),
            Opcode::Default => self.merge_defaults(f, inst),
            Opcode::New => self.construct(f, inst).map(Some),
            Opcode::Final => self.finalize(f, inst),
            Opcode::Fail => Err(self.fail(f, inst)),
            Opcode::Print => self.print(f, inst),
            Opcode::Time => Ok(Some(self.time())),
            Opcode::List => Ok(Some(Value::list(f.read_operands(inst)?.into_vec()))),
            Opcode::Op(op) => self.operator(f, inst, op),
        }
    }
}

/// Write an instruction's result to its destination.
///
/// An instruction that produces nothing unbinds the destination.
fn store(scope: &Scope, inst: &Instruction, result: Option<Value>) -> EvalResult<()> {
    if inst.dest.is_none() {
        return Ok(());
    }
    match result {
        Some(value) => scope.set(inst.dest, value),
        None => scope.remove(inst.dest),
    }
}

fn enrich(err: EvalError, inst: &Instruction, symbols: &SymbolTable) -> EvalError {
    err.resolve_symbols(symbols).with_frame(describe(inst, symbols))
}
