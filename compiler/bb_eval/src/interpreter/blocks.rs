//! Block-structured instructions: code block literals, conditionals, loops,
//! `try`/`catch`, and splicing blocks into the current scope.

use bb_ir::{Instruction, Opcode};
use bb_runtime::{
    type_mismatch, Closure, Declaration, ErrorValue, EvalError, EvalResult, Scope, Value,
};
use tracing::debug;

use super::{describe, Frame, Interpreter};

/// Message of the Error value a `try` yields when its block neither
/// returned nor failed.
pub(crate) const NO_SIGNAL: &str = "No return or fail signal intercepted with `try`";

impl Interpreter {
    /// `BEGIN`, `BEGINCACHED` and `BEGINFINAL`: materialize the block that
    /// starts at this instruction and skip to its `END`.
    pub(super) fn begin(&self, f: &mut Frame<'_>, inst: &Instruction) -> EvalResult<Value> {
        let begin = f.pc;
        let end = f.program.block_end(begin)?;
        f.pc = end;

        if inst.opcode == Opcode::BeginFinal && !inst.dest.is_none() {
            // Revisiting the declaration keeps the block already bound here.
            if let Some(Value::Code(bound)) = f.scope.get_local_or_null(inst.dest)? {
                if bound.start() == begin + 1 && bound.program().ptr_eq(f.program) {
                    f.dest_kept = true;
                    return Ok(Value::Code(bound));
                }
            }
            f.scope.set_final(inst.dest);
        }

        let memoized = inst.opcode != Opcode::Begin;
        if memoized {
            if let Some(code) = f.program.memoized(begin, f.scope.id()) {
                return Ok(Value::Code(code));
            }
        }
        let code = Closure::new(
            f.program.clone(),
            begin + 1,
            end,
            Declaration::Weak(f.scope.downgrade()),
        );
        if memoized {
            f.program.memoize(begin, f.scope.id(), &code);
        }
        Ok(Value::Code(code))
    }

    /// Evaluate the condition operand of `if`/`while`.
    ///
    /// A code block condition is re-executed on every check and must
    /// `return` a boolean.
    fn condition(&self, f: &Frame<'_>, inst: &Instruction) -> EvalResult<bool> {
        match f.read(inst, 0)? {
            Value::Code(block) => {
                let mut returned = false;
                match self.execute_block(&block, f.scope, &mut returned)? {
                    Some(value) => value.is_true(),
                    None => Err(type_mismatch("bool", "nothing")),
                }
            }
            value => value.is_true(),
        }
    }

    /// `while # condition body`
    pub(super) fn run_while(
        &self,
        f: &mut Frame<'_>,
        inst: &Instruction,
    ) -> EvalResult<Option<Value>> {
        let body = f.read_code(inst, 1)?;
        while self.condition(f, inst)? {
            let value = self.execute_block(&body, f.scope, f.returned)?;
            if *f.returned {
                return Ok(value);
            }
        }
        Ok(None)
    }

    /// `if dest condition accept [reject]`
    ///
    /// A branch that is not a code block is the result itself.
    pub(super) fn run_if(&self, f: &mut Frame<'_>, inst: &Instruction) -> EvalResult<Option<Value>> {
        let branch = if self.condition(f, inst)? {
            f.read_optional(inst, 1)?
        } else {
            f.read_optional(inst, 2)?
        };
        match branch {
            Some(Value::Code(block)) => self.execute_block(&block, f.scope, f.returned),
            other => Ok(other),
        }
    }

    /// `try dest block`
    ///
    /// Intercepts the block's return signal and its recoverable errors.
    /// Units spawned so far from this scope are joined first, so their
    /// failures are intercepted as well.
    pub(super) fn run_try(&self, f: &mut Frame<'_>, inst: &Instruction) -> EvalResult<Option<Value>> {
        let block = f.read_code(inst, 0)?;
        let mut returned = false;
        let outcome = self.execute_block(&block, f.scope, &mut returned);
        let joined = f.scope.join_attached();
        match outcome.and_then(|value| joined.map(|()| value)) {
            Ok(value) if returned => Ok(value),
            Ok(_) => Ok(Some(Value::Error(ErrorValue::consumed(NO_SIGNAL)))),
            Err(err) if err.is_recoverable() => {
                let err = err
                    .resolve_symbols(f.symbols())
                    .with_frame(describe(inst, f.symbols()));
                debug!(error = %err.message, "try intercepted an error");
                Ok(Some(Value::Error(ErrorValue::new(err.to_string()))))
            }
            Err(err) => Err(err),
        }
    }

    /// `catch dest value accept [reject]`
    ///
    /// Runs `accept` and consumes the value when it is an Error, otherwise
    /// runs `reject`. A missing value counts as not an Error.
    pub(super) fn run_catch(
        &self,
        f: &mut Frame<'_>,
        inst: &Instruction,
    ) -> EvalResult<Option<Value>> {
        let value = f.scope.get_or_null(inst.arg(0))?;
        let accept = f.read_optional_code(inst, 1)?;
        let reject = f.read_optional_code(inst, 2)?;
        let branch = match value {
            Some(Value::Error(error)) => {
                error.consume();
                accept
            }
            _ => reject,
        };
        match branch {
            Some(block) => self.execute_block(&block, f.scope, f.returned),
            None => Ok(None),
        }
    }

    /// `inline dest source`: pull a struct's fields into this scope, or run
    /// a block as if its instructions were written here.
    pub(super) fn inline(&self, f: &mut Frame<'_>, inst: &Instruction) -> EvalResult<Option<Value>> {
        match f.read(inst, 0)? {
            Value::Struct(object) => {
                f.scope.pull(&object.scope()?)?;
                Ok(None)
            }
            Value::Code(block) => self.execute_block(&block, f.scope, f.returned),
            other => Err(type_mismatch("code or struct", other.type_name())),
        }
    }

    /// `default # source`: bind what `source` defines, keeping every name
    /// this scope already has.
    pub(super) fn merge_defaults(
        &self,
        f: &mut Frame<'_>,
        inst: &Instruction,
    ) -> EvalResult<Option<Value>> {
        match f.read(inst, 0)? {
            Value::Struct(object) => {
                f.scope.replace_missing(&object.scope()?)?;
            }
            Value::Code(block) => {
                let defaults = Scope::child(f.scope);
                let mut returned = false;
                let outcome = self.execute_block(&block, &defaults, &mut returned);
                let merged = outcome.and_then(|_| {
                    if returned {
                        return Err(EvalError::new(
                            "Cannot return from within a `default` statement",
                        ));
                    }
                    f.scope.replace_missing(&defaults)
                });
                let released = defaults.release();
                merged?;
                released?;
            }
            other => return Err(type_mismatch("code or struct", other.type_name())),
        }
        Ok(None)
    }
}

