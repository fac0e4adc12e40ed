//! Output and clock instructions.

use bb_ir::Instruction;
use bb_runtime::{EvalResult, Value};

use super::{Frame, Interpreter};

impl Interpreter {
    /// `print # values...`: one line, operands separated by spaces.
    pub(super) fn print(&self, f: &Frame<'_>, inst: &Instruction) -> EvalResult<Option<Value>> {
        let parts = f
            .read_operands(inst)?
            .iter()
            .map(|value| self.stringify(f, value))
            .collect::<EvalResult<Vec<_>>>()?;
        self.ctx.config.print_handler.println(&parts.join(" "));
        Ok(None)
    }

    /// `time dest`: seconds since the VM started.
    pub(super) fn time(&self) -> Value {
        Value::Float(self.ctx.started.elapsed().as_secs_f64())
    }
}
