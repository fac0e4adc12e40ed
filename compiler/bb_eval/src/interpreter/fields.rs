//! Assignment, struct fields and code block metadata.

use bb_ir::Instruction;
use bb_runtime::{
    failed, illegal_closure_capture, temporary_field, type_mismatch, undefined_symbol,
    Declaration, EvalError, EvalResult, Value,
};

use super::{expect_code, Frame, Interpreter};

impl Interpreter {
    /// `get dest object field`
    ///
    /// Struct fields resolve in the struct's own scope only. A code block
    /// read from a struct is bound to that struct.
    pub(super) fn get_field(&self, f: &Frame<'_>, inst: &Instruction) -> EvalResult<Value> {
        let field = inst.arg(1);
        if f.symbols().is_temporary(field) {
            return Err(temporary_field(field));
        }
        match f.read(inst, 0)? {
            Value::Struct(object) => {
                let fields = object.scope()?;
                match fields.get_local_or_null(field)? {
                    Some(Value::Code(method)) => {
                        Ok(Value::Code(method.rebind(Declaration::Strong(fields))))
                    }
                    Some(value) => Ok(value),
                    None => Err(undefined_symbol(field)),
                }
            }
            Value::Code(code) => code.metadata().get(field),
            other => Err(type_mismatch("struct or code", other.type_name())),
        }
    }

    /// `set # object field value`
    ///
    /// A code block declared inside the struct's own scope (or a scope
    /// derived from it) cannot be stored in one of its fields.
    pub(super) fn set_field(
        &self,
        f: &Frame<'_>,
        inst: &Instruction,
    ) -> EvalResult<Option<Value>> {
        let field = inst.arg(1);
        if f.symbols().is_temporary(field) {
            return Err(temporary_field(field));
        }
        let fields = match f.read(inst, 0)? {
            Value::Struct(object) => object.scope()?,
            other => return Err(type_mismatch("struct", other.type_name())),
        };
        let value = f.read(inst, 2)?;
        if let Value::Code(code) = &value {
            if let Some(declared_in) = code.declaration_scope() {
                if declared_in.is_or_derived_from(&fields) {
                    return Err(illegal_closure_capture());
                }
            }
        }
        fields.set(field, value)?;
        Ok(None)
    }

    /// `setfinal # code key value`: write-once code block metadata.
    pub(super) fn set_metadata(
        &self,
        f: &Frame<'_>,
        inst: &Instruction,
    ) -> EvalResult<Option<Value>> {
        let code = expect_code(f.read(inst, 0)?)?;
        let value = f.read(inst, 2)?;
        code.metadata().set(inst.arg(1), value)?;
        Ok(None)
    }

    /// `IS dest source`: plain assignment. An Error value is raised again,
    /// annotated with this instruction.
    pub(super) fn assign(&self, f: &Frame<'_>, inst: &Instruction) -> EvalResult<Value> {
        match f.read(inst, 0)? {
            Value::Error(error) => Err(failed(error.message())),
            value => Ok(value),
        }
    }

    /// `AS dest source`: assignment that accepts Error values and marks
    /// them consumed.
    pub(super) fn assign_tolerant(&self, f: &Frame<'_>, inst: &Instruction) -> EvalResult<Value> {
        let value = f.read(inst, 0)?;
        if let Value::Error(error) = &value {
            error.consume();
        }
        Ok(value)
    }

    /// `exists dest source`: whether `source` holds a non-Error value.
    pub(super) fn exists(&self, f: &Frame<'_>, inst: &Instruction) -> EvalResult<Value> {
        let found = f.scope.get_or_null(inst.arg(0))?;
        Ok(Value::Bool(matches!(found, Some(value) if !value.is_error())))
    }

    /// `final # symbol`
    pub(super) fn finalize(&self, f: &Frame<'_>, inst: &Instruction) -> EvalResult<Option<Value>> {
        let symbol = inst.arg(0);
        if f.symbols().is_temporary(symbol) {
            return Err(EvalError::new(format!(
                "Cannot finalize a temporary variable: {}",
                f.symbols().name(symbol)
            )));
        }
        f.scope.set_final(symbol);
        Ok(None)
    }

    /// `fail # value`: the error raised by an explicit failure.
    pub(super) fn fail(&self, f: &Frame<'_>, inst: &Instruction) -> EvalError {
        match f.read(inst, 0) {
            Ok(value) => failed(value.to_string()),
            Err(err) => err,
        }
    }
}
