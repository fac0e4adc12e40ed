//! Calls, struct construction and struct operator overloads.
//!
//! A call runs its callee in a fresh call scope. The optional context
//! operand is run (or pulled, for a struct) into that scope first to bind
//! the arguments, while the scope still sees the caller. The scope is then
//! detached onto the callee's declaring scope, so the body sees its own
//! lexical environment and only final bindings beyond its own locals.
//!
//! Calls to code blocks run on a new execution unit and yield a future
//! attached to the caller's scope. Calls to structs, operator overloads and
//! calls made while the thread budget is exhausted run synchronously.

use bb_ir::{Instruction, Operator, Symbol};
use bb_runtime::operators::dispatch;
use bb_runtime::{
    not_callable, type_mismatch, undefined_symbol, CallOutcome, Closure, Declaration, EvalResult,
    Future, Scope, StructValue, Value,
};
use tracing::{debug, warn};

use super::{describe, Frame, Interpreter};

/// Result of binding a call's arguments.
enum Arguments {
    Bound,
    /// The context block returned, which ends the call early.
    Returned(Option<Value>),
}

/// A value leaving a call drops its tie to the call's scopes.
fn escape(value: Value) -> Value {
    match value {
        Value::Code(code) => Value::Code(code.detached()),
        other => other,
    }
}

/// Release a finished call scope and settle the call's outcome.
///
/// The scope is released even when the body failed; a body failure takes
/// precedence over a failure surfaced while joining.
fn finish_call(call_scope: &Scope, outcome: CallOutcome) -> CallOutcome {
    let released = call_scope.release();
    let value = outcome?;
    released?;
    Ok(value.map(escape))
}

impl Interpreter {
    /// `call dest context callee`
    #[tracing::instrument(level = "debug", skip_all)]
    pub(super) fn call(&self, f: &mut Frame<'_>, inst: &Instruction) -> EvalResult<Option<Value>> {
        let (code, parallel) = match f.read(inst, 1)? {
            Value::Code(code) => (code, true),
            Value::Struct(object) => (struct_callable(&object)?, false),
            other => return Err(not_callable(other.type_name())),
        };
        let context = f.read_optional(inst, 0)?;

        let call_scope = Scope::child(f.scope);
        match self.bind_arguments(context, &call_scope) {
            Ok(Arguments::Bound) => {}
            Ok(Arguments::Returned(value)) => return finish_call(&call_scope, Ok(value)),
            Err(err) => return finish_call(&call_scope, Err(err)),
        }
        call_scope.detach(Some(
            code.declaration_scope()
                .unwrap_or_else(|| f.scope.clone()),
        ));

        if parallel {
            if let Some(future) = self.spawn_call(&code, &call_scope, describe(inst, f.symbols())) {
                f.scope.attach(future.clone());
                return Ok(Some(Value::Future(future)));
            }
        }
        self.run_call(&code, &call_scope)
    }

    /// Run the context operand of a call into `call_scope`.
    fn bind_arguments(&self, context: Option<Value>, call_scope: &Scope) -> EvalResult<Arguments> {
        match context {
            None => Ok(Arguments::Bound),
            Some(Value::Code(block)) => {
                let mut returned = false;
                let value = self.execute_block(&block, call_scope, &mut returned)?;
                Ok(if returned {
                    Arguments::Returned(value)
                } else {
                    Arguments::Bound
                })
            }
            Some(Value::Struct(object)) => {
                call_scope.pull(&object.scope()?)?;
                Ok(Arguments::Bound)
            }
            Some(other) => Err(type_mismatch("code or struct", other.type_name())),
        }
    }

    /// Start `code` on a new execution unit.
    ///
    /// Returns `None` when the thread budget is exhausted or the thread
    /// cannot be created; the caller then runs the call itself.
    fn spawn_call(&self, code: &Closure, call_scope: &Scope, site: String) -> Option<Future> {
        let slot = self.ctx.reserve_thread()?;
        let interpreter = self.clone();
        let body = code.clone();
        let scope = call_scope.clone();
        let spawned = Future::spawn(
            self.ctx.config.thread_name.clone(),
            self.ctx.config.thread_stack_size,
            move || {
                let _slot = slot;
                interpreter
                    .run_call(&body, &scope)
                    .map_err(|err| err.with_frame(site))
            },
        );
        match spawned {
            Ok(future) => Some(future),
            Err(err) => {
                warn!(error = %err, "cannot spawn execution unit, running call in place");
                None
            }
        }
    }

    /// Execute a call body in its prepared scope, then release the scope.
    pub(crate) fn run_call(&self, code: &Closure, call_scope: &Scope) -> CallOutcome {
        let mut returned = false;
        let outcome = self.execute_block(code, call_scope, &mut returned);
        finish_call(call_scope, outcome)
    }

    /// Call `code` synchronously with `args` bound, from `caller`.
    fn invoke(&self, code: &Closure, caller: &Scope, args: Value) -> CallOutcome {
        let call_scope = Scope::child(caller);
        if let Err(err) = call_scope.set(Symbol::ARGS, args) {
            return finish_call(&call_scope, Err(err));
        }
        call_scope.detach(Some(
            code.declaration_scope()
                .unwrap_or_else(|| caller.clone()),
        ));
        self.run_call(code, &call_scope)
    }

    /// `new dest block`: run `block` in a fresh field scope and yield the
    /// struct, or whatever different value the block returned.
    pub(super) fn construct(&self, f: &mut Frame<'_>, inst: &Instruction) -> EvalResult<Value> {
        let block = f.read_code(inst, 0)?;
        let fields = Scope::child(f.scope);
        let object = StructValue::construct(fields.clone())?;

        let mut returned = false;
        let outcome = self.execute_block(&block, &fields, &mut returned);
        let joined = fields.join_attached();
        let value = match outcome.and_then(|value| joined.map(|()| value)) {
            Ok(value) => value,
            Err(err) => {
                // Attached units were joined above.
                if let Err(release_err) = fields.release() {
                    warn!(error = %release_err.message, "constructor scope release failed");
                }
                return Err(err);
            }
        };

        let this = Value::Struct(object);
        match value {
            Some(other) if !other.ptr_eq(&this) => {
                let other = escape(other);
                if !holds_scopes(&other) {
                    fields.release()?;
                }
                debug!(result = other.type_name(), "constructor returned another value");
                Ok(other)
            }
            _ => Ok(this),
        }
    }

    /// Apply `op`, giving a struct first operand the chance to overload it.
    pub(super) fn operator(
        &self,
        f: &mut Frame<'_>,
        inst: &Instruction,
        op: Operator,
    ) -> EvalResult<Option<Value>> {
        let operands = f.read_operands(inst)?;
        let method = match operands.first() {
            Some(Value::Struct(object)) => self.overload(f, object, op)?,
            _ => None,
        };
        match method {
            Some(method) => self.invoke(&method, f.scope, Value::list(operands.into_vec())),
            None => dispatch(op, &operands),
        }
    }

    /// The `\<mnemonic>` field of `object`, bound to the struct.
    pub(super) fn overload(
        &self,
        f: &Frame<'_>,
        object: &StructValue,
        op: Operator,
    ) -> EvalResult<Option<Closure>> {
        let name = format!("\\{}", op.mnemonic());
        let Some(field) = f.symbols().get(&name) else {
            return Ok(None);
        };
        let fields = object.scope()?;
        match fields.get_local_or_null(field)? {
            Some(Value::Code(method)) => Ok(Some(method.rebind(Declaration::Strong(fields)))),
            _ => Ok(None),
        }
    }

    /// String form of `value`, honouring a struct's `\str` overload.
    pub(super) fn stringify(&self, f: &Frame<'_>, value: &Value) -> EvalResult<String> {
        if let Value::Struct(object) = value {
            if let Some(method) = self.overload(f, object, Operator::ToStr)? {
                let args = Value::list(vec![value.clone()]);
                if let Some(text) = self.invoke(&method, f.scope, args)? {
                    return Ok(text.to_string());
                }
            }
        }
        Ok(value.to_string())
    }
}

/// The `\call` field of a struct, bound to the struct.
fn struct_callable(object: &StructValue) -> EvalResult<Closure> {
    let fields = object.scope()?;
    match fields.get_local_or_null(Symbol::CALL)? {
        Some(Value::Code(code)) => Ok(code.rebind(Declaration::Strong(fields))),
        Some(other) => Err(not_callable(other.type_name())),
        None => Err(undefined_symbol(Symbol::CALL)),
    }
}

/// Whether `value` may still reference scopes created by the constructor.
fn holds_scopes(value: &Value) -> bool {
    !matches!(
        value,
        Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Str(_)
            | Value::Vector(_)
            | Value::Code(_)
            | Value::Error(_)
            | Value::File(_)
    )
}
