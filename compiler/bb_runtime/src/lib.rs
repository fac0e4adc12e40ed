//! Values, scopes and futures for the Blombly virtual machine.
//!
//! This crate provides the runtime data model the interpreter operates on:
//! - [`Value`]: tagged runtime values and their handle types
//! - [`Scope`]: hierarchical binding environments with final bindings and
//!   attached futures
//! - [`Future`]: results of calls running on their own execution unit
//! - [`Program`]: loaded instructions plus per-instruction caches
//! - [`operators::dispatch`]: the builtin operator table
//! - [`EvalError`]: the error taxonomy

mod errors;
mod future;
pub mod operators;
mod program;
mod scope;
mod value;

pub use errors::{
    failed, final_violation, illegal_closure_capture, index_out_of_range, io_error,
    malformed_instruction, metadata_redefined, missing_metadata, modulo_by_zero,
    mutable_from_nested_block, not_callable, shape_mismatch, spawned_unit_failed,
    temporary_field, type_mismatch, unbalanced_block, undefined_symbol, unsupported_operator,
    EvalError, EvalErrorKind, EvalResult,
};
pub use future::{CallOutcome, Future};
pub use program::{InstructionCache, Program};
pub use scope::{Scope, ScopeId, WeakScope};
pub use value::{
    Closure, Declaration, ErrorValue, FileValue, ListValue, Metadata, NumVector, StructValue,
    Value, WeakClosure,
};
