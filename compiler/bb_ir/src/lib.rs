//! Bytecode instruction model for the Blombly virtual machine.
//!
//! This crate owns the pieces the front end and the virtual machine agree
//! on: interned [`Symbol`]s, the [`Opcode`] set, [`Instruction`]s with their
//! source locations, and a loader for the textual listing format.

mod instruction;
mod opcode;
mod parse;
mod symbol;
mod symbol_table;

pub use instruction::{
    Instruction, InstructionDisplay, Literal, LocalOperands, SourceFile, SourceLocation,
};
pub use opcode::{Opcode, Operator};
pub use parse::{parse_line, parse_program, ParseError};
pub use symbol::Symbol;
pub use symbol_table::{SharedSymbols, SymbolTable};
