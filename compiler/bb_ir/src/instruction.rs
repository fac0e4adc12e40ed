//! Instructions and their source locations.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::{Opcode, Symbol, SymbolTable};

/// A compiled source file, shared by every instruction it produced.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceFile {
    pub path: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>) -> Arc<Self> {
        Arc::new(SourceFile { path: path.into() })
    }
}

/// File and line an instruction was emitted from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: Arc<SourceFile>,
    /// 1-based line in the bytecode listing.
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: Arc<SourceFile>, line: u32) -> Self {
        SourceLocation { file, line }
    }

    /// Location used for instructions built in memory rather than loaded.
    pub fn synthetic() -> Self {
        SourceLocation {
            file: SourceFile::new("<memory>"),
            line: 0,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} line {}", self.file.path, self.line)
    }
}

bitflags! {
    /// Operands known to resolve in the executing scope without walking parents.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct LocalOperands: u8 {
        const DEST = 1 << 0;
        const ARG0 = 1 << 1;
        const ARG1 = 1 << 2;
        const ARG2 = 1 << 3;
    }
}

impl LocalOperands {
    /// Flag for the operand at `index` in [`Instruction::args`].
    pub const fn arg(index: usize) -> Self {
        match index {
            0 => LocalOperands::ARG0,
            1 => LocalOperands::ARG1,
            2 => LocalOperands::ARG2,
            _ => LocalOperands::empty(),
        }
    }
}

/// Literal payload of a `BUILTIN` instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "B{b}"),
            Literal::Int(n) => write!(f, "I{n}"),
            Literal::Float(x) => write!(f, "F{x}"),
            Literal::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

/// One bytecode instruction.
///
/// `dest` is [`Symbol::NONE`] when the result is discarded. Instructions are
/// immutable once loaded; memoized runtime state lives beside them in the
/// runtime's program representation.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub dest: Symbol,
    pub args: SmallVec<[Symbol; 3]>,
    pub local: LocalOperands,
    pub literal: Option<Literal>,
    pub location: SourceLocation,
    /// Source text the front end attached for diagnostics.
    pub context: Option<Arc<str>>,
}

impl Instruction {
    pub fn new(opcode: Opcode, dest: Symbol, args: &[Symbol]) -> Self {
        Instruction {
            opcode,
            dest,
            args: SmallVec::from_slice(args),
            local: LocalOperands::empty(),
            literal: None,
            location: SourceLocation::synthetic(),
            context: None,
        }
    }

    /// A `BUILTIN` instruction loading `literal` into `dest`.
    pub fn builtin(dest: Symbol, literal: Literal) -> Self {
        Instruction {
            literal: Some(literal),
            ..Instruction::new(Opcode::Builtin, dest, &[])
        }
    }

    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<Arc<str>>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[must_use]
    pub fn with_local(mut self, local: LocalOperands) -> Self {
        self.local = local;
        self
    }

    /// Operand at `index`, or [`Symbol::NONE`] when absent.
    #[inline]
    pub fn arg(&self, index: usize) -> Symbol {
        self.args.get(index).copied().unwrap_or(Symbol::NONE)
    }

    /// Whether the operand at `index` is flagged as known-local.
    #[inline]
    pub fn arg_is_local(&self, index: usize) -> bool {
        self.local.contains(LocalOperands::arg(index))
    }

    /// Render the instruction the way it appears in a bytecode listing.
    pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> InstructionDisplay<'a> {
        InstructionDisplay {
            instruction: self,
            symbols,
        }
    }
}

/// Listing form of an [`Instruction`], see [`Instruction::display`].
pub struct InstructionDisplay<'a> {
    instruction: &'a Instruction,
    symbols: &'a SymbolTable,
}

impl fmt::Display for InstructionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inst = self.instruction;
        write!(
            f,
            "{} {}",
            inst.opcode.mnemonic(),
            self.symbols.name(inst.dest)
        )?;
        if let Some(literal) = &inst.literal {
            write!(f, " {literal}")?;
        }
        for arg in &inst.args {
            write!(f, " {}", self.symbols.name(*arg))?;
        }
        Ok(())
    }
}
