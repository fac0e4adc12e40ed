//! Interned variable identifier.
//!
//! Every variable name in a compiled program is replaced by a compact
//! 32-bit id handed out by [`SymbolTable`](crate::SymbolTable).

use std::fmt;
use std::hash::{Hash, Hasher};

/// Interned variable identifier.
///
/// Ids are dense and assigned in interning order. The first few ids are
/// reserved for names the virtual machine treats specially.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
#[repr(transparent)]
pub struct Symbol(u32);

impl Symbol {
    /// `this`: the self-reference bound inside every struct.
    pub const THIS: Symbol = Symbol(0);

    /// `#`: the "no value" placeholder used for absent destinations and operands.
    pub const NONE: Symbol = Symbol(1);

    /// `args`: the operand list bound when a struct overloads an operator.
    pub const ARGS: Symbol = Symbol(2);

    /// `\call`: the field invoked when a struct is called like a code block.
    pub const CALL: Symbol = Symbol(3);

    /// Number of reserved ids.
    pub const RESERVED: u32 = 4;

    /// Create from a raw id.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Symbol(raw)
    }

    /// Get the raw id.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether this is the "no value" placeholder.
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }
}

impl Hash for Symbol {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "symbol {}", self.0)
    }
}
