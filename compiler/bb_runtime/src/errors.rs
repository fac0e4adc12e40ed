//! Error types raised while executing bytecode.
//!
//! `EvalErrorKind` provides typed categories; factory functions are the
//! public API and populate both `kind` and `message`. Errors that mention a
//! variable carry its [`Symbol`] and are rendered with real names once a
//! [`SymbolTable`] is at hand (see [`EvalError::resolve_symbols`]).
//!
//! An `EvalError` is the Rust-level failure that unwinds an instruction
//! range. It only becomes first-class data when a `try` intercepts it and
//! turns it into an Error value.

use std::fmt;

use bb_ir::{Operator, Symbol, SymbolTable};

/// Result of evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Bindings
    UndefinedSymbol {
        symbol: Symbol,
    },
    MutableFromNestedBlock {
        symbol: Symbol,
    },
    FinalViolation {
        symbol: Symbol,
    },

    // Operators
    UnsupportedOperator {
        op: Operator,
        operands: Vec<&'static str>,
    },
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },
    IndexOutOfRange {
        index: i64,
        len: usize,
    },
    ShapeMismatch {
        left: String,
        right: String,
    },
    ModuloByZero,

    // Calls and fields
    NotCallable {
        type_name: &'static str,
    },
    IllegalClosureCapture,
    TemporaryField {
        symbol: Symbol,
    },
    MissingMetadata {
        symbol: Symbol,
    },
    MetadataRedefined {
        symbol: Symbol,
    },

    // Raised by programs
    Failed {
        message: String,
    },
    SpawnedUnitFailed {
        message: String,
    },

    // Host
    Io {
        path: String,
        message: String,
    },

    // Malformed bytecode
    UnbalancedBlock,
    MalformedInstruction {
        reason: String,
    },

    /// Catch-all for one-off failures.
    Custom {
        message: String,
    },
}

impl EvalErrorKind {
    /// The symbol this kind mentions, if any.
    fn symbol(&self) -> Option<Symbol> {
        match self {
            Self::UndefinedSymbol { symbol }
            | Self::MutableFromNestedBlock { symbol }
            | Self::FinalViolation { symbol }
            | Self::TemporaryField { symbol }
            | Self::MissingMetadata { symbol }
            | Self::MetadataRedefined { symbol } => Some(*symbol),
            _ => None,
        }
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, name: &dyn fmt::Display) -> fmt::Result {
        match self {
            Self::UndefinedSymbol { .. } => write!(f, "Missing value: {name}"),
            Self::MutableFromNestedBlock { .. } => write!(
                f,
                "Mutable symbol cannot be accessed from a nested block: {name}"
            ),
            Self::FinalViolation { .. } => {
                write!(f, "Cannot overwrite final value: {name}")
            }
            Self::UnsupportedOperator { op, operands } => {
                write!(f, "No builtin implementation for {op}({})", operands.join(", "))
            }
            Self::TypeMismatch { expected, got } => {
                write!(f, "Expected {expected} but got {got}")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "Index {index} out of range [0,{len})")
            }
            Self::ShapeMismatch { left, right } => {
                write!(f, "Vector shapes do not match: {left} vs {right}")
            }
            Self::ModuloByZero => write!(f, "Modulo by zero"),
            Self::NotCallable { type_name } => {
                write!(f, "Only structs or code blocks can be called, got {type_name}")
            }
            Self::IllegalClosureCapture => write!(
                f,
                "Cannot set a code block to a struct field when it was declared inside that struct"
            ),
            Self::TemporaryField { .. } => {
                write!(f, "Cannot access temporary variable as a field: {name}")
            }
            Self::MissingMetadata { .. } => {
                write!(f, "Code block has no specification entry: {name}")
            }
            Self::MetadataRedefined { .. } => {
                write!(f, "Code block already has the specification entry: {name}")
            }
            Self::Failed { message }
            | Self::SpawnedUnitFailed { message }
            | Self::MalformedInstruction { reason: message }
            | Self::Custom { message } => f.write_str(message),
            Self::Io { path, message } => write!(f, "Cannot access {path}: {message}"),
            Self::UnbalancedBlock => write!(f, "Code block never ended"),
        }
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.symbol() {
            Some(symbol) => self.render(f, &symbol),
            None => self.render(f, &""),
        }
    }
}

/// Kind rendered with a resolved symbol name.
struct Resolved<'a> {
    kind: &'a EvalErrorKind,
    name: &'a str,
}

impl fmt::Display for Resolved<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.render(f, &self.name)
    }
}

/// Evaluation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    /// Structured error category.
    pub kind: EvalErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Breadcrumb trail, innermost instruction first.
    pub frames: Vec<String>,
    /// Whether a `try` may intercept this error.
    pub recoverable: bool,
}

impl EvalError {
    /// Create an error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        EvalError::from_kind(EvalErrorKind::Custom { message })
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        let recoverable = !matches!(
            kind,
            EvalErrorKind::UnbalancedBlock | EvalErrorKind::MalformedInstruction { .. }
        );
        EvalError {
            kind,
            message,
            frames: Vec::new(),
            recoverable,
        }
    }

    /// Re-render the message with symbol names from `symbols`.
    #[must_use]
    pub fn resolve_symbols(mut self, symbols: &SymbolTable) -> Self {
        if let Some(symbol) = self.kind.symbol() {
            self.message = Resolved {
                kind: &self.kind,
                name: symbols.name(symbol),
            }
            .to_string();
        }
        self
    }

    /// Append a breadcrumb as the error unwinds through an instruction.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.frames.push(frame.into());
        self
    }

    #[inline]
    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        for frame in &self.frames {
            write!(f, "\n   \u{2192} {frame}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

// Binding errors

/// Symbol resolves to nothing in the scope chain.
#[cold]
pub fn undefined_symbol(symbol: Symbol) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedSymbol { symbol })
}

/// A non-final ancestor binding was read through a call boundary.
#[cold]
pub fn mutable_from_nested_block(symbol: Symbol) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MutableFromNestedBlock { symbol })
}

/// Attempt to overwrite a final binding.
#[cold]
pub fn final_violation(symbol: Symbol) -> EvalError {
    EvalError::from_kind(EvalErrorKind::FinalViolation { symbol })
}

// Operator errors

/// No dispatch entry for the operator and operand types.
#[cold]
pub fn unsupported_operator(op: Operator, operands: &[&'static str]) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnsupportedOperator {
        op,
        operands: operands.to_vec(),
    })
}

#[cold]
pub fn type_mismatch(expected: &'static str, got: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch { expected, got })
}

#[cold]
pub fn index_out_of_range(index: i64, len: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IndexOutOfRange { index, len })
}

#[cold]
pub fn shape_mismatch(left: &[usize], right: &[usize]) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ShapeMismatch {
        left: format!("{left:?}"),
        right: format!("{right:?}"),
    })
}

#[cold]
pub fn modulo_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::ModuloByZero)
}

// Call and field errors

#[cold]
pub fn not_callable(type_name: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable { type_name })
}

/// A struct's own closure would be stored back into one of its fields.
#[cold]
pub fn illegal_closure_capture() -> EvalError {
    EvalError::from_kind(EvalErrorKind::IllegalClosureCapture)
}

#[cold]
pub fn temporary_field(symbol: Symbol) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TemporaryField { symbol })
}

#[cold]
pub fn missing_metadata(symbol: Symbol) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MissingMetadata { symbol })
}

#[cold]
pub fn metadata_redefined(symbol: Symbol) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MetadataRedefined { symbol })
}

// Program-raised errors

/// Raised by `fail` or by re-raising an Error value.
#[cold]
pub fn failed(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Failed {
        message: message.into(),
    })
}

/// A spawned execution unit ended with an error or panicked.
#[cold]
pub fn spawned_unit_failed(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::SpawnedUnitFailed {
        message: message.into(),
    })
}

#[cold]
pub fn io_error(path: &str, err: &std::io::Error) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Io {
        path: path.to_string(),
        message: err.to_string(),
    })
}

// Malformed bytecode

#[cold]
pub fn unbalanced_block() -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnbalancedBlock)
}

#[cold]
pub fn malformed_instruction(reason: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MalformedInstruction {
        reason: reason.into(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
