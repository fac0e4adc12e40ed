//! Opcodes and builtin operators.
//!
//! Mnemonics match the textual bytecode emitted by the front end.

use std::fmt;

/// Builtin operator resolved by the value dispatch table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    // Logical
    Not,
    And,
    Or,

    // Comparison
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Log,

    // Containers
    Len,
    Push,
    Pop,
    Next,
    Put,
    At,
    Shape,

    // Reductions
    Sum,
    Max,
    Min,

    // Conversions
    ToVector,
    ToInt,
    ToFloat,
    ToStr,
    ToBool,
    ToFile,
    Copy,
}

impl Operator {
    /// Every operator, in mnemonic-table order.
    pub const ALL: [Operator; 33] = [
        Operator::Not,
        Operator::And,
        Operator::Or,
        Operator::Eq,
        Operator::Neq,
        Operator::Lt,
        Operator::Le,
        Operator::Gt,
        Operator::Ge,
        Operator::Add,
        Operator::Sub,
        Operator::Mul,
        Operator::Div,
        Operator::Mod,
        Operator::Pow,
        Operator::Log,
        Operator::Len,
        Operator::Push,
        Operator::Pop,
        Operator::Next,
        Operator::Put,
        Operator::At,
        Operator::Shape,
        Operator::Sum,
        Operator::Max,
        Operator::Min,
        Operator::ToVector,
        Operator::ToInt,
        Operator::ToFloat,
        Operator::ToStr,
        Operator::ToBool,
        Operator::ToFile,
        Operator::Copy,
    ];

    /// Bytecode mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Operator::Not => "not",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Add => "add",
            Operator::Sub => "sub",
            Operator::Mul => "mul",
            Operator::Div => "div",
            Operator::Mod => "mod",
            Operator::Pow => "pow",
            Operator::Log => "log",
            Operator::Len => "len",
            Operator::Push => "push",
            Operator::Pop => "pop",
            Operator::Next => "next",
            Operator::Put => "put",
            Operator::At => "at",
            Operator::Shape => "shape",
            Operator::Sum => "sum",
            Operator::Max => "max",
            Operator::Min => "min",
            Operator::ToVector => "Vector",
            Operator::ToInt => "int",
            Operator::ToFloat => "float",
            Operator::ToStr => "str",
            Operator::ToBool => "bool",
            Operator::ToFile => "file",
            Operator::Copy => "copy",
        }
    }

    /// Parse a mnemonic.
    pub fn from_mnemonic(text: &str) -> Option<Operator> {
        Self::ALL.iter().copied().find(|op| op.mnemonic() == text)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Instruction opcode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Load a literal.
    Builtin,
    /// Open a code block; the closure is rebuilt on every visit.
    Begin,
    /// Open a code block memoized per declaring scope.
    BeginCached,
    /// Open a code block bound to a final variable.
    BeginFinal,
    /// Close the innermost code block.
    End,
    /// Invoke a closure (usually on a new execution unit).
    Call,
    /// Leave the enclosing call with an optional value.
    Return,
    /// Read a struct field or closure metadata entry.
    Get,
    /// Plain assignment; re-raises Error values.
    Is,
    /// Assignment that tolerates and consumes Error values.
    As,
    /// Test whether a symbol holds a non-Error value.
    Exists,
    /// Write a struct field.
    Set,
    /// Write a closure metadata entry.
    SetFinal,
    While,
    If,
    Try,
    Catch,
    /// Splice a struct or block into the current scope.
    Inline,
    /// Fill only missing bindings from a struct or block.
    Default,
    /// Construct a struct.
    New,
    /// Mark a binding final.
    Final,
    /// Raise an error.
    Fail,
    Print,
    /// Seconds since the virtual machine started.
    Time,
    /// Pack operands into a new list.
    List,
    /// Generic operator routed through the value dispatch table.
    Op(Operator),
}

impl Opcode {
    /// Bytecode mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Builtin => "BUILTIN",
            Opcode::Begin => "BEGIN",
            Opcode::BeginCached => "BEGINCACHED",
            Opcode::BeginFinal => "BEGINFINAL",
            Opcode::End => "END",
            Opcode::Call => "call",
            Opcode::Return => "return",
            Opcode::Get => "get",
            Opcode::Is => "IS",
            Opcode::As => "AS",
            Opcode::Exists => "exists",
            Opcode::Set => "set",
            Opcode::SetFinal => "setfinal",
            Opcode::While => "while",
            Opcode::If => "if",
            Opcode::Try => "try",
            Opcode::Catch => "catch",
            Opcode::Inline => "inline",
            Opcode::Default => "default",
            Opcode::New => "new",
            Opcode::Final => "final",
            Opcode::Fail => "fail",
            Opcode::Print => "print",
            Opcode::Time => "time",
            Opcode::List => "List",
            Opcode::Op(op) => op.mnemonic(),
        }
    }

    /// Parse a mnemonic.
    pub fn from_mnemonic(text: &str) -> Option<Opcode> {
        let opcode = match text {
            "BUILTIN" => Opcode::Builtin,
            "BEGIN" => Opcode::Begin,
            "BEGINCACHED" => Opcode::BeginCached,
            "BEGINFINAL" => Opcode::BeginFinal,
            "END" => Opcode::End,
            "call" => Opcode::Call,
            "return" => Opcode::Return,
            "get" => Opcode::Get,
            "IS" => Opcode::Is,
            "AS" => Opcode::As,
            "exists" => Opcode::Exists,
            "set" => Opcode::Set,
            "setfinal" => Opcode::SetFinal,
            "while" => Opcode::While,
            "if" => Opcode::If,
            "try" => Opcode::Try,
            "catch" => Opcode::Catch,
            "inline" => Opcode::Inline,
            "default" => Opcode::Default,
            "new" => Opcode::New,
            "final" => Opcode::Final,
            "fail" => Opcode::Fail,
            "print" => Opcode::Print,
            "time" => Opcode::Time,
            "List" => Opcode::List,
            other => return Operator::from_mnemonic(other).map(Opcode::Op),
        };
        Some(opcode)
    }

    /// Whether this opcode opens a nested code block.
    #[inline]
    pub const fn opens_block(self) -> bool {
        matches!(
            self,
            Opcode::Begin | Opcode::BeginCached | Opcode::BeginFinal
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
