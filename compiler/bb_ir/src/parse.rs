//! Loader for the textual bytecode listing.
//!
//! Each non-empty line holds one instruction: `mnemonic dest arg1 arg2 arg3`.
//! Tokens are separated by spaces and a double-quoted token may contain
//! spaces. Lines starting with `%` carry front-end source text; they emit no
//! instruction and their text becomes the diagnostic context of the
//! instructions that follow.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::{
    Instruction, Literal, LocalOperands, Opcode, SourceFile, SourceLocation, Symbol, SymbolTable,
};

/// Error produced while loading a listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based line of the offending instruction.
    pub line: u32,
    pub reason: String,
}

impl ParseError {
    #[cold]
    fn new(line: u32, reason: impl Into<String>) -> Self {
        ParseError {
            line,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

impl std::error::Error for ParseError {}

/// Most operands an instruction may carry.
const MAX_ARGS: usize = 3;

/// Parse a whole listing, interning every name into `symbols`.
pub fn parse_program(
    text: &str,
    path: &str,
    symbols: &SymbolTable,
) -> Result<Vec<Instruction>, ParseError> {
    let file = SourceFile::new(path);
    let mut instructions = Vec::new();
    let mut context: Option<Arc<str>> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = u32::try_from(index + 1).unwrap_or(u32::MAX);
        let trimmed = raw.trim_end();
        if let Some(source) = trimmed.strip_prefix('%') {
            let source = source.trim();
            context = (!source.is_empty()).then(|| Arc::from(source));
            continue;
        }
        if trimmed.trim().is_empty() {
            continue;
        }

        let mut instruction =
            parse_line(trimmed, line, symbols)?.at(SourceLocation::new(Arc::clone(&file), line));
        instruction.context.clone_from(&context);
        instructions.push(instruction);
    }

    Ok(instructions)
}

/// Parse a single instruction line.
pub fn parse_line(line_text: &str, line: u32, symbols: &SymbolTable) -> Result<Instruction, ParseError> {
    let tokens = tokenize(line_text, line)?;
    let Some((mnemonic, rest)) = tokens.split_first() else {
        return Err(ParseError::new(line, "empty instruction"));
    };
    let opcode = Opcode::from_mnemonic(mnemonic)
        .ok_or_else(|| ParseError::new(line, format!("unknown instruction `{mnemonic}`")))?;

    let (dest, operands) = match rest.split_first() {
        Some((dest, operands)) => (symbols.intern(dest), operands),
        None => (Symbol::NONE, &[][..]),
    };
    let mut local = LocalOperands::empty();
    if rest
        .first()
        .is_some_and(|name| SymbolTable::is_temporary_name(name))
    {
        local |= LocalOperands::DEST;
    }

    if opcode == Opcode::Builtin {
        let [literal] = operands else {
            return Err(ParseError::new(
                line,
                "BUILTIN expects a destination and exactly one literal",
            ));
        };
        return Ok(Instruction::builtin(dest, parse_literal(literal, line)?).with_local(local));
    }

    if operands.len() > MAX_ARGS {
        return Err(ParseError::new(
            line,
            format!(
                "`{mnemonic}` has {} operands, at most {MAX_ARGS} are allowed",
                operands.len()
            ),
        ));
    }

    let mut args: SmallVec<[Symbol; 3]> = SmallVec::new();
    for (i, name) in operands.iter().enumerate() {
        if SymbolTable::is_temporary_name(name) {
            local |= LocalOperands::arg(i);
        }
        args.push(symbols.intern(name));
    }

    Ok(Instruction {
        args,
        ..Instruction::new(opcode, dest, &[])
    }
    .with_local(local))
}

/// Split on spaces, keeping double-quoted tokens (quotes included) whole.
fn tokenize(text: &str, line: u32) -> Result<Vec<String>, ParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for ch in text.chars() {
        if in_quotes {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_quotes = false;
            }
            continue;
        }
        match ch {
            ' ' | '\t' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            '"' => {
                in_quotes = true;
                current.push(ch);
            }
            _ => current.push(ch),
        }
    }

    if in_quotes {
        return Err(ParseError::new(line, "unterminated string literal"));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

fn parse_literal(token: &str, line: u32) -> Result<Literal, ParseError> {
    if let Some(quoted) = token.strip_prefix('"') {
        let body = quoted
            .strip_suffix('"')
            .ok_or_else(|| ParseError::new(line, "unterminated string literal"))?;
        return Ok(Literal::Str(Arc::from(unescape(body))));
    }

    let bad = |kind: &str| ParseError::new(line, format!("invalid {kind} literal `{token}`"));
    match token.split_at_checked(1) {
        Some(("I", digits)) => digits.parse().map(Literal::Int).map_err(|_| bad("integer")),
        Some(("F", digits)) => digits.parse().map(Literal::Float).map_err(|_| bad("float")),
        Some(("B", "true")) => Ok(Literal::Bool(true)),
        Some(("B", "false")) => Ok(Literal::Bool(false)),
        Some(("B", _)) => Err(bad("boolean")),
        _ => Err(ParseError::new(
            line,
            format!("unknown literal `{token}`, expected \"text\", I<int>, F<float> or B<bool>"),
        )),
    }
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
