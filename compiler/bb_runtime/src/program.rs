//! Loaded programs and their per-instruction caches.
//!
//! Instructions are immutable. Everything the interpreter memoizes about an
//! instruction lives in a parallel cache slot: the matching `END` of a
//! block, the materialized literal of a `BUILTIN`, and the closure last
//! built by a cached or final block together with the scope it was built in.

use std::sync::{Arc, OnceLock};

use bb_ir::{Instruction, Literal, Opcode, SharedSymbols};
use parking_lot::Mutex;

use crate::errors::{malformed_instruction, unbalanced_block, EvalResult};
use crate::scope::ScopeId;
use crate::value::{Closure, Value, WeakClosure};

/// Memoized state for one instruction.
#[derive(Default)]
pub struct InstructionCache {
    block_end: OnceLock<usize>,
    literal: OnceLock<Value>,
    memo: Mutex<Option<(ScopeId, WeakClosure)>>,
}

struct ProgramInner {
    instructions: Vec<Instruction>,
    cache: Box<[InstructionCache]>,
    symbols: SharedSymbols,
}

/// A loaded instruction list, shared by every closure over it.
#[derive(Clone)]
pub struct Program(Arc<ProgramInner>);

impl Program {
    pub fn new(instructions: Vec<Instruction>, symbols: SharedSymbols) -> Self {
        let cache = instructions
            .iter()
            .map(|_| InstructionCache::default())
            .collect();
        Program(Arc::new(ProgramInner {
            instructions,
            cache,
            symbols,
        }))
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.0.instructions
    }

    pub fn len(&self) -> usize {
        self.0.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.instructions.is_empty()
    }

    pub fn symbols(&self) -> &SharedSymbols {
        &self.0.symbols
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Program) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Index of the `END` matching the block opened at `begin`.
    pub fn block_end(&self, begin: usize) -> EvalResult<usize> {
        let slot = &self.0.cache[begin].block_end;
        if let Some(&end) = slot.get() {
            return Ok(end);
        }
        let end = self.scan_block_end(begin)?;
        Ok(*slot.get_or_init(|| end))
    }

    fn scan_block_end(&self, begin: usize) -> EvalResult<usize> {
        let mut depth = 0usize;
        for (pos, inst) in self.0.instructions.iter().enumerate().skip(begin + 1) {
            if inst.opcode.opens_block() {
                depth += 1;
            } else if inst.opcode == Opcode::End {
                if depth == 0 {
                    return Ok(pos);
                }
                depth -= 1;
            }
        }
        Err(unbalanced_block())
    }

    /// Value of the `BUILTIN` literal at `index`.
    pub fn literal(&self, index: usize) -> EvalResult<Value> {
        let slot = &self.0.cache[index].literal;
        if let Some(value) = slot.get() {
            return Ok(value.clone());
        }
        let value = match &self.0.instructions[index].literal {
            Some(Literal::Bool(b)) => Value::Bool(*b),
            Some(Literal::Int(n)) => Value::Int(*n),
            Some(Literal::Float(x)) => Value::Float(*x),
            Some(Literal::Str(s)) => Value::Str(Arc::clone(s)),
            None => return Err(malformed_instruction("BUILTIN without a literal")),
        };
        Ok(slot.get_or_init(|| value).clone())
    }

    /// Closure memoized at `index` for `scope`, if still alive.
    pub fn memoized(&self, index: usize, scope: ScopeId) -> Option<Closure> {
        let memo = self.0.cache[index].memo.lock();
        match &*memo {
            Some((id, closure)) if *id == scope => closure.upgrade(),
            _ => None,
        }
    }

    /// Remember `closure` as the block built at `index` in `scope`.
    pub fn memoize(&self, index: usize, scope: ScopeId, closure: &Closure) {
        *self.0.cache[index].memo.lock() = Some((scope, closure.downgrade()));
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("instructions", &self.len())
            .finish()
    }
}
