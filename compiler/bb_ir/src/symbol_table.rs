//! Symbol interner shared between the loader and the virtual machine.
//!
//! Provides O(1) interning and lookup with thread-safe concurrent access.
//! Spawned execution units only ever read from the table, so the read
//! path takes a shared lock.

use super::Symbol;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Shared symbol table handle.
pub type SharedSymbols = Arc<SymbolTable>;

/// Storage behind the lock.
struct Tables {
    /// Map from name to id.
    ids: FxHashMap<&'static str, Symbol>,
    /// Names indexed by id.
    names: Vec<&'static str>,
}

/// Interner mapping variable names to stable integer ids.
///
/// `this`, `#`, `args` and `\call` are pre-interned at the ids exposed as
/// constants on [`Symbol`].
pub struct SymbolTable {
    tables: RwLock<Tables>,
}

/// Names a local temporary emitted by the front end starts with.
const TEMPORARY_PREFIX: &str = "_bb";

impl SymbolTable {
    /// Create a table holding only the reserved names.
    pub fn new() -> Self {
        let table = SymbolTable {
            tables: RwLock::new(Tables {
                ids: FxHashMap::default(),
                names: Vec::with_capacity(256),
            }),
        };
        for reserved in ["this", "#", "args", "\\call"] {
            table.intern(reserved);
        }
        debug_assert_eq!(table.get("this"), Some(Symbol::THIS));
        debug_assert_eq!(table.get("\\call"), Some(Symbol::CALL));
        table
    }

    /// Create a new shared table.
    pub fn shared() -> SharedSymbols {
        Arc::new(Self::new())
    }

    /// Intern a name, returning its id.
    pub fn intern(&self, name: &str) -> Symbol {
        // Fast path: already interned
        if let Some(&symbol) = self.tables.read().ids.get(name) {
            return symbol;
        }

        let mut guard = self.tables.write();
        // Double-check after acquiring the write lock
        if let Some(&symbol) = guard.ids.get(name) {
            return symbol;
        }

        // Leak the string to get 'static lifetime; tables live for the process
        let leaked: &'static str = Box::leak(name.to_owned().into_boxed_str());
        let raw = u32::try_from(guard.names.len())
            .unwrap_or_else(|_| panic!("symbol table exceeded {} entries", u32::MAX));
        let symbol = Symbol::from_raw(raw);
        guard.names.push(leaked);
        guard.ids.insert(leaked, symbol);
        symbol
    }

    /// Look up a name without interning it.
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.tables.read().ids.get(name).copied()
    }

    /// Get the name behind an id.
    ///
    /// Ids not handed out by this table render as `<unknown>`.
    pub fn name(&self, symbol: Symbol) -> &'static str {
        self.tables
            .read()
            .names
            .get(symbol.raw() as usize)
            .copied()
            .unwrap_or("<unknown>")
    }

    /// Whether the name behind `symbol` is a front-end temporary (`_bb...`).
    pub fn is_temporary(&self, symbol: Symbol) -> bool {
        self.name(symbol).starts_with(TEMPORARY_PREFIX)
    }

    /// Whether `name` follows the temporary naming convention.
    pub fn is_temporary_name(name: &str) -> bool {
        name.starts_with(TEMPORARY_PREFIX)
    }

    /// Number of interned names, reserved ones included.
    pub fn len(&self) -> usize {
        self.tables.read().names.len()
    }

    /// Always false: reserved names are interned at construction.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolTable")
            .field("len", &self.len())
            .finish()
    }
}
