//! Symbol interning for array and function names.
//!
//! Every identifier the planner touches (array symbols, function names,
//! module names, emitted runtime names) is interned once and passed around
//! as a copyable `Symbol`.

use string_interner::{StringInterner, DefaultSymbol, backend::StringBackend, Symbol as SymbolTrait};
use std::fmt;
use std::sync::RwLock;
use serde::{Serialize, Deserialize};
use once_cell::sync::Lazy;

/// A symbol representing an interned string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(u32);

impl Symbol {
    pub fn as_raw(&self) -> u32 { self.0 }

    /// The interned string, or a placeholder when the symbol is foreign.
    pub fn name(&self) -> String {
        resolve(*self).unwrap_or_else(|| format!("?{}", self.0))
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Process-wide symbol table behind `intern`/`resolve` and `Symbol::name`.
///
/// `Symbol`s carry the table's raw index, so diagnostics, payload sorting
/// and Display all round-trip through here.
#[derive(Debug, Default)]
struct SymbolTable {
    strings: StringInterner<StringBackend<DefaultSymbol>>,
}

impl SymbolTable {
    fn intern(&mut self, text: &str) -> Symbol {
        Symbol(self.strings.get_or_intern(text).to_usize() as u32)
    }

    fn lookup(&self, sym: Symbol) -> Option<String> {
        let raw = DefaultSymbol::try_from_usize(sym.0 as usize)?;
        self.strings.resolve(raw).map(str::to_owned)
    }
}

static SYMBOLS: Lazy<RwLock<SymbolTable>> = Lazy::new(Default::default);

/// Intern a string.
pub fn intern(text: &str) -> Symbol {
    SYMBOLS.write().unwrap().intern(text)
}

/// Resolve a symbol back to its string.
pub fn resolve(sym: Symbol) -> Option<String> {
    SYMBOLS.read().unwrap().lookup(sym)
}

/// Sort symbols lexicographically by their interned names.
///
/// Set iteration order is not deterministic; every emitted argument list is
/// run through this first so plans are reproducible.
pub fn sort_by_name(symbols: &mut [Symbol]) {
    symbols.sort_by_key(|s| s.name());
}

/// Well-known symbols that are pre-interned.
pub mod names {
    use super::Symbol;
    use once_cell::sync::Lazy;

    /// Module holding base operators (`*`, `+`, `dot`, ...).
    pub static BASE: Lazy<Symbol> = Lazy::new(|| super::intern("base"));
    /// Module holding the accelerator library and runtime entry points.
    pub static SPARSELIB: Lazy<Symbol> = Lazy::new(|| super::intern("sparselib"));
    /// Pseudo-function for plain assignments.
    pub static ASSIGN: Lazy<Symbol> = Lazy::new(|| super::intern(":="));
    /// Separates the matrix section from the vector section in runtime calls.
    pub static DELIMITOR: Lazy<Symbol> = Lazy::new(|| super::intern("__delimitor__"));
    pub static SET_DECISION_MAKER: Lazy<Symbol> =
        Lazy::new(|| super::intern("set_reordering_decision_maker"));
    pub static REORDERING: Lazy<Symbol> = Lazy::new(|| super::intern("reordering"));
    pub static REVERSE_REORDERING: Lazy<Symbol> =
        Lazy::new(|| super::intern("reverse_reordering"));
    /// Null pointer constant threaded through the status tuple.
    pub static C_NULL: Lazy<Symbol> = Lazy::new(|| super::intern("C_NULL"));
}
