//! Liveness oracle interface.
//!
//! Liveness is computed by the host; the planner only queries it to decide
//! which arrays need reordering after the decider and un-reordering on the
//! loop's exit edges.

use std::collections::{HashMap, HashSet};
use crate::ir::cfg::BlockId;
use crate::utils::intern::Symbol;

/// A set of symbols, as the host's dataflow analysis produces them.
pub type SymbolSet = HashSet<Symbol>;

/// Host-provided liveness information.
pub trait LivenessOracle {
    /// Symbols defined by the statement.
    fn defs(&self, block: BlockId, stmt: usize) -> SymbolSet;
    /// Symbols used by the statement.
    fn uses(&self, block: BlockId, stmt: usize) -> SymbolSet;
    /// Symbols live on entry to the block.
    fn live_in(&self, block: BlockId) -> SymbolSet;
    /// Symbols live on exit from the block.
    fn live_out(&self, block: BlockId) -> SymbolSet;
    /// Symbols live immediately after the statement.
    fn live_out_at(&self, block: BlockId, stmt: usize) -> SymbolSet;
}

/// Table-backed oracle for hosts with precomputed liveness, and for tests.
///
/// Unset entries are empty sets.
#[derive(Debug, Clone, Default)]
pub struct TableLiveness {
    defs: HashMap<(BlockId, usize), SymbolSet>,
    uses: HashMap<(BlockId, usize), SymbolSet>,
    live_in: HashMap<BlockId, SymbolSet>,
    live_out: HashMap<BlockId, SymbolSet>,
    live_out_at: HashMap<(BlockId, usize), SymbolSet>,
}

impl TableLiveness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_defs(&mut self, block: BlockId, stmt: usize, symbols: &[Symbol]) -> &mut Self {
        self.defs.insert((block, stmt), symbols.iter().copied().collect());
        self
    }

    pub fn set_uses(&mut self, block: BlockId, stmt: usize, symbols: &[Symbol]) -> &mut Self {
        self.uses.insert((block, stmt), symbols.iter().copied().collect());
        self
    }

    pub fn set_live_in(&mut self, block: BlockId, symbols: &[Symbol]) -> &mut Self {
        self.live_in.insert(block, symbols.iter().copied().collect());
        self
    }

    pub fn set_live_out(&mut self, block: BlockId, symbols: &[Symbol]) -> &mut Self {
        self.live_out.insert(block, symbols.iter().copied().collect());
        self
    }

    pub fn set_live_out_at(&mut self, block: BlockId, stmt: usize, symbols: &[Symbol]) -> &mut Self {
        self.live_out_at.insert((block, stmt), symbols.iter().copied().collect());
        self
    }
}

impl LivenessOracle for TableLiveness {
    fn defs(&self, block: BlockId, stmt: usize) -> SymbolSet {
        self.defs.get(&(block, stmt)).cloned().unwrap_or_default()
    }

    fn uses(&self, block: BlockId, stmt: usize) -> SymbolSet {
        self.uses.get(&(block, stmt)).cloned().unwrap_or_default()
    }

    fn live_in(&self, block: BlockId) -> SymbolSet {
        self.live_in.get(&block).cloned().unwrap_or_default()
    }

    fn live_out(&self, block: BlockId) -> SymbolSet {
        self.live_out.get(&block).cloned().unwrap_or_default()
    }

    fn live_out_at(&self, block: BlockId, stmt: usize) -> SymbolSet {
        self.live_out_at.get(&(block, stmt)).cloned().unwrap_or_default()
    }
}
