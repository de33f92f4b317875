//! Control-flow view of the host routine.
//!
//! The planner never builds a CFG itself; the host hands one in together
//! with the loop region under consideration. Blocks are kept in an ordered
//! map so that "members in source order" is a plain iteration.

use serde::{Serialize, Deserialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use crate::ir::expr::ExprId;

/// A unique identifier for basic blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

/// A statement: one top-level expression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    /// The statement's expression node
    pub expr: ExprId,
}

impl Stmt {
    pub fn new(expr: ExprId) -> Self {
        Self { expr }
    }
}

/// A basic block: an ordered statement list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    /// Block identifier
    pub id: BlockId,
    /// Statements in execution order
    pub stmts: Vec<Stmt>,
}

impl BasicBlock {
    pub fn new(id: BlockId) -> Self {
        Self { id, stmts: Vec::new() }
    }

    /// Append a statement, returning its index.
    pub fn push_stmt(&mut self, expr: ExprId) -> usize {
        self.stmts.push(Stmt::new(expr));
        self.stmts.len() - 1
    }
}

/// The routine's control-flow graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cfg {
    blocks: BTreeMap<BlockId, BasicBlock>,
}

impl Cfg {
    pub fn new() -> Self {
        Self { blocks: BTreeMap::new() }
    }

    /// Insert an empty block and return a mutable reference to it.
    pub fn add_block(&mut self, id: BlockId) -> &mut BasicBlock {
        self.blocks.entry(id).or_insert_with(|| BasicBlock::new(id))
    }

    /// Get a block by id.
    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(&id)
    }

    /// All blocks in id order.
    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.values()
    }

    pub fn len(&self) -> usize { self.blocks.len() }
    pub fn is_empty(&self) -> bool { self.blocks.is_empty() }
}

/// A loop exit edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopExit {
    /// Loop-member block the edge leaves
    pub from: BlockId,
    /// Block outside the loop the edge enters
    pub to: BlockId,
}

/// The loop the planner is asked to reorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopRegion {
    /// Entry block of the loop
    pub head: BlockId,
    /// Member blocks, head included
    pub members: BTreeSet<BlockId>,
    /// Exit edges in source order
    pub exits: Vec<LoopExit>,
}

impl LoopRegion {
    /// Create a region containing only its head.
    pub fn new(head: BlockId) -> Self {
        let mut members = BTreeSet::new();
        members.insert(head);
        Self { head, members, exits: Vec::new() }
    }

    pub fn with_member(mut self, id: BlockId) -> Self {
        self.members.insert(id);
        self
    }

    pub fn with_exit(mut self, from: BlockId, to: BlockId) -> Self {
        self.exits.push(LoopExit { from, to });
        self
    }
}
