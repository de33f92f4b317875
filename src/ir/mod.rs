//! Host intermediate representation consumed by the planner.
//!
//! Three small pieces:
//! - expr: sum-typed expression nodes in an arena pool
//! - cfg: basic blocks and the loop region under consideration
//! - types: coarse value types as the host's inference reports them

pub mod expr;
pub mod cfg;
pub mod types;

pub use expr::{Expr, ExprId, ExprPool};
pub use cfg::{BasicBlock, BlockId, Cfg, LoopExit, LoopRegion, Stmt};
pub use types::{SymbolTypes, ValueType, numbers_or_arrays, symbol_type};
