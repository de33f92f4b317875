//! Editing actions handed to the downstream code emitter.
//!
//! The planner never mutates the host IR; it appends actions describing
//! the splices the emitter should perform.

use serde::{Serialize, Deserialize};
use crate::ir::cfg::{BlockId, Stmt};

/// One editing action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Splice statements immediately before the loop's entry block.
    InsertBeforeLoopHead {
        /// The loop's head block
        loop_head: BlockId,
        /// Statements to splice
        stmts: Vec<Stmt>,
    },
    /// Splice statements immediately before or after a specific statement.
    InsertBeforeOrAfterStatement {
        /// True to splice before the statement, false for after
        before: bool,
        /// Containing block
        block: BlockId,
        /// Statement index within the block
        index: usize,
        /// Statements to splice
        stmts: Vec<Stmt>,
    },
    /// Place statements on a control-flow edge; the emitter may have to
    /// create a bridge block for them.
    InsertOnEdge {
        from: BlockId,
        to: BlockId,
        stmts: Vec<Stmt>,
    },
    /// A bare host-level IR fragment, opaque to the planner.
    Statement(Stmt),
}

impl Action {
    /// The statements this action carries.
    pub fn stmts(&self) -> &[Stmt] {
        match self {
            Action::InsertBeforeLoopHead { stmts, .. } => stmts,
            Action::InsertBeforeOrAfterStatement { stmts, .. } => stmts,
            Action::InsertOnEdge { stmts, .. } => stmts,
            Action::Statement(stmt) => std::slice::from_ref(stmt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::expr::ExprId;

    #[test]
    fn test_stmts_accessor() {
        let stmt = Stmt::new(ExprId(0));
        let action = Action::Statement(stmt);
        assert_eq!(action.stmts(), &[stmt]);

        let action = Action::InsertOnEdge {
            from: BlockId(1),
            to: BlockId(2),
            stmts: vec![stmt, Stmt::new(ExprId(1))],
        };
        assert_eq!(action.stmts().len(), 2);
    }
}
