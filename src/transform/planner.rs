//! Action synthesis from the coloured graph.
//!
//! Three kinds of edits come out of a successful analysis: a preamble
//! before the loop head (register the decision maker, initialise the
//! reordering status), one reorder call right after the decider statement,
//! and one inverse-reorder call per loop exit edge.

use crate::PlannerConfig;
use crate::analysis::idg::{Axis, InterDependenceGraph, PermColor};
use crate::analysis::liveness::LivenessOracle;
use crate::ir::cfg::{BlockId, LoopRegion, Stmt};
use crate::ir::expr::{ExprId, ExprPool};
use crate::ir::types::{SymbolTypes, ValueType, symbol_type};
use crate::transform::actions::Action;
use crate::utils::intern::{Symbol, intern, names, sort_by_name};

/// A matrix payload entry: symbol plus its row and column colours.
type MatrixEntry = (Symbol, PermColor, PermColor);
/// A vector payload entry: symbol plus its row colour.
type VectorEntry = (Symbol, PermColor);

/// Synthesises editing actions for one analysed loop.
pub struct ActionPlanner<'a> {
    pool: &'a mut ExprPool,
    types: &'a SymbolTypes,
    liveness: &'a dyn LivenessOracle,
    config: &'a PlannerConfig,
}

impl<'a> ActionPlanner<'a> {
    pub fn new(
        pool: &'a mut ExprPool,
        types: &'a SymbolTypes,
        liveness: &'a dyn LivenessOracle,
        config: &'a PlannerConfig,
    ) -> Self {
        Self { pool, types, liveness, config }
    }

    /// Append all actions for the loop; returns how many were added.
    pub fn plan(
        &mut self,
        actions: &mut Vec<Action>,
        region: &LoopRegion,
        graph: &InterDependenceGraph,
        far: &[Symbol],
        fknob: Symbol,
        decider_at: (BlockId, usize),
    ) -> usize {
        let before = actions.len();
        let status = intern(&format!("{}_{}", self.config.status_prefix, region.head.0));

        actions.push(self.preamble(region.head, fknob, status));
        actions.push(self.post_decider_reorder(graph, far, fknob, status, decider_at));
        for exit in &region.exits {
            if let Some(action) = self.exit_reverse_reorder(graph, status, exit.from, exit.to) {
                actions.push(action);
            }
        }

        actions.len() - before
    }

    /// Before the loop: register the decision maker, initialise the status
    /// tuple `(false, C_NULL, C_NULL, C_NULL, C_NULL, 0.0)`.
    fn preamble(&mut self, loop_head: BlockId, fknob: Symbol, status: Symbol) -> Action {
        let runtime = self.config.runtime_module;

        let callee = self.pool.global(runtime, *names::SET_DECISION_MAKER);
        let fknob_ref = self.pool.sym(fknob);
        let register = self.pool.call(callee, vec![fknob_ref], ValueType::Other);

        let done = self.pool.boolean(false);
        let mut items = vec![done];
        for _ in 0..4 {
            let null = self.pool.global(runtime, *names::C_NULL);
            items.push(null);
        }
        let time = self.pool.float(0.0);
        items.push(time);
        let tuple = self.pool.tuple(items);
        let status_ref = self.pool.sym(status);
        let init = self.pool.assign(status_ref, tuple);

        Action::InsertBeforeLoopHead {
            loop_head,
            stmts: vec![Stmt::new(register), Stmt::new(init)],
        }
    }

    /// Right after the decider: reorder every live array the decider did
    /// not already permute in place.
    fn post_decider_reorder(
        &mut self,
        graph: &InterDependenceGraph,
        far: &[Symbol],
        fknob: Symbol,
        status: Symbol,
        decider_at: (BlockId, usize),
    ) -> Action {
        let (block, index) = decider_at;
        let mut live: Vec<Symbol> = self
            .liveness
            .live_out_at(block, index)
            .into_iter()
            .filter(|sym| !far.contains(sym))
            .collect();
        sort_by_name(&mut live);
        let (matrices, vectors) = self.partition_payload(graph, &live);

        let fknob_ref = self.pool.sym(fknob);
        let status_ref = self.pool.sym(status);
        let call = self.payload_call(
            *names::REORDERING,
            vec![fknob_ref, status_ref],
            &matrices,
            &vectors,
        );

        Action::InsertBeforeOrAfterStatement {
            before: false,
            block,
            index,
            stmts: vec![Stmt::new(call)],
        }
    }

    /// On a loop exit edge: restore the user's layout for everything still
    /// live across the edge. Nothing is emitted when no array qualifies.
    fn exit_reverse_reorder(
        &mut self,
        graph: &InterDependenceGraph,
        status: Symbol,
        from: BlockId,
        to: BlockId,
    ) -> Option<Action> {
        let live_out = self.liveness.live_out(from);
        let live_in = self.liveness.live_in(to);
        let mut live: Vec<Symbol> = live_out.intersection(&live_in).copied().collect();
        sort_by_name(&mut live);
        let (matrices, vectors) = self.partition_payload(graph, &live);
        if matrices.is_empty() && vectors.is_empty() {
            return None;
        }

        let status_ref = self.pool.sym(status);
        let call = self.payload_call(
            *names::REVERSE_REORDERING,
            vec![status_ref],
            &matrices,
            &vectors,
        );

        Some(Action::InsertOnEdge { from, to, stmts: vec![Stmt::new(call)] })
    }

    /// Split a symbol list into the matrix and vector payload sections,
    /// keeping only arrays the colouring actually permutes.
    fn partition_payload(
        &self,
        graph: &InterDependenceGraph,
        symbols: &[Symbol],
    ) -> (Vec<MatrixEntry>, Vec<VectorEntry>) {
        let mut matrices = Vec::new();
        let mut vectors = Vec::new();
        for &sym in symbols {
            match symbol_type(self.types, sym) {
                ValueType::SparseMatrix => {
                    let row = graph.color_of(sym, Axis::Row);
                    let col = graph.color_of(sym, Axis::Column);
                    if row != PermColor::NoPerm || col != PermColor::NoPerm {
                        matrices.push((sym, row, col));
                    }
                }
                ValueType::Vector => {
                    let row = graph.color_of(sym, Axis::Row);
                    if row != PermColor::NoPerm {
                        vectors.push((sym, row));
                    }
                }
                _ => {}
            }
        }
        (matrices, vectors)
    }

    /// `name(head_args..., matrices..., :__delimitor__, vectors...)`
    fn payload_call(
        &mut self,
        name: Symbol,
        head_args: Vec<ExprId>,
        matrices: &[MatrixEntry],
        vectors: &[VectorEntry],
    ) -> ExprId {
        let runtime = self.config.runtime_module;
        let mut args = head_args;
        for &(sym, row, col) in matrices {
            args.push(self.pool.sym(sym));
            args.push(self.color_ref(row));
            args.push(self.color_ref(col));
        }
        let delim = self.pool.quote(*names::DELIMITOR);
        args.push(delim);
        for &(sym, row) in vectors {
            args.push(self.pool.sym(sym));
            args.push(self.color_ref(row));
        }
        let callee = self.pool.global(runtime, name);
        self.pool.call(callee, args, ValueType::Other)
    }

    /// A colour constant as a module-qualified named reference.
    fn color_ref(&mut self, color: PermColor) -> ExprId {
        let runtime = self.config.runtime_module;
        self.pool.global(runtime, intern(color.constant_name()))
    }
}
