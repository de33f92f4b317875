//! IDG construction from the loop's expressions.
//!
//! A single pass over every statement of the loop members, in source order.
//! Each call is classified by the registry and contributes the vertices and
//! edges its distributivity record implies. The walk also pins down where
//! the reordering decider sits, so the planner can splice the reorder call
//! right after it.

use std::collections::HashMap;
use crate::analysis::idg::InterDependenceGraph;
use crate::analysis::registry::{Classification, Registry};
use crate::ir::cfg::{BlockId, Cfg, LoopRegion};
use crate::ir::expr::{Expr, ExprId, ExprPool};
use crate::ir::types::{SymbolTypes, ValueType, numbers_or_arrays};
use crate::utils::errors::{PlanResult, PlannerError};
use crate::utils::intern::{Symbol, intern, names};

/// Per-invocation working state of the planner.
#[derive(Debug)]
pub struct ReorderingContext {
    /// The matrix whose permutations seed the colouring (`FAR[0]`)
    pub seed: Symbol,
    /// The call designated as reordering decision maker
    pub decider: ExprId,
    /// Where the decider sits; resolved by the walk, then frozen
    pub decider_at: Option<(BlockId, usize)>,
    /// The graph under construction
    pub graph: InterDependenceGraph,
}

impl ReorderingContext {
    pub fn new(seed: Symbol, decider: ExprId) -> Self {
        Self {
            seed,
            decider,
            decider_at: None,
            graph: InterDependenceGraph::new(seed),
        }
    }
}

/// Traversal frame: process children before the node itself, so nested
/// calls contribute edges before the enclosing one.
enum Frame {
    Enter(ExprId),
    Exit(ExprId),
}

/// Builds the inter-dependence graph for one loop.
pub struct IdgBuilder<'a> {
    pool: &'a ExprPool,
    types: &'a SymbolTypes,
    registry: &'a Registry,
    /// Synthetic result symbols for array-valued calls, one per call node.
    temps: HashMap<ExprId, Symbol>,
    cursor: (BlockId, usize),
}

impl<'a> IdgBuilder<'a> {
    pub fn new(pool: &'a ExprPool, types: &'a SymbolTypes, registry: &'a Registry) -> Self {
        Self {
            pool,
            types,
            registry,
            temps: HashMap::new(),
            cursor: (BlockId(0), 0),
        }
    }

    /// Walk every statement of the region's members in source order.
    pub fn walk_region(
        &mut self,
        ctx: &mut ReorderingContext,
        cfg: &Cfg,
        region: &LoopRegion,
    ) -> PlanResult<()> {
        for &block_id in &region.members {
            let block = match cfg.block(block_id) {
                Some(block) => block,
                None => {
                    log::debug!("loop member {} has no block in the CFG", block_id);
                    continue;
                }
            };
            for (idx, stmt) in block.stmts.iter().enumerate() {
                self.cursor = (block_id, idx);
                self.walk_stmt(ctx, stmt.expr)?;
            }
        }
        Ok(())
    }

    /// Walk one statement with an explicit work stack; expression depth is
    /// host-controlled and must not be able to overflow ours.
    fn walk_stmt(&mut self, ctx: &mut ReorderingContext, root: ExprId) -> PlanResult<()> {
        let mut stack = vec![Frame::Enter(root)];
        let mut children = Vec::new();
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(id) => {
                    if matches!(self.pool.get(id), Expr::Lambda) {
                        return Err(PlannerError::UnknownAstShape {
                            detail: "lambda in expression position".to_string(),
                        });
                    }
                    stack.push(Frame::Exit(id));
                    children.clear();
                    self.pool.children_into(id, &mut children);
                    for &child in children.iter().rev() {
                        stack.push(Frame::Enter(child));
                    }
                }
                Frame::Exit(id) => match self.pool.get(id) {
                    Expr::Call { .. } => self.visit_call(ctx, id)?,
                    Expr::Assign { lhs, rhs } => self.visit_assign(ctx, *lhs, *rhs)?,
                    _ => {}
                },
            }
        }
        Ok(())
    }

    fn visit_call(&mut self, ctx: &mut ReorderingContext, id: ExprId) -> PlanResult<()> {
        if id == ctx.decider {
            assert!(
                ctx.decider_at.is_none(),
                "reordering decider encountered twice in one invocation"
            );
            ctx.decider_at = Some(self.cursor);
        }

        let (callee, args, result_ty) = match self.pool.get(id) {
            Expr::Call { callee, args, ty } => (*callee, args, *ty),
            _ => unreachable!("visit_call on a non-call node"),
        };

        // Function-knob sentinels ride along as trailing arguments; they do
        // not count towards arity or types.
        let args: Vec<ExprId> = args
            .iter()
            .copied()
            .filter(|&a| !matches!(self.pool.get(a), Expr::Knob(_)))
            .collect();
        let arg_types: Vec<ValueType> =
            args.iter().map(|&a| self.pool.type_of(a, self.types)).collect();

        let (all_numbers, some_arrays) = numbers_or_arrays(result_ty, &arg_types);
        if all_numbers || !some_arrays {
            return Ok(());
        }

        let (module, name) = self.resolve_callee(callee)?;
        match self.registry.lookup(module, name, &arg_types) {
            Classification::Descriptor(descriptor) => {
                log::debug!(
                    "call {}.{} contributes {} relation(s)",
                    module,
                    name,
                    descriptor.relations.len()
                );
                let relations = descriptor.relations.clone();
                for rel in relations {
                    let first = self.operand_symbol(rel.first, id, &args);
                    let second = self.operand_symbol(rel.second, id, &args);
                    if let (Some(first), Some(second)) = (first, second) {
                        ctx.graph.add_relation(first, second, rel.tag);
                    }
                }
                Ok(())
            }
            Classification::Unresolved => Err(PlannerError::UnresolvedFunction {
                detail: format!("{}.{}", module, name),
            }),
            Classification::Undescribed => Err(PlannerError::UndescribedFunction {
                module,
                name,
                arg_types,
            }),
            Classification::NonDistributive => {
                Err(PlannerError::NonDistributiveFunction { module, name })
            }
        }
    }

    fn visit_assign(&mut self, ctx: &mut ReorderingContext, lhs: ExprId, rhs: ExprId) -> PlanResult<()> {
        let lhs_ty = self.pool.type_of(lhs, self.types);
        let rhs_ty = self.pool.type_of(rhs, self.types);
        if !lhs_ty.is_array() || !rhs_ty.is_array() {
            return Ok(());
        }
        let descriptor = match self.registry.assignment(lhs_ty, rhs_ty) {
            Some(d) => d.clone(),
            None => {
                return Err(PlannerError::UndescribedFunction {
                    module: *names::BASE,
                    name: *names::ASSIGN,
                    arg_types: vec![lhs_ty, rhs_ty],
                })
            }
        };
        let operands = [lhs, rhs];
        for rel in descriptor.relations {
            // `:=` relations use indices 1 (lhs) and 2 (rhs).
            let first = rel.first.checked_sub(1).and_then(|i| operands.get(i).copied());
            let second = rel.second.checked_sub(1).and_then(|i| operands.get(i).copied());
            if let (Some(first), Some(second)) = (first, second) {
                if let (Some(first), Some(second)) = (self.symbol_of(first), self.symbol_of(second)) {
                    ctx.graph.add_relation(first, second, rel.tag);
                }
            }
        }
        Ok(())
    }

    /// (module, name) for a callee expression. Bare symbols default to the
    /// base module; anything but a symbol or global is not a callable head.
    fn resolve_callee(&self, callee: ExprId) -> PlanResult<(Symbol, Symbol)> {
        match self.pool.get(callee) {
            Expr::Sym(name) => {
                if name.name().is_empty() {
                    return Err(PlannerError::UnresolvedFunction {
                        detail: "empty callee name".to_string(),
                    });
                }
                Ok((*names::BASE, *name))
            }
            Expr::Global { module, name } => {
                if name.name().is_empty() {
                    return Err(PlannerError::UnresolvedFunction {
                        detail: format!("{}.<empty>", module),
                    });
                }
                Ok((*module, *name))
            }
            other => Err(PlannerError::UnhandledExpr {
                detail: format!("callee is a {}", other.shape()),
            }),
        }
    }

    /// Resolve a relation operand index to an array symbol. Index 0 is the
    /// call's own result.
    fn operand_symbol(&mut self, index: usize, call: ExprId, args: &[ExprId]) -> Option<Symbol> {
        if index == 0 {
            return Some(self.temp_symbol(call));
        }
        args.get(index - 1).and_then(|&a| self.symbol_of(a))
    }

    /// The array symbol an expression stands for, if any. Array-valued
    /// calls get a synthetic per-node temporary so nested calls chain their
    /// constraints; temporaries never appear in liveness sets, so they
    /// never leak into emitted payloads.
    fn symbol_of(&mut self, id: ExprId) -> Option<Symbol> {
        match self.pool.get(id) {
            Expr::Sym(sym) => Some(*sym),
            Expr::Call { .. } => Some(self.temp_symbol(id)),
            _ => None,
        }
    }

    fn temp_symbol(&mut self, id: ExprId) -> Symbol {
        *self
            .temps
            .entry(id)
            .or_insert_with(|| intern(&format!("%{}", id.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::idg::{Axis, PermColor};
    use crate::ir::cfg::BasicBlock;
    use crate::ir::types::ValueType::{Number as N, SparseMatrix as M, Vector as V};
    use crate::utils::intern::intern;

    fn setup() -> (ExprPool, SymbolTypes) {
        (ExprPool::new(), SymbolTypes::new())
    }

    /// `x = A*x` in block 1.
    fn seed_only_loop(pool: &mut ExprPool, types: &mut SymbolTypes) -> (Cfg, LoopRegion, ExprId) {
        let a = intern("A");
        let x = intern("x");
        types.insert(a, M);
        types.insert(x, V);
        let callee = pool.sym(intern("*"));
        let a_ref = pool.sym(a);
        let x_ref = pool.sym(x);
        let mul = pool.call(callee, vec![a_ref, x_ref], V);
        let lhs = pool.sym(x);
        let assign = pool.assign(lhs, mul);

        let mut cfg = Cfg::new();
        let mut block = BasicBlock::new(BlockId(1));
        block.push_stmt(assign);
        *cfg.add_block(BlockId(1)) = block;
        let region = LoopRegion::new(BlockId(1)).with_exit(BlockId(1), BlockId(2));
        (cfg, region, mul)
    }

    #[test]
    fn test_builder_seed_only() {
        let (mut pool, mut types) = setup();
        let (cfg, region, mul) = seed_only_loop(&mut pool, &mut types);
        let a = intern("A");
        let x = intern("x");

        let mut ctx = ReorderingContext::new(a, mul);
        ctx.graph.ensure_vertex(a, Axis::Row);
        ctx.graph.ensure_vertex(a, Axis::Column);

        let mut builder = IdgBuilder::new(&pool, &types, Registry::standard());
        builder.walk_region(&mut ctx, &cfg, &region).unwrap();

        assert_eq!(ctx.decider_at, Some((BlockId(1), 0)));
        // A.row, A.col, x.row, plus the multiply's temporary row vertex.
        assert_eq!(ctx.graph.len(), 4);
        assert!(ctx.graph.vertex_id(x, Axis::Row).is_some());
        assert!(ctx.graph.vertex_id(x, Axis::Column).is_none());
        assert_eq!(ctx.graph.color_of(a, Axis::Row), PermColor::NoPerm);
    }

    #[test]
    fn test_edge_symmetry_property() {
        let (mut pool, mut types) = setup();
        let (cfg, region, mul) = seed_only_loop(&mut pool, &mut types);
        let a = intern("A");

        let mut ctx = ReorderingContext::new(a, mul);
        let mut builder = IdgBuilder::new(&pool, &types, Registry::standard());
        builder.walk_region(&mut ctx, &cfg, &region).unwrap();

        for (id, vertex) in ctx.graph.vertices() {
            for &(peer, inverse) in &vertex.edges {
                let back = &ctx.graph.vertex(peer).edges;
                assert!(back.contains(&(id, inverse)), "missing mirror edge");
            }
        }
    }

    #[test]
    fn test_pure_number_calls_skipped() {
        let (mut pool, mut types) = setup();
        let alpha = intern("alpha");
        let beta = intern("beta");
        types.insert(alpha, N);
        types.insert(beta, N);
        // gamma = alpha / beta; "/" is not described, but all-numbers calls
        // never reach the registry.
        let callee = pool.sym(intern("/"));
        let a_ref = pool.sym(alpha);
        let b_ref = pool.sym(beta);
        let div = pool.call(callee, vec![a_ref, b_ref], N);
        let gamma = pool.sym(intern("gamma"));
        let assign = pool.assign(gamma, div);

        let mut cfg = Cfg::new();
        cfg.add_block(BlockId(1)).push_stmt(assign);
        let region = LoopRegion::new(BlockId(1));

        let decider = ExprId(9999);
        let mut ctx = ReorderingContext::new(intern("A"), decider);
        let mut builder = IdgBuilder::new(&pool, &types, Registry::standard());
        builder.walk_region(&mut ctx, &cfg, &region).unwrap();
        assert!(ctx.graph.is_empty());
    }

    #[test]
    fn test_array_constructor_skipped() {
        let (mut pool, mut types) = setup();
        let n = intern("n");
        types.insert(n, N);
        // zeros(n): array result from scalar arguments. The callee is not
        // described anywhere, but with no array argument the call never
        // reaches the registry and must not abort the plan.
        let callee = pool.global(*names::SPARSELIB, intern("zeros"));
        let n_ref = pool.sym(n);
        let call = pool.call(callee, vec![n_ref], V);

        let mut cfg = Cfg::new();
        cfg.add_block(BlockId(1)).push_stmt(call);
        let region = LoopRegion::new(BlockId(1));

        let mut ctx = ReorderingContext::new(intern("A"), ExprId(9999));
        let mut builder = IdgBuilder::new(&pool, &types, Registry::standard());
        builder.walk_region(&mut ctx, &cfg, &region).unwrap();
        assert!(ctx.graph.is_empty());
    }

    #[test]
    fn test_knob_excluded_from_arity() {
        let (mut pool, mut types) = setup();
        let l = intern("L");
        let z = intern("z");
        types.insert(l, M);
        types.insert(z, V);
        let callee = pool.global(*names::SPARSELIB, intern("fwdTriSolve!"));
        let l_ref = pool.sym(l);
        let z_ref = pool.sym(z);
        let knob = pool.knob(intern("__fknob_0"));
        let call = pool.call(callee, vec![l_ref, z_ref, knob], V);

        let mut cfg = Cfg::new();
        cfg.add_block(BlockId(1)).push_stmt(call);
        let region = LoopRegion::new(BlockId(1));

        let mut ctx = ReorderingContext::new(l, call);
        let mut builder = IdgBuilder::new(&pool, &types, Registry::standard());
        // With the knob excluded the [M, V] entry matches; otherwise this
        // would abort with UndescribedFunction.
        builder.walk_region(&mut ctx, &cfg, &region).unwrap();
        assert!(ctx.graph.vertex_id(l, Axis::Column).is_some());
    }

    #[test]
    fn test_undescribed_call_aborts() {
        let (mut pool, mut types) = setup();
        let x = intern("x");
        types.insert(x, V);
        let callee = pool.sym(intern("mystery"));
        let x_ref = pool.sym(x);
        let call = pool.call(callee, vec![x_ref], V);

        let mut cfg = Cfg::new();
        cfg.add_block(BlockId(1)).push_stmt(call);
        let region = LoopRegion::new(BlockId(1));

        let mut ctx = ReorderingContext::new(x, call);
        let mut builder = IdgBuilder::new(&pool, &types, Registry::standard());
        let err = builder.walk_region(&mut ctx, &cfg, &region).unwrap_err();
        assert!(matches!(err, PlannerError::UndescribedFunction { .. }));
    }

    #[test]
    fn test_lambda_is_structural_error() {
        let (mut pool, types) = setup();
        let lambda = pool.add(Expr::Lambda);
        let mut cfg = Cfg::new();
        cfg.add_block(BlockId(1)).push_stmt(lambda);
        let region = LoopRegion::new(BlockId(1));

        let mut ctx = ReorderingContext::new(intern("A"), ExprId(9999));
        let mut builder = IdgBuilder::new(&pool, &types, Registry::standard());
        let err = builder.walk_region(&mut ctx, &cfg, &region).unwrap_err();
        assert!(matches!(err, PlannerError::UnknownAstShape { .. }));
    }

    #[test]
    fn test_callee_with_bad_head() {
        let (mut pool, mut types) = setup();
        let x = intern("x");
        types.insert(x, V);
        let inner_callee = pool.sym(intern("f"));
        let inner = pool.call(inner_callee, vec![], ValueType::Other);
        let x_ref = pool.sym(x);
        let call = pool.call(inner, vec![x_ref], V);

        let mut cfg = Cfg::new();
        cfg.add_block(BlockId(1)).push_stmt(call);
        let region = LoopRegion::new(BlockId(1));

        let mut ctx = ReorderingContext::new(x, ExprId(9999));
        let mut builder = IdgBuilder::new(&pool, &types, Registry::standard());
        let err = builder.walk_region(&mut ctx, &cfg, &region).unwrap_err();
        assert!(matches!(err, PlannerError::UnhandledExpr { .. }));
    }
}
