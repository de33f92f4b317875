//! Planner entry point.
//!
//! `plan_reordering` is total from the caller's viewpoint: it either
//! appends a complete editing plan to the action list, or leaves the list
//! exactly as it found it and reports why through the diagnostics sink.

use std::collections::HashMap;
use crate::PlannerConfig;
use crate::analysis::builder::{IdgBuilder, ReorderingContext};
use crate::analysis::idg::Axis;
use crate::analysis::liveness::LivenessOracle;
use crate::analysis::propagate::propagate_colors;
use crate::analysis::registry::Registry;
use crate::ir::cfg::{Cfg, LoopRegion};
use crate::ir::expr::{ExprId, ExprPool};
use crate::ir::types::SymbolTypes;
use crate::transform::actions::Action;
use crate::transform::planner::ActionPlanner;
use crate::utils::errors::{Diagnostic, Diagnostics, PlanResult, PlannerError};
use crate::utils::intern::Symbol;

/// Call-site context assembled by earlier passes of the host.
#[derive(Debug, Clone, Default)]
pub struct CallSites {
    /// The call designated as reordering decision maker, if any
    pub reordering_decider: Option<ExprId>,
    /// Symbols defined or used by the decider statement; the first one is
    /// the seed matrix
    pub reordering_far: Vec<Symbol>,
    /// Function-knob symbol per knobbed call
    pub expr2fknob: HashMap<ExprId, Symbol>,
}

/// What one `plan_reordering` invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOutcome {
    /// Actions were appended
    Planned {
        /// How many actions were appended
        actions_added: usize,
    },
    /// No decider was designated; nothing to do
    NoDecider,
    /// Analysis aborted; the action list is unchanged
    Skipped,
}

impl PlanOutcome {
    pub fn planned(&self) -> bool {
        matches!(self, PlanOutcome::Planned { .. })
    }
}

/// Analyse the loop and append the editing plan to `actions`.
///
/// On any internal failure the list is truncated back to its length at
/// entry, a warning lands in `diags`, and the outcome is `Skipped`; the
/// caller's plan is never left half-written.
#[allow(clippy::too_many_arguments)]
pub fn plan_reordering(
    actions: &mut Vec<Action>,
    pool: &mut ExprPool,
    cfg: &Cfg,
    region: &LoopRegion,
    symbol_types: &SymbolTypes,
    liveness: &dyn LivenessOracle,
    registry: &Registry,
    call_sites: &CallSites,
    config: &PlannerConfig,
    diags: &mut Diagnostics,
) -> PlanOutcome {
    let decider = match call_sites.reordering_decider {
        Some(decider) => decider,
        None => return PlanOutcome::NoDecider,
    };

    let snapshot = actions.len();
    match try_plan(
        actions, pool, cfg, region, symbol_types, liveness, registry, call_sites, config, diags,
        decider,
    ) {
        Ok(actions_added) => {
            log::debug!("reordering planned: {} action(s) for loop {}", actions_added, region.head);
            PlanOutcome::Planned { actions_added }
        }
        Err(err) => {
            actions.truncate(snapshot);
            diags.push(Diagnostic::warning(err.to_string()));
            log::info!("Sparse Accelerator skips reordering the loop.");
            PlanOutcome::Skipped
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn try_plan(
    actions: &mut Vec<Action>,
    pool: &mut ExprPool,
    cfg: &Cfg,
    region: &LoopRegion,
    symbol_types: &SymbolTypes,
    liveness: &dyn LivenessOracle,
    registry: &Registry,
    call_sites: &CallSites,
    config: &PlannerConfig,
    diags: &mut Diagnostics,
    decider: ExprId,
) -> PlanResult<usize> {
    let seed = *call_sites
        .reordering_far
        .first()
        .ok_or(PlannerError::MissingSeed)?;
    let fknob = *call_sites
        .expr2fknob
        .get(&decider)
        .ok_or(PlannerError::MissingFunctionKnob)?;

    let mut ctx = ReorderingContext::new(seed, decider);
    ctx.graph.ensure_vertex(seed, Axis::Row);
    ctx.graph.ensure_vertex(seed, Axis::Column);

    let mut builder = IdgBuilder::new(pool, symbol_types, registry);
    builder.walk_region(&mut ctx, cfg, region)?;
    let decider_at = ctx.decider_at.ok_or(PlannerError::DeciderNotFound)?;

    propagate_colors(&mut ctx.graph, diags);

    let mut planner = ActionPlanner::new(pool, symbol_types, liveness, config);
    Ok(planner.plan(actions, region, &ctx.graph, &call_sites.reordering_far, fknob, decider_at))
}
