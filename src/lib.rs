//! # SparseOpt - Reordering Planner for Sparse Linear Algebra
//!
//! The reordering analysis and transformation planner of a sparse matrix
//! accelerator:
//! - Function descriptor registry (how calls distribute over permutations)
//! - Inter-dependence graph construction over the loop's arrays
//! - Two-colour / inverse-colour propagation from a seed matrix
//! - Editing-action synthesis (preamble, in-loop reorder, exit restores)
//!
//! ## Architecture
//!
//! ```text
//! Registry + loop IR → Builder → IDG → Propagator → Planner → Actions
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use sparseopt::prelude::*;
//!
//! let mut actions = Vec::new();
//! let mut diags = Diagnostics::new();
//! let outcome = plan_reordering(
//!     &mut actions, &mut pool, &cfg, &region,
//!     &symbol_types, &liveness, Registry::standard(),
//!     &call_sites, &PlannerConfig::default(), &mut diags,
//! );
//! assert!(outcome.planned());
//! ```
//!
//! The planner consumes liveness, types and call resolution as inputs and
//! only synthesises editing actions; it never mutates the host CFG and
//! never executes a permutation itself. Arrays inside the loop are assumed
//! not to alias each other; this precondition is documented, not checked.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(dead_code)] // During development

pub mod ir;
pub mod analysis;
pub mod transform;
pub mod utils;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::ir::cfg::{BasicBlock, BlockId, Cfg, LoopExit, LoopRegion, Stmt};
    pub use crate::ir::expr::{Expr, ExprId, ExprPool};
    pub use crate::ir::types::{SymbolTypes, ValueType};
    pub use crate::analysis::idg::{Axis, InterDependenceGraph, PermColor, RelationTag};
    pub use crate::analysis::liveness::{LivenessOracle, TableLiveness};
    pub use crate::analysis::registry::{Classification, Registry};
    pub use crate::transform::actions::Action;
    pub use crate::transform::orchestrator::{CallSites, PlanOutcome, plan_reordering};
    pub use crate::utils::errors::*;
    pub use crate::utils::intern::{Symbol, intern};
    pub use crate::utils::pretty::PrettyPrint;
    pub use crate::PlannerConfig;
}

use crate::utils::intern::{Symbol, names};

/// Configuration for one planner instance.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Module the emitted runtime calls and colour constants live in
    pub runtime_module: Symbol,
    /// Prefix of the per-loop reordering-status symbol
    pub status_prefix: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            runtime_module: *names::SPARSELIB,
            status_prefix: "__reordering_status".to_string(),
        }
    }
}

pub use crate::transform::orchestrator::plan_reordering;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = PlannerConfig::default();
        assert_eq!(config.runtime_module.name(), "sparselib");
        assert_eq!(config.status_prefix, "__reordering_status");
    }
}
