//! Reordering analysis: registry, inter-dependence graph, colouring.

pub mod registry;
pub mod idg;
pub mod builder;
pub mod propagate;
pub mod liveness;

pub use registry::{ArgRelation, Classification, FuncDescriptor, Registry};
pub use idg::{Axis, InterDependenceGraph, PermColor, RelationTag, Vertex, VertexId};
pub use builder::{IdgBuilder, ReorderingContext};
pub use propagate::{PropagationStats, propagate_colors};
pub use liveness::{LivenessOracle, SymbolSet, TableLiveness};
