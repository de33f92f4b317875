//! Utility modules for the reordering planner.
//!
//! - Error types and diagnostics
//! - Symbol interning
//! - Pretty printing

pub mod errors;
pub mod intern;
pub mod pretty;

// Re-exports
pub use errors::*;
pub use intern::{Symbol, intern, resolve};
pub use pretty::{PrettyPrint, render_expr};
