//! Error types for the reordering planner.
//!
//! Every failure that aborts a planner invocation is a `PlannerError`
//! variant; colour conflicts are deliberately *not* here because they are
//! discoveries, reported through `Diagnostic` instead.

use thiserror::Error;
use crate::ir::types::ValueType;
use crate::utils::intern::Symbol;

/// An abortive failure inside one planner invocation.
///
/// The orchestrator translates any of these into the "no change" behaviour:
/// the caller's action list is restored and the loop is left untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    /// The callee of a call is empty after resolution
    #[error("call has an unresolvable callee: {detail}")]
    UnresolvedFunction {
        /// What the callee looked like
        detail: String,
    },

    /// The registry has no entry for (module, name, argument types)
    #[error("no function description for {module}.{name}({arg_types:?})")]
    UndescribedFunction {
        /// Module of the callee
        module: Symbol,
        /// Name of the callee
        name: Symbol,
        /// Argument types used for the lookup
        arg_types: Vec<ValueType>,
    },

    /// The registry marks the call non-distributive over permutations
    #[error("{module}.{name} does not distribute over permutations")]
    NonDistributiveFunction {
        /// Module of the callee
        module: Symbol,
        /// Name of the callee
        name: Symbol,
    },

    /// A call expression has an unexpected head
    #[error("unhandled call expression: {detail}")]
    UnhandledExpr {
        /// Description of the offending node
        detail: String,
    },

    /// An AST node of an unanticipated shape was reached
    #[error("cannot judge distributivity of AST node: {detail}")]
    UnknownAstShape {
        /// Description of the offending node
        detail: String,
    },

    /// The decider call has no function knob in the call-site table
    #[error("reordering decider has no associated function knob")]
    MissingFunctionKnob,

    /// The call-site table carries an empty FAR set, so there is no seed
    #[error("reordering decider has an empty FAR set")]
    MissingSeed,

    /// The decider call was never encountered while walking the loop
    #[error("reordering decider does not occur in the loop body")]
    DeciderNotFound,
}

/// Result type using PlannerError.
pub type PlanResult<T> = Result<T, PlannerError>;

/// A diagnostic message with severity level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity level
    pub severity: DiagnosticSeverity,
    /// Message
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    /// The planner gave up on the loop
    Warning,
    /// Informational discovery (e.g. an equality-of-permutations constraint)
    Note,
}

impl Diagnostic {
    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self { severity: DiagnosticSeverity::Warning, message: message.into() }
    }

    /// Create a new note diagnostic.
    pub fn note(message: impl Into<String>) -> Self {
        Self { severity: DiagnosticSeverity::Note, message: message.into() }
    }
}

/// Collected diagnostics for one planner invocation.
///
/// The planner owns no global state; callers hand in a sink and read it
/// back after `plan_reordering` returns.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Record a diagnostic and mirror it on the log facade.
    pub fn push(&mut self, diag: Diagnostic) {
        match diag.severity {
            DiagnosticSeverity::Warning => log::warn!("{}", diag.message),
            DiagnosticSeverity::Note => log::info!("{}", diag.message),
        }
        self.items.push(diag);
    }

    /// All diagnostics recorded so far, in emission order.
    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    /// Number of notes (conflict discoveries) recorded.
    pub fn note_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Note)
            .count()
    }

    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::intern::intern;

    #[test]
    fn test_error_display() {
        let err = PlannerError::UndescribedFunction {
            module: intern("base"),
            name: intern("smooth"),
            arg_types: vec![ValueType::Vector],
        };
        let s = format!("{}", err);
        assert!(s.contains("base.smooth"));
        assert!(s.contains("no function description"));
    }

    #[test]
    fn test_diagnostics_sink() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::note("constraint discovered"));
        diags.push(Diagnostic::warning("skipping loop"));
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.note_count(), 1);
    }
}
