//! Function descriptor registry.
//!
//! A static table from (module, name, argument types) to a distributivity
//! record: whether the function distributes over permutations, and which
//! permutation relations a call imposes between its arrays. Index 0 in a
//! relation refers to the call's result; positive indices to argument
//! positions. Matching on the argument-type tuple is exact; the registry
//! never infers covariance.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use crate::analysis::idg::RelationTag;
use crate::ir::types::ValueType;
use crate::utils::intern::{Symbol, intern, names};

/// One (index, index, relation) triple of a distributivity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgRelation {
    /// First operand: 0 for the result, n for the n-th argument
    pub first: usize,
    /// Second operand, same convention
    pub second: usize,
    /// The relation the call imposes between the two
    pub tag: RelationTag,
}

/// A function's distributivity record.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDescriptor {
    /// Whether the function distributes over permutations at all
    pub distributive: bool,
    /// Relations between the call's arrays; empty for permutation-invariant
    /// functions such as `norm`
    pub relations: Vec<ArgRelation>,
}

/// Outcome of a registry lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification<'a> {
    /// The call is described and distributive
    Descriptor(&'a FuncDescriptor),
    /// The callee name is empty after resolution
    Unresolved,
    /// No entry for (module, name, argument types)
    Undescribed,
    /// Described, but marked non-distributive
    NonDistributive,
}

type FuncKey = (Symbol, Symbol, Vec<ValueType>);

/// The registry. Immutable once handed to the planner; hosts that need
/// extra entries clone the standard table and extend the clone.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    table: HashMap<FuncKey, FuncDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self { table: HashMap::new() }
    }

    /// The built-in table for the accelerator library and base operators.
    pub fn standard() -> &'static Registry {
        &STANDARD
    }

    /// Register a function description.
    pub fn describe(
        &mut self,
        module: Symbol,
        name: Symbol,
        arg_types: &[ValueType],
        distributive: bool,
        relations: &[(usize, usize, RelationTag)],
    ) {
        let relations = relations
            .iter()
            .map(|&(first, second, tag)| ArgRelation { first, second, tag })
            .collect();
        self.table.insert(
            (module, name, arg_types.to_vec()),
            FuncDescriptor { distributive, relations },
        );
    }

    /// Classify a call by (module, name, argument types).
    pub fn lookup(&self, module: Symbol, name: Symbol, arg_types: &[ValueType]) -> Classification<'_> {
        if name.name().is_empty() {
            return Classification::Unresolved;
        }
        match self.table.get(&(module, name, arg_types.to_vec())) {
            None => Classification::Undescribed,
            Some(d) if !d.distributive => Classification::NonDistributive,
            Some(d) => Classification::Descriptor(d),
        }
    }

    /// The pseudo-function `:=` for a plain assignment of compatible shapes.
    ///
    /// Indices 1 and 2 of its relations refer to the left- and right-hand
    /// side respectively.
    pub fn assignment(&self, lhs: ValueType, rhs: ValueType) -> Option<&FuncDescriptor> {
        match self.table.get(&(*names::BASE, *names::ASSIGN, vec![lhs, rhs])) {
            Some(d) if d.distributive => Some(d),
            _ => None,
        }
    }

    pub fn len(&self) -> usize { self.table.len() }
    pub fn is_empty(&self) -> bool { self.table.is_empty() }
}

static STANDARD: Lazy<Registry> = Lazy::new(|| {
    use crate::analysis::idg::RelationTag::{RowRow as RR, ColCol as CC, ColRowInverse as CRI};
    use crate::ir::types::ValueType::{Number as N, SparseMatrix as M, Vector as V};

    let mut reg = Registry::new();
    let base = *names::BASE;
    let lib = *names::SPARSELIB;

    // Assignment pseudo-function: rows always, columns when both matrices.
    reg.describe(base, *names::ASSIGN, &[V, V], true, &[(1, 2, RR)]);
    reg.describe(base, *names::ASSIGN, &[M, M], true, &[(1, 2, RR), (1, 2, CC)]);

    // Base operators.
    let star = intern("*");
    reg.describe(base, star, &[M, V], true, &[(0, 1, RR), (1, 2, CRI)]);
    reg.describe(base, star, &[N, V], true, &[(0, 2, RR)]);
    reg.describe(base, star, &[V, N], true, &[(0, 1, RR)]);
    reg.describe(base, star, &[N, M], true, &[(0, 2, RR), (0, 2, CC)]);
    reg.describe(base, star, &[M, N], true, &[(0, 1, RR), (0, 1, CC)]);
    reg.describe(base, star, &[M, M], true, &[(0, 1, RR), (0, 2, CC), (1, 2, CRI)]);

    let plus = intern("+");
    let minus = intern("-");
    for op in [plus, minus] {
        reg.describe(base, op, &[V, V], true, &[(0, 1, RR), (1, 2, RR)]);
        reg.describe(base, op, &[V, V, V], true, &[(0, 1, RR), (1, 2, RR), (2, 3, RR)]);
        reg.describe(base, op, &[M, M], true, &[(0, 1, RR), (0, 1, CC), (1, 2, RR), (1, 2, CC)]);
    }

    reg.describe(base, intern("dot"), &[V, V], true, &[(1, 2, RR)]);
    reg.describe(base, intern("norm"), &[V], true, &[]);
    reg.describe(base, intern("copy"), &[V], true, &[(0, 1, RR)]);
    reg.describe(base, intern("copy!"), &[V, V], true, &[(1, 2, RR)]);
    // Prefix sums depend on element order.
    reg.describe(base, intern("cumsum"), &[V], false, &[]);

    // Accelerator library routines.
    reg.describe(lib, intern("spmv"), &[M, V], true, &[(0, 1, RR), (1, 2, CRI)]);
    reg.describe(lib, intern("spmv!"), &[V, M, V], true, &[(1, 2, RR), (2, 3, CRI)]);
    reg.describe(lib, intern("fwdTriSolve!"), &[M, V], true, &[(1, 2, RR), (1, 2, CRI)]);
    reg.describe(lib, intern("bwdTriSolve!"), &[M, V], true, &[(1, 2, RR), (1, 2, CRI)]);
    reg.describe(lib, intern("waxpby!"), &[V, N, V, N, V], true, &[(1, 3, RR), (3, 5, RR)]);
    reg.describe(lib, intern("element_wise_multiply"), &[V, V], true, &[(0, 1, RR), (1, 2, RR)]);
    reg.describe(lib, intern("element_wise_divide"), &[V, V], true, &[(0, 1, RR), (1, 2, RR)]);
    // Factorizations bake the element order into their output.
    reg.describe(lib, intern("cholfact"), &[M], false, &[]);

    reg
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::types::ValueType::{Number as N, SparseMatrix as M, Vector as V};

    #[test]
    fn test_standard_lookup() {
        let reg = Registry::standard();
        let d = match reg.lookup(*names::BASE, intern("*"), &[M, V]) {
            Classification::Descriptor(d) => d,
            other => panic!("unexpected classification: {:?}", other),
        };
        assert!(d.distributive);
        assert_eq!(d.relations.len(), 2);
        assert_eq!(d.relations[1].tag, RelationTag::ColRowInverse);
    }

    #[test]
    fn test_exact_type_matching() {
        let reg = Registry::standard();
        // No covariance: a matrix-matrix dot is not described.
        assert_eq!(reg.lookup(*names::BASE, intern("dot"), &[M, M]), Classification::Undescribed);
        assert_eq!(reg.lookup(*names::BASE, intern("dot"), &[V, V, V]), Classification::Undescribed);
    }

    #[test]
    fn test_non_distributive() {
        let reg = Registry::standard();
        assert_eq!(
            reg.lookup(*names::BASE, intern("cumsum"), &[V]),
            Classification::NonDistributive
        );
    }

    #[test]
    fn test_unresolved_on_empty_name() {
        let reg = Registry::standard();
        assert_eq!(reg.lookup(*names::BASE, intern(""), &[V]), Classification::Unresolved);
    }

    #[test]
    fn test_assignment_descriptor() {
        let reg = Registry::standard();
        let vv = reg.assignment(V, V).expect("vector assignment");
        assert_eq!(vv.relations.len(), 1);
        let mm = reg.assignment(M, M).expect("matrix assignment");
        assert_eq!(mm.relations.len(), 2);
        assert!(reg.assignment(M, V).is_none());
        assert!(reg.assignment(N, N).is_none());
    }
}
