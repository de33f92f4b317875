//! Value types as the host's type inference reports them.
//!
//! The planner performs no inference of its own; it only needs to tell
//! numbers, sparse matrices and dense vectors apart.

use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use std::fmt;
use crate::utils::intern::Symbol;

/// The coarse type of an expression or symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// A scalar number (integer, float or boolean)
    Number,
    /// A sparse matrix (row and column axes)
    SparseMatrix,
    /// A dense vector (row axis only)
    Vector,
    /// Anything else; contributes no reordering constraints
    Other,
}

impl ValueType {
    /// Sparse matrices and vectors are the arrays the planner permutes.
    pub fn is_array(&self) -> bool {
        matches!(self, ValueType::SparseMatrix | ValueType::Vector)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, ValueType::Number)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::Number => "number",
            ValueType::SparseMatrix => "sparse matrix",
            ValueType::Vector => "vector",
            ValueType::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// Symbol-to-type mapping supplied by the host.
pub type SymbolTypes = HashMap<Symbol, ValueType>;

/// Look up a symbol's type, defaulting to `Other` for unknown symbols.
pub fn symbol_type(types: &SymbolTypes, sym: Symbol) -> ValueType {
    types.get(&sym).copied().unwrap_or(ValueType::Other)
}

/// Classify a call signature: `(all_numbers, some_arrays)`.
///
/// `all_numbers` is true when the result and every argument are numbers;
/// `some_arrays` is true when some *argument* is an array. A call that is
/// all numbers, or whose arguments contain no array, cannot constrain any
/// permutation and is skipped before the registry is consulted. The result
/// type plays no part in the second test: a constructor returning a fresh
/// array from scalar arguments (`zeros(n)`, `speye(n)`) contributes
/// nothing and must stay invisible to the registry.
pub fn numbers_or_arrays(result: ValueType, args: &[ValueType]) -> (bool, bool) {
    let all_numbers = result.is_number() && args.iter().all(|t| t.is_number());
    let some_arrays = args.iter().any(|t| t.is_array());
    (all_numbers, some_arrays)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_or_arrays() {
        use ValueType::*;
        assert_eq!(numbers_or_arrays(Number, &[Number, Number]), (true, false));
        assert_eq!(numbers_or_arrays(Vector, &[SparseMatrix, Vector]), (false, true));
        assert_eq!(numbers_or_arrays(Number, &[Vector, Vector]), (false, true));
        assert_eq!(numbers_or_arrays(Other, &[]), (false, false));
    }

    #[test]
    fn test_array_constructor_has_no_array_args() {
        use ValueType::*;
        // zeros(n): array result, scalar arguments. Not all numbers, but
        // no array argument either, so the call contributes nothing.
        assert_eq!(numbers_or_arrays(Vector, &[Number, Number]), (false, false));
        assert_eq!(numbers_or_arrays(SparseMatrix, &[Number]), (false, false));
    }

    #[test]
    fn test_symbol_type_default() {
        let types = SymbolTypes::new();
        assert_eq!(symbol_type(&types, crate::utils::intern::intern("ghost")), ValueType::Other);
    }
}
