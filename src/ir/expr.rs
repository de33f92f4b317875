//! Sum-typed expression model over an arena pool.
//!
//! The host lowers its routine into flat expression nodes held in an
//! `ExprPool`; nodes refer to their children by `ExprId`. Identity of a
//! node (for the reordering-decider reference) is its id, which makes the
//! "is this the decider" test a plain equality.

use serde::{Serialize, Deserialize};
use std::fmt;
use crate::ir::cfg::BlockId;
use crate::ir::types::{SymbolTypes, ValueType, symbol_type};
use crate::utils::intern::Symbol;

/// A unique identifier for expression nodes within one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExprId(pub u32);

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// One expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Element-wise container, e.g. the reordering-status initializer
    Tuple(Vec<ExprId>),
    /// A function call; `ty` is the host-inferred result type
    Call {
        /// Callee expression (a `Sym` or `Global` once resolvable)
        callee: ExprId,
        /// Arguments; a trailing `Knob` is excluded from arity counting
        args: Vec<ExprId>,
        /// Result type as inferred by the host
        ty: ValueType,
    },
    /// `lhs = rhs`
    Assign {
        lhs: ExprId,
        rhs: ExprId,
    },
    /// Return, possibly with a value
    Return(Option<ExprId>),
    /// Conditional branch out of a block
    GotoIfNot {
        cond: ExprId,
        target: BlockId,
    },
    /// Unconditional branch
    Goto(BlockId),
    /// Source line marker
    Line(u32),
    /// Branch target marker
    Label(BlockId),
    /// An identifier
    Sym(Symbol),
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// Boolean literal
    Bool(bool),
    /// String literal
    Str(String),
    /// A quoted symbol, e.g. the section delimiter in runtime calls
    Quote(Symbol),
    /// A module-qualified name
    Global {
        module: Symbol,
        name: Symbol,
    },
    /// A nested lambda descriptor, opaque to the planner
    Lambda,
    /// New-variable marker
    NewVar(Symbol),
    /// Function-knob sentinel argument tied to a call site
    Knob(Symbol),
}

impl Expr {
    /// Short shape name for error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Expr::Tuple(_) => "tuple",
            Expr::Call { .. } => "call",
            Expr::Assign { .. } => "assignment",
            Expr::Return(_) => "return",
            Expr::GotoIfNot { .. } => "gotoifnot",
            Expr::Goto(_) => "goto",
            Expr::Line(_) => "line",
            Expr::Label(_) => "label",
            Expr::Sym(_) => "symbol",
            Expr::Int(_) => "integer",
            Expr::Float(_) => "float",
            Expr::Bool(_) => "boolean",
            Expr::Str(_) => "string",
            Expr::Quote(_) => "quote",
            Expr::Global { .. } => "global",
            Expr::Lambda => "lambda",
            Expr::NewVar(_) => "newvar",
            Expr::Knob(_) => "function knob",
        }
    }
}

/// Arena of expression nodes.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ExprPool {
    nodes: Vec<Expr>,
}

impl ExprPool {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Add a node and return its id.
    pub fn add(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(expr);
        id
    }

    /// Get a node by id.
    ///
    /// Ids are only ever produced by `add`, so indexing cannot fail for ids
    /// from the same pool.
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize { self.nodes.len() }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Append `id`'s direct children to `out`, left to right.
    pub fn children_into(&self, id: ExprId, out: &mut Vec<ExprId>) {
        match self.get(id) {
            Expr::Tuple(items) => out.extend_from_slice(items),
            Expr::Call { callee, args, .. } => {
                out.push(*callee);
                out.extend_from_slice(args);
            }
            Expr::Assign { lhs, rhs } => {
                out.push(*lhs);
                out.push(*rhs);
            }
            Expr::Return(Some(value)) => out.push(*value),
            Expr::GotoIfNot { cond, .. } => out.push(*cond),
            _ => {}
        }
    }

    /// The coarse type of a node, given the host's symbol types.
    pub fn type_of(&self, id: ExprId, types: &SymbolTypes) -> ValueType {
        match self.get(id) {
            Expr::Int(_) | Expr::Float(_) | Expr::Bool(_) => ValueType::Number,
            Expr::Sym(sym) | Expr::NewVar(sym) => symbol_type(types, *sym),
            Expr::Call { ty, .. } => *ty,
            Expr::Assign { rhs, .. } => self.type_of(*rhs, types),
            _ => ValueType::Other,
        }
    }

    // Convenience constructors; hosts and tests build IR through these.

    pub fn sym(&mut self, sym: Symbol) -> ExprId {
        self.add(Expr::Sym(sym))
    }

    pub fn global(&mut self, module: Symbol, name: Symbol) -> ExprId {
        self.add(Expr::Global { module, name })
    }

    pub fn call(&mut self, callee: ExprId, args: Vec<ExprId>, ty: ValueType) -> ExprId {
        self.add(Expr::Call { callee, args, ty })
    }

    pub fn assign(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.add(Expr::Assign { lhs, rhs })
    }

    pub fn tuple(&mut self, items: Vec<ExprId>) -> ExprId {
        self.add(Expr::Tuple(items))
    }

    pub fn int(&mut self, value: i64) -> ExprId {
        self.add(Expr::Int(value))
    }

    pub fn float(&mut self, value: f64) -> ExprId {
        self.add(Expr::Float(value))
    }

    pub fn boolean(&mut self, value: bool) -> ExprId {
        self.add(Expr::Bool(value))
    }

    pub fn quote(&mut self, sym: Symbol) -> ExprId {
        self.add(Expr::Quote(sym))
    }

    pub fn knob(&mut self, sym: Symbol) -> ExprId {
        self.add(Expr::Knob(sym))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::intern::intern;

    #[test]
    fn test_pool_identity() {
        let mut pool = ExprPool::new();
        let a = pool.sym(intern("A"));
        let b = pool.sym(intern("A"));
        assert_ne!(a, b);
        assert_eq!(pool.get(a), pool.get(b));
    }

    #[test]
    fn test_children() {
        let mut pool = ExprPool::new();
        let callee = pool.sym(intern("dot"));
        let x = pool.sym(intern("x"));
        let y = pool.sym(intern("y"));
        let call = pool.call(callee, vec![x, y], ValueType::Number);
        let mut kids = Vec::new();
        pool.children_into(call, &mut kids);
        assert_eq!(kids, vec![callee, x, y]);
    }

    #[test]
    fn test_type_of() {
        let mut pool = ExprPool::new();
        let mut types = SymbolTypes::new();
        let a = intern("A");
        types.insert(a, ValueType::SparseMatrix);
        let sym = pool.sym(a);
        let num = pool.float(2.0);
        assert_eq!(pool.type_of(sym, &types), ValueType::SparseMatrix);
        assert_eq!(pool.type_of(num, &types), ValueType::Number);
    }
}
