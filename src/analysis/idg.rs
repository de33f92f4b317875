//! The inter-dependence graph (IDG).
//!
//! One vertex per (array symbol, axis) carrying a permutation colour, and
//! symmetric edges labelled with an inverse flag. The graph encodes the
//! constraint that permutations of distinct arrays participating in the
//! same operations must be equal, or inverse of each other.
//!
//! Vertices live in an arena (`Vec`) and neighbour lists hold indices into
//! it, so the cyclic structure needs no shared ownership.

use serde::{Serialize, Deserialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use crate::utils::intern::Symbol;

/// Permutation-vector tag carried by each vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermColor {
    /// Not permuted (the initial colour)
    NoPerm,
    /// The row permutation vector
    RowPerm,
    /// The inverse of the row permutation vector
    RowInvPerm,
    /// The column permutation vector
    ColPerm,
    /// The inverse of the column permutation vector
    ColInvPerm,
}

impl PermColor {
    /// The involution RowPerm↔RowInvPerm, ColPerm↔ColInvPerm.
    ///
    /// `NoPerm` is a fixed point; it never reaches the propagation frontier
    /// because only coloured vertices are expanded.
    pub fn inverse(self) -> PermColor {
        match self {
            PermColor::NoPerm => PermColor::NoPerm,
            PermColor::RowPerm => PermColor::RowInvPerm,
            PermColor::RowInvPerm => PermColor::RowPerm,
            PermColor::ColPerm => PermColor::ColInvPerm,
            PermColor::ColInvPerm => PermColor::ColPerm,
        }
    }

    /// The runtime constant this colour is emitted as.
    pub fn constant_name(self) -> &'static str {
        match self {
            PermColor::NoPerm => "NO_PERM",
            PermColor::RowPerm => "ROW_PERM",
            PermColor::RowInvPerm => "ROW_INV_PERM",
            PermColor::ColPerm => "COL_PERM",
            PermColor::ColInvPerm => "COL_INV_PERM",
        }
    }
}

impl fmt::Display for PermColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.constant_name())
    }
}

/// Which permutation vector of an array a vertex stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Row permutation; the only axis a vector has
    Row,
    /// Column permutation of a matrix
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => write!(f, "rows"),
            Axis::Column => write!(f, "columns"),
        }
    }
}

/// The permutation relation a call imposes between two of its arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationTag {
    /// Row permutations must be equal
    RowRow,
    /// Column permutations must be equal
    ColCol,
    /// First array's column permutation equals the inverse of the second
    /// array's row permutation
    ColRowInverse,
}

impl RelationTag {
    /// Endpoint axes and the edge's inverse flag.
    pub fn endpoints(self) -> (Axis, Axis, bool) {
        match self {
            RelationTag::RowRow => (Axis::Row, Axis::Row, false),
            RelationTag::ColCol => (Axis::Column, Axis::Column, false),
            RelationTag::ColRowInverse => (Axis::Column, Axis::Row, true),
        }
    }
}

/// Index of a vertex in the graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u32);

/// One (symbol, axis) vertex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    /// The array this vertex belongs to
    pub symbol: Symbol,
    /// Row or column permutation of that array
    pub axis: Axis,
    /// Current colour; `NoPerm` until propagation reaches it
    pub color: PermColor,
    /// Neighbours with the edge's inverse flag, in insertion order
    pub edges: Vec<(VertexId, bool)>,
}

/// The inter-dependence graph for one planner invocation.
#[derive(Debug, Clone)]
pub struct InterDependenceGraph {
    vertices: Vec<Vertex>,
    row_index: HashMap<Symbol, VertexId>,
    col_index: HashMap<Symbol, VertexId>,
    seed: Symbol,
    /// Conflict pairs already reported, so re-propagation stays silent.
    reported: HashSet<(VertexId, VertexId)>,
}

impl InterDependenceGraph {
    /// Create an empty graph for the given seed matrix.
    pub fn new(seed: Symbol) -> Self {
        Self {
            vertices: Vec::new(),
            row_index: HashMap::new(),
            col_index: HashMap::new(),
            seed,
            reported: HashSet::new(),
        }
    }

    /// The seed matrix whose permutations start the colouring.
    pub fn seed(&self) -> Symbol {
        self.seed
    }

    /// Find or create the vertex for (symbol, axis).
    pub fn ensure_vertex(&mut self, symbol: Symbol, axis: Axis) -> VertexId {
        let index = match axis {
            Axis::Row => &mut self.row_index,
            Axis::Column => &mut self.col_index,
        };
        if let Some(&id) = index.get(&symbol) {
            return id;
        }
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(Vertex { symbol, axis, color: PermColor::NoPerm, edges: Vec::new() });
        index.insert(symbol, id);
        id
    }

    /// Look up the vertex for (symbol, axis) without creating it.
    pub fn vertex_id(&self, symbol: Symbol, axis: Axis) -> Option<VertexId> {
        match axis {
            Axis::Row => self.row_index.get(&symbol).copied(),
            Axis::Column => self.col_index.get(&symbol).copied(),
        }
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.0 as usize]
    }

    /// Set a vertex's colour.
    pub fn set_color(&mut self, id: VertexId, color: PermColor) {
        self.vertices[id.0 as usize].color = color;
    }

    /// The colour of (symbol, axis); `NoPerm` when the vertex does not exist.
    pub fn color_of(&self, symbol: Symbol, axis: Axis) -> PermColor {
        self.vertex_id(symbol, axis)
            .map(|id| self.vertex(id).color)
            .unwrap_or(PermColor::NoPerm)
    }

    /// Insert one undirected edge between two (symbol, axis) endpoints.
    ///
    /// Both directions are stored with the same flag (I1). An edge from a
    /// vertex to itself is dropped; it cannot constrain anything.
    pub fn add_edge(&mut self, s1: Symbol, a1: Axis, s2: Symbol, a2: Axis, inverse: bool) {
        let u = self.ensure_vertex(s1, a1);
        let v = self.ensure_vertex(s2, a2);
        if u == v {
            return;
        }
        self.vertices[u.0 as usize].edges.push((v, inverse));
        self.vertices[v.0 as usize].edges.push((u, inverse));
    }

    /// Insert the edge a relation tag stands for.
    pub fn add_relation(&mut self, first: Symbol, second: Symbol, tag: RelationTag) {
        let (a1, a2, inverse) = tag.endpoints();
        self.add_edge(first, a1, second, a2, inverse);
    }

    /// Record a conflict pair; returns true the first time the pair is seen.
    pub fn record_conflict(&mut self, u: VertexId, v: VertexId) -> bool {
        let pair = if u <= v { (u, v) } else { (v, u) };
        self.reported.insert(pair)
    }

    /// Whether a conflict between the two vertices has been reported.
    pub fn conflict_reported(&self, u: VertexId, v: VertexId) -> bool {
        let pair = if u <= v { (u, v) } else { (v, u) };
        self.reported.contains(&pair)
    }

    /// All vertices in arena order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
        self.vertices.iter().enumerate().map(|(i, v)| (VertexId(i as u32), v))
    }

    pub fn len(&self) -> usize { self.vertices.len() }
    pub fn is_empty(&self) -> bool { self.vertices.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::intern::intern;

    #[test]
    fn test_inverse_involution() {
        for c in [PermColor::RowPerm, PermColor::RowInvPerm, PermColor::ColPerm, PermColor::ColInvPerm] {
            assert_ne!(c.inverse(), c);
            assert_eq!(c.inverse().inverse(), c);
        }
        assert_eq!(PermColor::NoPerm.inverse(), PermColor::NoPerm);
    }

    #[test]
    fn test_vertex_dedup() {
        let a = intern("A");
        let mut graph = InterDependenceGraph::new(a);
        let v1 = graph.ensure_vertex(a, Axis::Row);
        let v2 = graph.ensure_vertex(a, Axis::Row);
        let v3 = graph.ensure_vertex(a, Axis::Column);
        assert_eq!(v1, v2);
        assert_ne!(v1, v3);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_edge_symmetry() {
        let a = intern("A");
        let x = intern("x");
        let mut graph = InterDependenceGraph::new(a);
        graph.add_relation(a, x, RelationTag::ColRowInverse);
        let u = graph.vertex_id(a, Axis::Column).unwrap();
        let v = graph.vertex_id(x, Axis::Row).unwrap();
        assert_eq!(graph.vertex(u).edges, vec![(v, true)]);
        assert_eq!(graph.vertex(v).edges, vec![(u, true)]);
    }

    #[test]
    fn test_self_edge_dropped() {
        let x = intern("x");
        let mut graph = InterDependenceGraph::new(x);
        graph.add_relation(x, x, RelationTag::RowRow);
        let v = graph.vertex_id(x, Axis::Row).unwrap();
        assert!(graph.vertex(v).edges.is_empty());
    }

    #[test]
    fn test_conflict_recording() {
        let a = intern("A");
        let mut graph = InterDependenceGraph::new(a);
        let u = graph.ensure_vertex(a, Axis::Row);
        let v = graph.ensure_vertex(a, Axis::Column);
        assert!(graph.record_conflict(u, v));
        assert!(!graph.record_conflict(v, u));
        assert!(graph.conflict_reported(u, v));
    }
}
