//! Pretty printing for expressions and editing actions.
//!
//! Used by diagnostics and tests; emitted plans are much easier to check
//! as text than as trees of pool ids.

use pretty::{DocAllocator, DocBuilder, BoxAllocator};
use crate::ir::cfg::Stmt;
use crate::ir::expr::{Expr, ExprId, ExprPool};
use crate::transform::actions::Action;

/// Default line width for pretty printing.
pub const DEFAULT_WIDTH: usize = 80;

/// A pretty-printable value; rendering needs the pool the ids live in.
pub trait PrettyPrint {
    /// Convert to a pretty document.
    fn to_doc<'a, D: DocAllocator<'a>>(&self, pool: &ExprPool, allocator: &'a D) -> DocBuilder<'a, D>;

    /// Pretty print to a string with the given width.
    fn pretty_print(&self, pool: &ExprPool, width: usize) -> String {
        let allocator = BoxAllocator;
        let doc = self.to_doc(pool, &allocator);
        let mut output = String::new();
        doc.render_fmt(width, &mut output).unwrap();
        output
    }

    /// Pretty print with default width.
    fn pretty(&self, pool: &ExprPool) -> String {
        self.pretty_print(pool, DEFAULT_WIDTH)
    }
}

fn comma_separated<'a, D: DocAllocator<'a>>(
    pool: &ExprPool,
    items: &[ExprId],
    allocator: &'a D,
) -> DocBuilder<'a, D> {
    let mut doc = allocator.nil();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            doc = doc.append(allocator.text(", "));
        }
        doc = doc.append(item.to_doc(pool, allocator));
    }
    doc
}

impl PrettyPrint for ExprId {
    fn to_doc<'a, D: DocAllocator<'a>>(&self, pool: &ExprPool, allocator: &'a D) -> DocBuilder<'a, D> {
        match pool.get(*self) {
            Expr::Sym(sym) | Expr::Knob(sym) => allocator.text(sym.name()),
            Expr::Global { module, name } => {
                allocator.text(format!("{}.{}", module.name(), name.name()))
            }
            Expr::Quote(sym) => allocator.text(format!(":{}", sym.name())),
            Expr::Int(value) => allocator.text(value.to_string()),
            Expr::Float(value) => allocator.text(format!("{:?}", value)),
            Expr::Bool(value) => allocator.text(value.to_string()),
            Expr::Str(value) => allocator.text(format!("{:?}", value)),
            Expr::Call { callee, args, .. } => callee
                .to_doc(pool, allocator)
                .append(allocator.text("("))
                .append(comma_separated(pool, args, allocator))
                .append(allocator.text(")")),
            Expr::Assign { lhs, rhs } => lhs
                .to_doc(pool, allocator)
                .append(allocator.text(" = "))
                .append(rhs.to_doc(pool, allocator)),
            Expr::Tuple(items) => allocator
                .text("(")
                .append(comma_separated(pool, items, allocator))
                .append(allocator.text(")")),
            Expr::Return(Some(value)) => {
                allocator.text("return ").append(value.to_doc(pool, allocator))
            }
            Expr::Return(None) => allocator.text("return"),
            Expr::GotoIfNot { cond, target } => allocator
                .text("unless ")
                .append(cond.to_doc(pool, allocator))
                .append(allocator.text(format!(" goto {}", target))),
            Expr::Goto(target) => allocator.text(format!("goto {}", target)),
            Expr::Line(line) => allocator.text(format!("# line {}", line)),
            Expr::Label(block) => allocator.text(format!("{}:", block)),
            Expr::Lambda => allocator.text("<lambda>"),
            Expr::NewVar(sym) => allocator.text(format!("new {}", sym.name())),
        }
    }
}

impl PrettyPrint for Stmt {
    fn to_doc<'a, D: DocAllocator<'a>>(&self, pool: &ExprPool, allocator: &'a D) -> DocBuilder<'a, D> {
        self.expr.to_doc(pool, allocator)
    }
}

impl PrettyPrint for Action {
    fn to_doc<'a, D: DocAllocator<'a>>(&self, pool: &ExprPool, allocator: &'a D) -> DocBuilder<'a, D> {
        let (header, stmts) = match self {
            Action::InsertBeforeLoopHead { loop_head, stmts } => {
                (format!("before loop {}:", loop_head), stmts.as_slice())
            }
            Action::InsertBeforeOrAfterStatement { before, block, index, stmts } => {
                let position = if *before { "before" } else { "after" };
                (format!("{} {}[{}]:", position, block, index), stmts.as_slice())
            }
            Action::InsertOnEdge { from, to, stmts } => {
                (format!("on edge {} -> {}:", from, to), stmts.as_slice())
            }
            Action::Statement(stmt) => (String::new(), std::slice::from_ref(stmt)),
        };
        if header.is_empty() {
            return stmts[0].to_doc(pool, allocator);
        }
        let mut doc = allocator.text(header);
        for stmt in stmts {
            doc = doc
                .append(allocator.hardline())
                .append(allocator.text("  "))
                .append(stmt.to_doc(pool, allocator));
        }
        doc
    }
}

/// Render a single expression to a string.
pub fn render_expr(pool: &ExprPool, id: ExprId) -> String {
    id.pretty(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::types::ValueType;
    use crate::utils::intern::{intern, names};

    #[test]
    fn test_render_call() {
        let mut pool = ExprPool::new();
        let callee = pool.global(*names::SPARSELIB, *names::REVERSE_REORDERING);
        let status = pool.sym(intern("__reordering_status_1"));
        let delim = pool.quote(*names::DELIMITOR);
        let x = pool.sym(intern("x"));
        let color = pool.global(*names::SPARSELIB, intern("ROW_PERM"));
        let call = pool.call(callee, vec![status, delim, x, color], ValueType::Other);
        assert_eq!(
            render_expr(&pool, call),
            "sparselib.reverse_reordering(__reordering_status_1, :__delimitor__, x, sparselib.ROW_PERM)"
        );
    }

    #[test]
    fn test_render_status_init() {
        let mut pool = ExprPool::new();
        let done = pool.boolean(false);
        let null = pool.global(*names::SPARSELIB, *names::C_NULL);
        let time = pool.float(0.0);
        let tuple = pool.tuple(vec![done, null, time]);
        let status = pool.sym(intern("__reordering_status_1"));
        let assign = pool.assign(status, tuple);
        assert_eq!(
            render_expr(&pool, assign),
            "__reordering_status_1 = (false, sparselib.C_NULL, 0.0)"
        );
    }

    #[test]
    fn test_render_action() {
        let mut pool = ExprPool::new();
        let callee = pool.sym(intern("dot"));
        let x = pool.sym(intern("x"));
        let call = pool.call(callee, vec![x], ValueType::Number);
        let action = Action::InsertOnEdge {
            from: crate::ir::cfg::BlockId(1),
            to: crate::ir::cfg::BlockId(2),
            stmts: vec![Stmt::new(call)],
        };
        let text = action.pretty(&pool);
        assert!(text.starts_with("on edge B1 -> B2:"));
        assert!(text.contains("dot(x)"));
    }
}
