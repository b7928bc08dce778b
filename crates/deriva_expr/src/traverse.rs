//! Read-only walks over expressions: hole discovery and free-variable
//! collection.
//!
//! Both are expressed as a small bottom-up fold — visit every child first,
//! then combine the children's results with whatever this node itself
//! contributes. `find_holes` and `free_vars` share that shape but not a
//! common abstraction: the two folds combine results differently enough
//! (first-hole-wins vs. set-union) that forcing them through one generic
//! `join` closure would obscure more than it'd save.

use std::collections::HashSet;
use std::rc::Rc;

use deriva_base::Symbol;

use crate::expr::{Expr, ExprKind};

/// True if `expr` contains at least one [`crate::hole::HoleRef`] anywhere in
/// its tree, including inside lambda bodies.
pub fn contains_holes(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Hole(_) => true,
        ExprKind::Var(_) | ExprKind::Lit(_) => false,
        ExprKind::Unary(_, a) => contains_holes(a),
        ExprKind::Binary(_, a, b) => contains_holes(a) || contains_holes(b),
        ExprKind::Tuple(items) => items.iter().any(|e| contains_holes(e)),
        ExprKind::TupleGet(e, _) => contains_holes(e),
        ExprKind::RecordGet(e, _) => contains_holes(e),
        ExprKind::HandleGet(e) => contains_holes(e),
        ExprKind::Map(bag, f) => contains_holes(bag) || contains_holes(&f.body),
        ExprKind::Filter(bag, p) => contains_holes(bag) || contains_holes(&p.body),
        ExprKind::MakeMap(bag, k, v) => {
            contains_holes(bag) || contains_holes(&k.body) || contains_holes(&v.body)
        }
        ExprKind::MapGet(m, k) => contains_holes(m) || contains_holes(k),
        ExprKind::AlterMaybe(m, f) => contains_holes(m) || contains_holes(&f.body),
        ExprKind::Lambda(l) => contains_holes(&l.body),
        ExprKind::App(f, a) => contains_holes(f) || contains_holes(a),
    }
}

/// Every hole in `expr`, in function-before-argument, left-before-right,
/// pre-order: the same order the outer search uses to pick which hole to
/// fill next (see `pick_goal` in the core search), so the first element of
/// this list is always that hole.
pub fn find_holes(expr: &Rc<Expr>) -> Vec<Rc<Expr>> {
    let mut out = Vec::new();
    find_holes_into(expr, &mut out);
    out
}

fn find_holes_into(expr: &Rc<Expr>, out: &mut Vec<Rc<Expr>>) {
    match &expr.kind {
        ExprKind::Hole(_) => out.push(expr.clone()),
        ExprKind::Var(_) | ExprKind::Lit(_) => {}
        ExprKind::Unary(_, a) => find_holes_into(a, out),
        ExprKind::Binary(_, a, b) => {
            find_holes_into(a, out);
            find_holes_into(b, out);
        }
        ExprKind::Tuple(items) => {
            for e in items.iter() {
                find_holes_into(e, out);
            }
        }
        ExprKind::TupleGet(e, _) => find_holes_into(e, out),
        ExprKind::RecordGet(e, _) => find_holes_into(e, out),
        ExprKind::HandleGet(e) => find_holes_into(e, out),
        ExprKind::Map(bag, f) => {
            find_holes_into(bag, out);
            find_holes_into(&f.body, out);
        }
        ExprKind::Filter(bag, p) => {
            find_holes_into(bag, out);
            find_holes_into(&p.body, out);
        }
        ExprKind::MakeMap(bag, k, v) => {
            find_holes_into(bag, out);
            find_holes_into(&k.body, out);
            find_holes_into(&v.body, out);
        }
        ExprKind::MapGet(m, k) => {
            find_holes_into(m, out);
            find_holes_into(k, out);
        }
        ExprKind::AlterMaybe(m, f) => {
            find_holes_into(m, out);
            find_holes_into(&f.body, out);
        }
        ExprKind::Lambda(l) => find_holes_into(&l.body, out),
        ExprKind::App(f, a) => {
            find_holes_into(f, out);
            find_holes_into(a, out);
        }
    }
}

/// The set of variables that occur free in `expr` — bound by no enclosing
/// lambda. Used by substitution to decide whether a lambda needs its bound
/// variable renamed before a replacement can be pushed under it.
pub fn free_vars(expr: &Expr) -> HashSet<Symbol> {
    let mut out = HashSet::new();
    free_vars_into(expr, &mut out);
    out
}

fn free_vars_into(expr: &Expr, out: &mut HashSet<Symbol>) {
    match &expr.kind {
        ExprKind::Var(name) => {
            out.insert(*name);
        }
        ExprKind::Lit(_) | ExprKind::Hole(_) => {}
        ExprKind::Unary(_, a) => free_vars_into(a, out),
        ExprKind::Binary(_, a, b) => {
            free_vars_into(a, out);
            free_vars_into(b, out);
        }
        ExprKind::Tuple(items) => {
            for e in items.iter() {
                free_vars_into(e, out);
            }
        }
        ExprKind::TupleGet(e, _) => free_vars_into(e, out),
        ExprKind::RecordGet(e, _) => free_vars_into(e, out),
        ExprKind::HandleGet(e) => free_vars_into(e, out),
        ExprKind::Map(bag, f) => {
            free_vars_into(bag, out);
            free_vars_lambda_into(f, out);
        }
        ExprKind::Filter(bag, p) => {
            free_vars_into(bag, out);
            free_vars_lambda_into(p, out);
        }
        ExprKind::MakeMap(bag, k, v) => {
            free_vars_into(bag, out);
            free_vars_lambda_into(k, out);
            free_vars_lambda_into(v, out);
        }
        ExprKind::MapGet(m, k) => {
            free_vars_into(m, out);
            free_vars_into(k, out);
        }
        ExprKind::AlterMaybe(m, f) => {
            free_vars_into(m, out);
            free_vars_lambda_into(f, out);
        }
        ExprKind::Lambda(l) => free_vars_lambda_into(l, out),
        ExprKind::App(f, a) => {
            free_vars_into(f, out);
            free_vars_into(a, out);
        }
    }
}

fn free_vars_lambda_into(lambda: &crate::expr::Lambda, out: &mut HashSet<Symbol>) {
    let mut body_vars = HashSet::new();
    free_vars_into(&lambda.body, &mut body_vars);
    body_vars.remove(&lambda.param);
    out.extend(body_vars);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;
    use crate::hole::{HoleBuilder, HoleIdGen, HoleRef};
    use crate::ty::Type;
    use deriva_base::Interner;
    use std::fmt;
    use std::rc::Rc;

    #[derive(Debug)]
    struct StubBuilder;
    impl HoleBuilder for StubBuilder {
        fn build<'a>(
            &'a self,
            _cache: &'a crate::cache::Cache,
            _size: u32,
        ) -> Box<dyn Iterator<Item = Rc<Expr>> + 'a> {
            Box::new(std::iter::empty())
        }
    }

    fn _assert_stub_is_debug(b: &StubBuilder) -> String {
        format!("{b:?}")
    }

    #[test]
    fn contains_holes_finds_nested_hole() {
        let gen = HoleIdGen::new();
        let h = Expr::hole(HoleRef {
            name: gen.fresh_hole(),
            ty: Type::Int,
            builder: Rc::new(StubBuilder),
        });
        let e = Expr::unary(crate::lit::UnaryOp::Not, h, Type::Bool);
        assert!(contains_holes(&e));
        assert!(!contains_holes(&Expr::int(1)));
    }

    #[test]
    fn find_holes_visits_func_before_arg_order() {
        let gen = HoleIdGen::new();
        let func_ty = Type::function([Type::Int], Type::Int);
        let func_hole = Expr::hole(HoleRef { name: gen.fresh_hole(), ty: func_ty, builder: Rc::new(StubBuilder) });
        let arg_hole = Expr::hole(HoleRef { name: gen.fresh_hole(), ty: Type::Int, builder: Rc::new(StubBuilder) });
        let e = Expr::app(func_hole.clone(), arg_hole.clone());
        let holes = find_holes(&e);
        assert_eq!(holes.len(), 2);
        assert_eq!(holes[0].to_string(), func_hole.to_string());
        assert_eq!(holes[1].to_string(), arg_hole.to_string());
    }

    #[test]
    fn free_vars_excludes_lambda_bound_name() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let body = Expr::var(x, Type::Int);
        let lambda = Rc::new(crate::expr::Lambda::new(x, Type::Int, body));
        let e = Expr::lambda(lambda);
        assert!(free_vars(&e).is_empty());
    }
}
