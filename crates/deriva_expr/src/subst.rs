//! Capture-avoiding substitution and hole expansion.
//!
//! `substitute` is the single primitive both the search ("fill this hole
//! with this candidate") and the outer CEGIS loop ("expand every hole in
//! this partial solution to a fixed point") build on.

use std::rc::Rc;

use deriva_base::{Interner, Symbol};

use crate::expr::{Expr, ExprKind, Lambda};
use crate::hole::HoleId;
use crate::traverse::free_vars;

/// Replaces every occurrence of hole `target` in `expr` with `replacement`.
///
/// Lambdas are renamed on the fly, via `interner`, whenever their bound
/// variable would otherwise capture a variable free in `replacement` —
/// standard capture-avoiding substitution, just keyed on a hole identity
/// instead of a variable name.
pub fn substitute_hole(
    expr: &Rc<Expr>,
    target: HoleId,
    replacement: &Rc<Expr>,
    interner: &mut Interner,
) -> Rc<Expr> {
    match &expr.kind {
        ExprKind::Hole(h) if h.name == target => replacement.clone(),
        ExprKind::Hole(_) | ExprKind::Var(_) | ExprKind::Lit(_) => expr.clone(),
        ExprKind::Unary(op, a) => {
            let a2 = substitute_hole(a, target, replacement, interner);
            if Rc::ptr_eq(&a2, a) {
                expr.clone()
            } else {
                Expr::unary(*op, a2, expr.ty.clone())
            }
        }
        ExprKind::Binary(op, a, b) => {
            let a2 = substitute_hole(a, target, replacement, interner);
            let b2 = substitute_hole(b, target, replacement, interner);
            if Rc::ptr_eq(&a2, a) && Rc::ptr_eq(&b2, b) {
                expr.clone()
            } else {
                Expr::binary(*op, a2, b2, expr.ty.clone())
            }
        }
        ExprKind::Tuple(items) => {
            let items2: Vec<Rc<Expr>> = items
                .iter()
                .map(|e| substitute_hole(e, target, replacement, interner))
                .collect();
            Expr::new(ExprKind::Tuple(items2.into()), expr.ty.clone())
        }
        ExprKind::TupleGet(e, idx) => {
            let e2 = substitute_hole(e, target, replacement, interner);
            Expr::new(ExprKind::TupleGet(e2, *idx), expr.ty.clone())
        }
        ExprKind::RecordGet(e, field) => {
            let e2 = substitute_hole(e, target, replacement, interner);
            Expr::new(ExprKind::RecordGet(e2, *field), expr.ty.clone())
        }
        ExprKind::HandleGet(e) => {
            let e2 = substitute_hole(e, target, replacement, interner);
            Expr::new(ExprKind::HandleGet(e2), expr.ty.clone())
        }
        ExprKind::Map(bag, f) => {
            let bag2 = substitute_hole(bag, target, replacement, interner);
            let f2 = substitute_hole_lambda(f, target, replacement, interner);
            Expr::new(ExprKind::Map(bag2, f2), expr.ty.clone())
        }
        ExprKind::Filter(bag, p) => {
            let bag2 = substitute_hole(bag, target, replacement, interner);
            let p2 = substitute_hole_lambda(p, target, replacement, interner);
            Expr::new(ExprKind::Filter(bag2, p2), expr.ty.clone())
        }
        ExprKind::MakeMap(bag, k, v) => {
            let bag2 = substitute_hole(bag, target, replacement, interner);
            let k2 = substitute_hole_lambda(k, target, replacement, interner);
            let v2 = substitute_hole_lambda(v, target, replacement, interner);
            Expr::new(ExprKind::MakeMap(bag2, k2, v2), expr.ty.clone())
        }
        ExprKind::MapGet(m, k) => {
            let m2 = substitute_hole(m, target, replacement, interner);
            let k2 = substitute_hole(k, target, replacement, interner);
            Expr::new(ExprKind::MapGet(m2, k2), expr.ty.clone())
        }
        ExprKind::AlterMaybe(m, f) => {
            let m2 = substitute_hole(m, target, replacement, interner);
            let f2 = substitute_hole_lambda(f, target, replacement, interner);
            Expr::new(ExprKind::AlterMaybe(m2, f2), expr.ty.clone())
        }
        ExprKind::Lambda(l) => {
            let l2 = substitute_hole_lambda(l, target, replacement, interner);
            Expr::new(ExprKind::Lambda(l2), expr.ty.clone())
        }
        ExprKind::App(f, a) => {
            let f2 = substitute_hole(f, target, replacement, interner);
            let a2 = substitute_hole(a, target, replacement, interner);
            Expr::new(ExprKind::App(f2, a2), expr.ty.clone())
        }
    }
}

fn substitute_hole_lambda(
    lambda: &Rc<Lambda>,
    target: HoleId,
    replacement: &Rc<Expr>,
    interner: &mut Interner,
) -> Rc<Lambda> {
    let (param, body_source) = avoid_capture(lambda, replacement, interner);
    let body = substitute_hole(&body_source, target, replacement, interner);
    Rc::new(Lambda::new(param, lambda.param_type.clone(), body))
}

/// If `lambda`'s bound variable would capture a variable free in
/// `replacement`, renames it to a fresh symbol and rewrites the body to
/// match; otherwise returns the lambda's existing parameter and body
/// untouched.
fn avoid_capture(
    lambda: &Rc<Lambda>,
    replacement: &Rc<Expr>,
    interner: &mut Interner,
) -> (Symbol, Rc<Expr>) {
    let replacement_free = free_vars(replacement);
    if !replacement_free.contains(&lambda.param) {
        return (lambda.param, lambda.body.clone());
    }
    let fresh_name = interner.intern(&format!("{}$", interner.resolve(lambda.param)));
    let renamed_body = rename_var(&lambda.body, lambda.param, fresh_name);
    (fresh_name, renamed_body)
}

fn rename_var(expr: &Rc<Expr>, from: Symbol, to: Symbol) -> Rc<Expr> {
    match &expr.kind {
        ExprKind::Var(name) if *name == from => Expr::var(to, expr.ty.clone()),
        ExprKind::Var(_) | ExprKind::Lit(_) | ExprKind::Hole(_) => expr.clone(),
        ExprKind::Unary(op, a) => Expr::unary(*op, rename_var(a, from, to), expr.ty.clone()),
        ExprKind::Binary(op, a, b) => {
            Expr::binary(*op, rename_var(a, from, to), rename_var(b, from, to), expr.ty.clone())
        }
        ExprKind::Tuple(items) => Expr::new(
            ExprKind::Tuple(items.iter().map(|e| rename_var(e, from, to)).collect()),
            expr.ty.clone(),
        ),
        ExprKind::TupleGet(e, idx) => {
            Expr::new(ExprKind::TupleGet(rename_var(e, from, to), *idx), expr.ty.clone())
        }
        ExprKind::RecordGet(e, field) => {
            Expr::new(ExprKind::RecordGet(rename_var(e, from, to), *field), expr.ty.clone())
        }
        ExprKind::HandleGet(e) => Expr::new(ExprKind::HandleGet(rename_var(e, from, to)), expr.ty.clone()),
        ExprKind::Map(bag, f) => Expr::new(
            ExprKind::Map(rename_var(bag, from, to), rename_var_lambda(f, from, to)),
            expr.ty.clone(),
        ),
        ExprKind::Filter(bag, p) => Expr::new(
            ExprKind::Filter(rename_var(bag, from, to), rename_var_lambda(p, from, to)),
            expr.ty.clone(),
        ),
        ExprKind::MakeMap(bag, k, v) => Expr::new(
            ExprKind::MakeMap(
                rename_var(bag, from, to),
                rename_var_lambda(k, from, to),
                rename_var_lambda(v, from, to),
            ),
            expr.ty.clone(),
        ),
        ExprKind::MapGet(m, k) => Expr::new(
            ExprKind::MapGet(rename_var(m, from, to), rename_var(k, from, to)),
            expr.ty.clone(),
        ),
        ExprKind::AlterMaybe(m, f) => Expr::new(
            ExprKind::AlterMaybe(rename_var(m, from, to), rename_var_lambda(f, from, to)),
            expr.ty.clone(),
        ),
        ExprKind::Lambda(l) => Expr::new(ExprKind::Lambda(rename_var_lambda(l, from, to)), expr.ty.clone()),
        ExprKind::App(f, a) => {
            Expr::new(ExprKind::App(rename_var(f, from, to), rename_var(a, from, to)), expr.ty.clone())
        }
    }
}

fn rename_var_lambda(lambda: &Rc<Lambda>, from: Symbol, to: Symbol) -> Rc<Lambda> {
    if lambda.param == from {
        // `from` is shadowed again inside; stop renaming here.
        return lambda.clone();
    }
    Rc::new(Lambda::new(lambda.param, lambda.param_type.clone(), rename_var(&lambda.body, from, to)))
}

/// Repeatedly fills every hole named in `fills` until no named hole remains
/// or `max_rounds` is exceeded.
///
/// One round is not always enough: a candidate pulled in to fill hole A may
/// itself have been built with hole B still open (the builder instantiates
/// holes depth-first but a higher hole can still reference a lower one
/// through a shared cache entry), so `expand` iterates to a fixed point
/// rather than doing a single substitution pass.
pub fn expand(
    expr: &Rc<Expr>,
    fills: &[(HoleId, Rc<Expr>)],
    interner: &mut Interner,
    max_rounds: u32,
) -> Option<Rc<Expr>> {
    let mut current = expr.clone();
    for _ in 0..max_rounds {
        let mut changed = false;
        for (hole, replacement) in fills {
            let next = substitute_hole(&current, *hole, replacement, interner);
            if !Rc::ptr_eq(&next, &current) {
                changed = true;
            }
            current = next;
        }
        if !changed {
            return Some(current);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hole::{HoleBuilder, HoleIdGen, HoleRef};
    use crate::ty::Type;
    use std::fmt;

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

    #[test]
    fn substitute_replaces_matching_hole_only() {
        let mut interner = Interner::new();
        let gen = HoleIdGen::new();
        let h1 = gen.fresh_hole();
        let h2 = gen.fresh_hole();
        let hole1 = Expr::hole(HoleRef { name: h1, ty: Type::Int, builder: Rc::new(StubBuilder) });
        let hole2 = Expr::hole(HoleRef { name: h2, ty: Type::Int, builder: Rc::new(StubBuilder) });
        let e = Expr::binary(crate::lit::BinOp::Add, hole1, hole2, Type::Int);
        let filled = substitute_hole(&e, h1, &Expr::int(3), &mut interner);
        assert_eq!(filled.to_string(), "(3 + ?h1[Int])");
    }

    #[test]
    fn substitute_renames_lambda_to_avoid_capture() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let gen = HoleIdGen::new();
        let h = gen.fresh_hole();
        let hole = Expr::hole(HoleRef { name: h, ty: Type::Int, builder: Rc::new(StubBuilder) });
        let body = Expr::binary(crate::lit::BinOp::Add, Expr::var(x, Type::Int), hole, Type::Int);
        let lambda = Rc::new(Lambda::new(x, Type::Int, body));
        let e = Expr::lambda(lambda);
        // replacement mentions `x` free — substituting it under \x must rename the binder.
        let replacement = Expr::var(x, Type::Int);
        let result = substitute_hole(&e, h, &replacement, &mut interner);
        match &result.kind {
            ExprKind::Lambda(l) => assert_ne!(l.param, x),
            _ => panic!("expected lambda"),
        }
    }

    #[test]
    fn expand_converges_on_chained_fills() {
        let mut interner = Interner::new();
        let gen = HoleIdGen::new();
        let h1 = gen.fresh_hole();
        let h2 = gen.fresh_hole();
        let hole1 = Expr::hole(HoleRef { name: h1, ty: Type::Int, builder: Rc::new(StubBuilder) });
        let hole2 = Expr::hole(HoleRef { name: h2, ty: Type::Int, builder: Rc::new(StubBuilder) });
        let top = Expr::binary(crate::lit::BinOp::Add, hole1, Expr::int(1), Type::Int);
        let fills = vec![(h1, hole2.clone()), (h2, Expr::int(9))];
        let result = expand(&top, &fills, &mut interner, 10).unwrap();
        assert_eq!(result.to_string(), "(9 + 1)");
    }
}
