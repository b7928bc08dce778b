//! Cost models: how the search ranks candidates of the same type.
//!
//! Costs are `i64`, not a float, specifically so ordering is exact and
//! `Ord`-derivable rather than subject to `PartialOrd` NaN pitfalls — nothing
//! here needs fractional precision once [`RuntimeCost`]'s "0.01 per node"
//! term is folded into a fixed-point scale (one node costs `1`, scaled so
//! every comparison stays an integer comparison).

use std::rc::Rc;

use deriva_expr::{Expr, ExprKind, TypeTag, UnaryOp};

/// A cost model: assigns a non-negative cost to closed candidates, and a
/// conservative lower bound to candidates that may still contain holes.
pub trait CostModel {
    /// The cost of a closed expression. Panics if `e` still contains a hole —
    /// callers must only call this once every hole is filled.
    fn cost(&self, e: &Expr) -> i64;

    /// A lower bound on the cost any hole-filling of `e` could achieve. Used
    /// by the search to prune a partial candidate before it is ever closed.
    fn best_case_cost(&self, e: &Expr) -> i64;

    /// Whether replacing a sub-expression with a cheaper one can never
    /// increase the enclosing expression's cost. The search only prunes by
    /// cost ceiling when this holds.
    fn is_monotonic(&self) -> bool;
}

/// Every expression costs exactly `1`. Trivially monotonic.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantCost;

impl CostModel for ConstantCost {
    fn cost(&self, e: &Expr) -> i64 {
        assert!(!contains_hole(e), "cost() called on an expression that still has a hole");
        1
    }

    fn best_case_cost(&self, _e: &Expr) -> i64 {
        1
    }

    fn is_monotonic(&self) -> bool {
        true
    }
}

/// Bottom-up sum of per-node contributions, plus a flat `1` (representing the
/// source's `0.01`) per node. `sum(e)` adds `cardinality(e)`; `Map(e, f)` and
/// `Filter(e, p)` each add `cardinality(e) * body_cost`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeCost;

impl RuntimeCost {
    fn eval(&self, e: &Expr, optimistic: bool) -> i64 {
        match &e.kind {
            ExprKind::Hole(_) => {
                assert!(optimistic, "cost() called on an expression that still has a hole");
                0
            }
            ExprKind::Var(_) | ExprKind::Lit(_) => 1,
            ExprKind::Unary(UnaryOp::Sum, a) => self.eval(a, optimistic) + cardinality(a) + 1,
            ExprKind::Unary(_, a) => self.eval(a, optimistic) + 1,
            ExprKind::Binary(_, a, b) => self.eval(a, optimistic) + self.eval(b, optimistic) + 1,
            ExprKind::Tuple(items) => items.iter().map(|e| self.eval(e, optimistic)).sum::<i64>() + 1,
            ExprKind::TupleGet(e, _) => self.eval(e, optimistic) + 1,
            ExprKind::RecordGet(e, _) => self.eval(e, optimistic) + 1,
            ExprKind::HandleGet(e) => self.eval(e, optimistic) + 1,
            ExprKind::Map(bag, f) => {
                self.eval(bag, optimistic) + cardinality(bag) * self.eval(&f.body, optimistic) + 1
            }
            ExprKind::Filter(bag, p) => {
                self.eval(bag, optimistic) + cardinality(bag) * self.eval(&p.body, optimistic) + 1
            }
            ExprKind::MakeMap(bag, k, v) => {
                self.eval(bag, optimistic) + self.eval(&k.body, optimistic) + self.eval(&v.body, optimistic) + 1
            }
            ExprKind::MapGet(m, k) => self.eval(m, optimistic) + self.eval(k, optimistic) + 1,
            ExprKind::AlterMaybe(m, f) => self.eval(m, optimistic) + self.eval(&f.body, optimistic) + 1,
            ExprKind::Lambda(l) => self.eval(&l.body, optimistic) + 1,
            ExprKind::App(f, a) => self.eval(f, optimistic) + self.eval(a, optimistic) + 1,
        }
    }
}

impl CostModel for RuntimeCost {
    fn cost(&self, e: &Expr) -> i64 {
        self.eval(e, false)
    }

    fn best_case_cost(&self, e: &Expr) -> i64 {
        self.eval(e, true)
    }

    fn is_monotonic(&self) -> bool {
        true
    }
}

fn contains_hole(e: &Expr) -> bool {
    deriva_expr::traverse::contains_holes(e)
}

/// An optimistic estimate of how many elements `e` denotes, used only to
/// weight `sum`/`Map`/`Filter` costs. Not a measurement: `1000` for a free
/// variable of collection type, `cardinality(m) / 3` for `MapGet(m, _)`
/// (guessing the map narrows things down somewhat), `0` everywhere else.
fn cardinality(e: &Expr) -> i64 {
    match &e.kind {
        ExprKind::Var(_) if matches!(e.ty.tag(), TypeTag::Bag | TypeTag::Map) => 1000,
        ExprKind::MapGet(m, _) => cardinality(m) / 3,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deriva_expr::{BinOp, Type};

    #[test]
    fn constant_cost_is_always_one() {
        let e = Expr::binary(BinOp::Add, Expr::int(1), Expr::int(2), Type::Int);
        assert_eq!(ConstantCost.cost(&e), 1);
        assert!(ConstantCost.is_monotonic());
    }

    #[test]
    fn runtime_cost_grows_with_node_count() {
        let small = Expr::int(1);
        let big = Expr::binary(BinOp::Add, Expr::int(1), Expr::int(2), Type::Int);
        assert!(RuntimeCost.cost(&big) > RuntimeCost.cost(&small));
    }

    #[test]
    fn runtime_cost_weighs_sum_by_cardinality() {
        let mut interner = deriva_base::Interner::new();
        let xs = interner.intern("xs");
        let bag = Expr::var(xs, Type::bag(Type::Int));
        let summed = Expr::unary(deriva_expr::UnaryOp::Sum, bag, Type::Int);
        // a free bag variable carries cardinality 1000, so summing it should
        // dwarf the cost of a plain literal.
        assert!(RuntimeCost.cost(&summed) > 100);
    }

    #[test]
    #[should_panic(expected = "still has a hole")]
    fn cost_panics_on_open_hole() {
        use deriva_expr::{HoleBuilder, HoleIdGen, HoleRef};
        #[derive(Debug)]
        struct Stub;
        impl HoleBuilder for Stub {
            fn build<'a>(
                &'a self,
                _cache: &'a deriva_expr::Cache,
                _size: u32,
            ) -> Box<dyn Iterator<Item = Rc<Expr>> + 'a> {
                Box::new(std::iter::empty())
            }
        }
        let gen = HoleIdGen::new();
        let hole = Expr::hole(HoleRef { name: gen.fresh_hole(), ty: Type::Int, builder: Rc::new(Stub) });
        RuntimeCost.cost(&hole);
    }
}
