//! Inner search: size-bounded enumeration that fills a specification's holes
//! consistently with a fixed set of examples.
//!
//! `pick_goal` (here, simply `find_holes(spec)[0]`, per the ordering
//! guarantee [`deriva_expr::traverse::find_holes`] documents) always attacks
//! the first remaining hole; once it is filled the recursion attacks
//! whatever hole is now first. Every candidate the [`crate::builder::Builder`]
//! produces at a given size — not only ones of the goal's type — is
//! fingerprinted against the goal hole's own per-example environments (one
//! environment per example if the hole sits at top level, several if it sits
//! inside a `Map`/`Filter`/`AlterMaybe` body) before entering the cache: two
//! candidates of the same type that evaluate identically across that set are
//! interchangeable for the rest of the search, so only the cheaper survives.
//! This is the cache's real defense against combinatorial blowup;
//! [`CostModel::best_case_cost`]-based pruning on top of it is a second,
//! cruder net.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use deriva_base::Interner;
use deriva_eval::{all_envs_for_hole, eval, Env, Value};
use deriva_expr::subst::substitute_hole;
use deriva_expr::traverse::find_holes;
use deriva_expr::{Expr, ExprKind, HoleId, Tag, Type};
use deriva_verify::SmtOracle;

use crate::builder::Builder;
use crate::cost::CostModel;

/// Mutable state threaded through one `synth` outer-loop iteration's worth of
/// `find_consistent_exps` calls: the shared candidate cache, the
/// observational-equivalence side table, and the best whole-solution cost
/// seen so far (used to prune candidates whose best-case cost can no longer
/// beat it).
///
/// The fingerprint table lives here rather than as a field the search
/// threads through `Cache` itself because `Cache` has no notion of "which
/// example set produced this entry" — it only knows type, size, and the tag
/// that contributed it. A fresh `SearchContext` per outer CEGIS round is
/// cheap and sidesteps stale fingerprints whose `Vec<Value>` length no
/// longer matches the (now larger) example set.
pub struct SearchContext {
    cache: deriva_expr::Cache,
    cost_model: Rc<dyn CostModel>,
    best_cost: Option<i64>,
    next_tag: u32,
    fingerprints: HashMap<(Type, Vec<Value>), (Tag, Rc<Expr>)>,
}

impl SearchContext {
    pub fn new(cost_model: Rc<dyn CostModel>) -> Self {
        SearchContext {
            cache: deriva_expr::Cache::new(),
            cost_model,
            best_cost: None,
            next_tag: 1,
            fingerprints: HashMap::new(),
        }
    }

    fn fresh_tag(&mut self) -> Tag {
        let tag = Tag(self.next_tag);
        self.next_tag += 1;
        tag
    }

    /// Every candidate currently cached that exactly matches `ty` and `size`.
    pub fn candidates_of(&self, ty: &Type, size: u32) -> Vec<Rc<Expr>> {
        self.cache.find(ty, size).collect()
    }
}

/// Every consistent way to fill `spec`'s holes, one hole at a time, up to
/// `max_size` nodes per fill. A `spec` with no holes left returns either
/// `vec![vec![]]` (it already holds on every example) or `vec![]`.
pub fn find_consistent_exps(
    spec: &Rc<Expr>,
    builder: &Builder,
    examples: &[Rc<Env>],
    ctx: &mut SearchContext,
    interner: &Rc<RefCell<Interner>>,
    oracle: &SmtOracle,
    max_size: u32,
) -> Vec<Vec<(HoleId, Rc<Expr>)>> {
    let holes = find_holes(spec);
    if holes.len() as u32 > max_size {
        return vec![];
    }
    let Some(goal) = holes.first() else {
        return if holds_on_every_example(spec, examples) { vec![vec![]] } else { vec![] };
    };
    let (goal_id, goal_ty) = match &goal.kind {
        ExprKind::Hole(h) => (h.name, h.ty.clone()),
        _ => unreachable!("find_holes only returns Hole nodes"),
    };

    let g_examples: Vec<Rc<Env>> = examples
        .iter()
        .flat_map(|env| all_envs_for_hole(spec, goal_id, env))
        .collect();

    let mut results = Vec::new();
    for size in 1..=max_size {
        let tag = ctx.fresh_tag();
        let built: Vec<Rc<Expr>> = builder.build(&ctx.cache, size).collect();
        for candidate in built {
            if admit_candidate(ctx, &candidate, &g_examples) {
                ctx.cache.add(candidate, tag);
            }
        }

        for candidate in ctx.candidates_of(&goal_ty, size) {
            let cost = ctx.cost_model.cost(&candidate);
            if let Some(best) = ctx.best_cost {
                if cost > best {
                    continue;
                }
            }

            let filled = {
                let mut interner_mut = interner.borrow_mut();
                substitute_hole(spec, goal_id, &candidate, &mut interner_mut)
            };

            let remaining = find_holes(&filled);
            if !remaining.is_empty() && !check_feasible(&filled, oracle, interner) {
                continue;
            }

            if !holds_on_every_example(&filled, examples) {
                continue;
            }

            let rest = if remaining.is_empty() {
                vec![vec![]]
            } else {
                find_consistent_exps(&filled, builder, examples, ctx, interner, oracle, max_size - size)
            };

            for sub in rest {
                let mut combo = Vec::with_capacity(1 + sub.len());
                combo.push((goal_id, candidate.clone()));
                combo.extend(sub);
                if ctx.cost_model.is_monotonic() {
                    let total: i64 = combo.iter().map(|(_, e)| ctx.cost_model.cost(e)).sum();
                    ctx.best_cost = Some(ctx.best_cost.map_or(total, |b| b.min(total)));
                }
                results.push(combo);
            }
        }
    }
    results
}

/// `true` iff `expr` (must be `Bool`-typed and hole-free) evaluates to
/// `Value::Bool(true)` under every example environment.
fn holds_on_every_example(expr: &Rc<Expr>, examples: &[Rc<Env>]) -> bool {
    examples.iter().all(|env| matches!(eval(expr, env), Ok(Value::Bool(true))))
}

/// Observational-equivalence gate: `true` iff `candidate` is worth adding to
/// the cache, i.e. no cheaper-or-equal candidate of the same type already
/// produces the same value on every environment in `g_examples` (the current
/// goal hole's own per-example environments, from [`all_envs_for_hole`]). A
/// duplicate that is strictly cheaper than the one on file replaces it —
/// evicting the stale, costlier entry from the cache, not just the
/// fingerprint table.
fn admit_candidate(ctx: &mut SearchContext, candidate: &Rc<Expr>, g_examples: &[Rc<Env>]) -> bool {
    let values: Vec<Value> = g_examples
        .iter()
        .map(|env| eval(candidate, env).unwrap_or_else(|e| panic!("cached candidate hit {e:?}")))
        .collect();
    let key = (candidate.ty.clone(), values);
    let candidate_cost = ctx.cost_model.cost(candidate);

    let existing = ctx.fingerprints.get(&key).map(|(_, e)| e.clone());
    match existing {
        Some(existing) if ctx.cost_model.cost(&existing) <= candidate_cost => false,
        Some(existing) => {
            ctx.cache.evict_one(&existing.ty, existing.size(), &existing);
            ctx.fingerprints.insert(key, (Tag(0), candidate.clone()));
            true
        }
        None => {
            ctx.fingerprints.insert(key, (Tag(0), candidate.clone()));
            true
        }
    }
}

/// A conservative feasibility pre-check: replaces every hole still open in
/// `expr` with a fresh free variable of its type and asks the solver whether
/// the result is satisfiable at all. Returns `true` (never incorrectly
/// prunes) whenever `expr` isn't `Bool`-typed or the solver can't decide —
/// pruning here is an optimization, not a soundness requirement, so any
/// uncertainty defaults to "keep searching".
fn check_feasible(expr: &Rc<Expr>, oracle: &SmtOracle, interner: &Rc<RefCell<Interner>>) -> bool {
    if expr.ty != Type::Bool {
        return true;
    }
    let holes = find_holes(expr);
    let mut placeholder = expr.clone();
    {
        let mut interner_mut = interner.borrow_mut();
        for hole in &holes {
            if let ExprKind::Hole(h) = &hole.kind {
                let name = interner_mut.intern(&format!("{}$feasible", h.name));
                let var = Expr::var(name, h.ty.clone());
                placeholder = substitute_hole(&placeholder, h.name, &var, &mut interner_mut);
            }
        }
    }
    let interner_ref = interner.borrow();
    match oracle.feasible(&placeholder, &interner_ref) {
        Ok(feasible) => feasible,
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::ConstantCost;
    use deriva_expr::{BinOp, HoleIdGen, HoleRef};

    #[derive(Debug)]
    struct StubBuilder;
    impl deriva_expr::HoleBuilder for StubBuilder {
        fn build<'a>(
            &'a self,
            _cache: &'a deriva_expr::Cache,
            _size: u32,
        ) -> Box<dyn Iterator<Item = Rc<Expr>> + 'a> {
            Box::new(std::iter::empty())
        }
    }

    fn setup() -> (Rc<RefCell<Interner>>, Rc<HoleIdGen>, SmtOracle) {
        (Rc::new(RefCell::new(Interner::new())), Rc::new(HoleIdGen::new()), SmtOracle::new())
    }

    #[test]
    fn holeless_spec_checks_directly_against_examples() {
        let (interner, hole_gen, oracle) = setup();
        let spec = Expr::binary(BinOp::Eq, Expr::int(4), Expr::int(4), Type::Bool);
        let builder = Builder::new(vec![], Rc::new(ConstantCost), hole_gen, interner.clone());
        let mut ctx = SearchContext::new(Rc::new(ConstantCost));
        let examples = vec![Env::empty()];
        let got = find_consistent_exps(&spec, &builder, &examples, &mut ctx, &interner, &oracle, 1);
        assert_eq!(got, vec![Vec::new()]);
    }

    #[test]
    fn contradictory_holeless_spec_yields_no_solutions() {
        let (interner, hole_gen, oracle) = setup();
        let spec = Expr::binary(BinOp::Eq, Expr::int(4), Expr::int(5), Type::Bool);
        let builder = Builder::new(vec![], Rc::new(ConstantCost), hole_gen, interner.clone());
        let mut ctx = SearchContext::new(Rc::new(ConstantCost));
        let examples = vec![Env::empty()];
        let got = find_consistent_exps(&spec, &builder, &examples, &mut ctx, &interner, &oracle, 1);
        assert!(got.is_empty());
    }

    #[test]
    fn fills_a_single_int_hole_to_match_the_example() {
        let (interner, hole_gen, oracle) = setup();
        let gen = HoleIdGen::new();
        let hole_id = gen.fresh_hole();
        let hole = Expr::hole(HoleRef { name: hole_id, ty: Type::Int, builder: Rc::new(StubBuilder) });
        let spec = Expr::binary(BinOp::Eq, hole, Expr::int(7), Type::Bool);

        let roots = vec![Expr::int(0), Expr::int(1), Expr::int(7)];
        let builder = Builder::new(roots, Rc::new(ConstantCost), hole_gen, interner.clone());
        let mut ctx = SearchContext::new(Rc::new(ConstantCost));
        let examples = vec![Env::empty()];
        let got = find_consistent_exps(&spec, &builder, &examples, &mut ctx, &interner, &oracle, 1);
        assert!(got.iter().any(|fill| fill.len() == 1 && fill[0].1.to_string() == "7"));
    }
}
