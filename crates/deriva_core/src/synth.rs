//! The outer CEGIS loop: alternate between searching for a hole-filling that
//! agrees with every example seen so far, and asking the solver for a
//! counterexample that breaks it.
//!
//! A round either returns a closed expression the solver could not refute
//! (done) or grows the example set by one and searches again. There is no
//! bound on how many rounds this can take other than `max_size` eventually
//! making [`find_consistent_exps`] come back empty, at which point synthesis
//! reports no solution rather than looping forever.
//!
//! Counterexamples are scalar-only by construction: [`deriva_verify::Model`]
//! only carries witnesses for `Int`/`Bool` free variables (see that crate's
//! encoding strategy), so a specification whose only free variables are
//! collections can never grow its own example set past the one the caller
//! seeds it with. That is a property of the solver's encoding, not of this
//! loop, and is accepted here rather than worked around.

use std::cell::RefCell;
use std::rc::Rc;

use deriva_base::{Interner, Result, Symbol, SynthesisError};
use deriva_eval::{Env, Value};
use deriva_expr::subst::expand;
use deriva_expr::traverse::find_holes;
use deriva_expr::{Expr, HoleId, Literal, Type, UnaryOp};
use deriva_verify::{Model, SmtOracle};

use crate::builder::Builder;
use crate::cost::CostModel;
use crate::search::{find_consistent_exps, SearchContext};

/// Passes of [`expand`] to allow before giving up on convergence. Chosen
/// generously relative to how deep a realistic hole-chain gets; hitting this
/// ceiling means something is wrong with the candidate mapping, not that the
/// search needs to run longer.
const MAX_EXPAND_ROUNDS: u32 = 64;

/// Runs the outer CEGIS loop to completion.
///
/// `examples` seeds the example set; an empty set is a legitimate starting
/// point (every check against it holds vacuously) and is how a spec whose
/// only free variables the solver will discover through counterexamples
/// should start. Any environment `examples` does carry must bind every free
/// variable `spec` references, since [`deriva_eval::eval`] panics on an
/// unbound one rather than treating it as an error. Returns `Ok(None)` if no
/// hole-filling holds within `max_size` nodes per hole; returns an error only
/// when a core invariant breaks (e.g. the solver times out, or `expand`
/// fails to converge), never as the ordinary "nothing found" outcome.
pub fn synth(
    spec: &Rc<Expr>,
    builder: &Builder,
    examples: Vec<Rc<Env>>,
    cost_model: Rc<dyn CostModel>,
    interner: Rc<RefCell<Interner>>,
    oracle: &SmtOracle,
    max_size: u32,
) -> Result<Option<Rc<Expr>>> {
    let mut examples = examples;
    let mut seen_counterexamples: Vec<Vec<(Symbol, Literal)>> = Vec::new();

    loop {
        let mut ctx = SearchContext::new(cost_model.clone());
        let solutions =
            find_consistent_exps(spec, builder, &examples, &mut ctx, &interner, oracle, max_size);

        let Some(fill) = cheapest(&solutions, &cost_model) else {
            return Ok(None);
        };

        let closed = {
            let mut interner_mut = interner.borrow_mut();
            expand(spec, &fill, &mut interner_mut, MAX_EXPAND_ROUNDS)
                .ok_or_else(|| SynthesisError::ExpansionDidNotConverge { spec: format!("{spec}") })?
        };
        debug_assert!(find_holes(&closed).is_empty(), "expand() left a hole behind");

        let negated = Expr::unary(UnaryOp::Not, closed.clone(), Type::Bool);
        let counterexample = {
            let interner_ref = interner.borrow();
            oracle
                .satisfy(&negated, &interner_ref)
                .map_err(|e| SynthesisError::Collaborator(e.to_string()))?
        };

        match counterexample {
            None => return Ok(Some(closed)),
            Some(model) => {
                if seen_counterexamples.iter().any(|seen| bindings_equal(seen, &model.bindings)) {
                    return Err(SynthesisError::DuplicateCounterexample);
                }
                seen_counterexamples.push(model.bindings.clone());
                examples.push(model_to_env(&model));
            }
        }
    }
}

fn cheapest(
    solutions: &[Vec<(HoleId, Rc<Expr>)>],
    cost_model: &Rc<dyn CostModel>,
) -> Option<Vec<(HoleId, Rc<Expr>)>> {
    solutions
        .iter()
        .min_by_key(|sol| sol.iter().map(|(_, e)| cost_model.cost(e)).sum::<i64>())
        .cloned()
}

fn bindings_equal(a: &[(Symbol, Literal)], b: &[(Symbol, Literal)]) -> bool {
    a.len() == b.len() && a.iter().all(|pair| b.contains(pair))
}

/// Builds a fresh example environment out of a counterexample model. Only
/// the scalar bindings the model carries are bound; any free variable of
/// `spec` the solver treated as opaque (every non-`Int`/`Bool` type) is
/// simply absent, matching the model's own contract.
fn model_to_env(model: &Model) -> Rc<Env> {
    let mut env = Env::empty();
    for (name, lit) in &model.bindings {
        let value = match lit {
            Literal::Int(n) => Value::Int(*n),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Str(s) => Value::Str(s.clone()),
        };
        env = env.extend(*name, value);
    }
    env
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

    #[test]
    fn synthesizes_a_constant_that_matches_every_example() {
        let interner = Rc::new(RefCell::new(Interner::new()));
        let hole_gen = Rc::new(HoleIdGen::new());
        let oracle = SmtOracle::new();

        let hole = Expr::hole(HoleRef { name: hole_gen.fresh_hole(), ty: Type::Int, builder: Rc::new(StubBuilder) });
        let spec = Expr::binary(BinOp::Eq, hole, Expr::int(3), Type::Bool);

        let roots = vec![Expr::int(1), Expr::int(2), Expr::int(3)];
        let builder = Builder::new(roots, Rc::new(ConstantCost), hole_gen, interner.clone());

        let result = synth(&spec, &builder, vec![Env::empty()], Rc::new(ConstantCost), interner, &oracle, 1)
            .expect("synthesis should not error");
        let closed = result.expect("a constant hole-filling should be found");
        assert_eq!(closed.to_string(), "(3 == 3)");
    }

    #[test]
    fn no_candidate_matching_yields_none() {
        let interner = Rc::new(RefCell::new(Interner::new()));
        let hole_gen = Rc::new(HoleIdGen::new());
        let oracle = SmtOracle::new();

        let hole = Expr::hole(HoleRef { name: hole_gen.fresh_hole(), ty: Type::Int, builder: Rc::new(StubBuilder) });
        let spec = Expr::binary(BinOp::Eq, hole, Expr::int(99), Type::Bool);

        let roots = vec![Expr::int(1), Expr::int(2)];
        let builder = Builder::new(roots, Rc::new(ConstantCost), hole_gen, interner.clone());

        let result = synth(&spec, &builder, vec![Env::empty()], Rc::new(ConstantCost), interner, &oracle, 1)
            .expect("synthesis should not error");
        assert!(result.is_none());
    }

    #[test]
    fn empty_example_set_still_converges_via_counterexamples() {
        let interner = Rc::new(RefCell::new(Interner::new()));
        let hole_gen = Rc::new(HoleIdGen::new());
        let oracle = SmtOracle::new();

        let x = interner.borrow_mut().intern("x");
        let hole = Expr::hole(HoleRef { name: hole_gen.fresh_hole(), ty: Type::Int, builder: Rc::new(StubBuilder) });
        let spec = Expr::binary(BinOp::Eq, hole, Expr::var(x, Type::Int), Type::Bool);

        let roots = vec![Expr::int(0), Expr::var(x, Type::Int)];
        let builder = Builder::new(roots, Rc::new(ConstantCost), hole_gen, interner.clone());

        let result = synth(&spec, &builder, vec![], Rc::new(ConstantCost), interner, &oracle, 1)
            .expect("synthesis should not error");
        let closed = result.expect("the free variable itself should be found as a hole-filling");
        assert_eq!(closed.to_string(), "(x == x)");
    }
}
