//! The SMT oracle: `satisfy` and `feasible`, the two operations the outer
//! search treats as an opaque external solver call.
//!
//! Each call creates a fresh [`Context`] rather than reusing one across
//! calls — the search fires thousands of small, unrelated queries over the
//! lifetime of a synthesis run, and a shared context would accumulate
//! declarations from every prior query. A fresh context per call costs
//! nothing a 10-second-timeout solver wasn't already going to dwarf.

use std::collections::HashMap;

use z3::{Config, Context, SatResult, Solver};

use deriva_base::{Interner, Symbol};
use deriva_expr::{Expr, ExprKind, Literal, Type};

use crate::encode::Encoder;
use crate::error::{VerifyError, VerifyResult};

/// A satisfying assignment to every free variable of the query that
/// produced it, restricted to the variables the encoder gave a real sort —
/// `Int` and `Bool`. Variables of any other type are existentially
/// quantified away by the encoding (see [`crate::encode`]) and so have no
/// concrete witness to report.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub bindings: Vec<(Symbol, Literal)>,
}

impl Model {
    pub fn get(&self, name: Symbol) -> Option<&Literal> {
        self.bindings.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

pub struct SmtOracle {
    timeout_ms: u32,
}

impl SmtOracle {
    pub fn new() -> Self {
        SmtOracle { timeout_ms: 10_000 }
    }

    pub fn with_timeout_ms(timeout_ms: u32) -> Self {
        SmtOracle { timeout_ms }
    }

    /// `true` iff `predicate` (which must be `Bool`-typed and hole-free) is
    /// satisfiable under no assumptions.
    pub fn feasible(&self, predicate: &Expr, interner: &Interner) -> VerifyResult<bool> {
        match self.run(predicate, interner)? {
            SatResult::Sat => Ok(true),
            SatResult::Unsat => Ok(false),
            SatResult::Unknown => Err(VerifyError::Unknown),
        }
    }

    /// If `predicate` is satisfiable, a concrete assignment to its scalar
    /// free variables; `None` if it's unsatisfiable.
    pub fn satisfy(&self, predicate: &Expr, interner: &Interner) -> VerifyResult<Option<Model>> {
        let cfg = self.config();
        let ctx = Context::new(&cfg);
        let solver = Solver::new(&ctx);
        let encoder = Encoder::new(&ctx, interner);
        let encoded = encoder.encode_bool(predicate);
        solver.assert(&encoded);

        match solver.check() {
            SatResult::Unsat => Ok(None),
            SatResult::Unknown => Err(VerifyError::Unknown),
            SatResult::Sat => {
                let model = solver.get_model().ok_or_else(|| {
                    VerifyError::Internal("solver reported sat but returned no model".into())
                })?;
                let var_types = collect_var_types(predicate);
                let mut bindings = Vec::new();
                for (name, ty) in var_types {
                    match ty {
                        Type::Int => {
                            let sym = interner.resolve(name);
                            let c = z3::ast::Int::new_const(&ctx, sym);
                            if let Some(v) = model.eval(&c, true).and_then(|v| v.as_i64()) {
                                bindings.push((name, Literal::Int(v)));
                            }
                        }
                        Type::Bool => {
                            let sym = interner.resolve(name);
                            let c = z3::ast::Bool::new_const(&ctx, sym);
                            if let Some(v) = model.eval(&c, true).and_then(|v| v.as_bool()) {
                                bindings.push((name, Literal::Bool(v)));
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Some(Model { bindings }))
            }
        }
    }

    fn run(&self, predicate: &Expr, interner: &Interner) -> VerifyResult<SatResult> {
        let cfg = self.config();
        let ctx = Context::new(&cfg);
        let solver = Solver::new(&ctx);
        let encoder = Encoder::new(&ctx, interner);
        solver.assert(&encoder.encode_bool(predicate));
        Ok(solver.check())
    }

    fn config(&self) -> Config {
        let mut cfg = Config::new();
        cfg.set_param_value("timeout", &self.timeout_ms.to_string());
        cfg
    }
}

impl Default for SmtOracle {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_var_types(expr: &Expr) -> HashMap<Symbol, Type> {
    let mut out = HashMap::new();
    collect_var_types_into(expr, &mut out);
    out
}

fn collect_var_types_into(expr: &Expr, out: &mut HashMap<Symbol, Type>) {
    if let ExprKind::Var(name) = &expr.kind {
        out.entry(*name).or_insert_with(|| expr.ty.clone());
    }
    match &expr.kind {
        ExprKind::Var(_) | ExprKind::Lit(_) | ExprKind::Hole(_) => {}
        ExprKind::Unary(_, a) => collect_var_types_into(a, out),
        ExprKind::Binary(_, a, b) => {
            collect_var_types_into(a, out);
            collect_var_types_into(b, out);
        }
        ExprKind::Tuple(items) => items.iter().for_each(|e| collect_var_types_into(e, out)),
        ExprKind::TupleGet(e, _) => collect_var_types_into(e, out),
        ExprKind::RecordGet(e, _) => collect_var_types_into(e, out),
        ExprKind::HandleGet(e) => collect_var_types_into(e, out),
        ExprKind::Map(bag, f) => {
            collect_var_types_into(bag, out);
            collect_var_types_into(&f.body, out);
        }
        ExprKind::Filter(bag, p) => {
            collect_var_types_into(bag, out);
            collect_var_types_into(&p.body, out);
        }
        ExprKind::MakeMap(bag, k, v) => {
            collect_var_types_into(bag, out);
            collect_var_types_into(&k.body, out);
            collect_var_types_into(&v.body, out);
        }
        ExprKind::MapGet(m, k) => {
            collect_var_types_into(m, out);
            collect_var_types_into(k, out);
        }
        ExprKind::AlterMaybe(m, f) => {
            collect_var_types_into(m, out);
            collect_var_types_into(&f.body, out);
        }
        ExprKind::Lambda(l) => collect_var_types_into(&l.body, out),
        ExprKind::App(f, a) => {
            collect_var_types_into(f, out);
            collect_var_types_into(a, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deriva_expr::BinOp;

    #[test]
    fn feasible_tautology_and_contradiction() {
        let interner = Interner::new();
        let oracle = SmtOracle::new();
        let tautology = Expr::binary(BinOp::Or, Expr::bool(true), Expr::bool(false), Type::Bool);
        assert!(oracle.feasible(&tautology, &interner).unwrap());

        let contradiction = Expr::binary(
            BinOp::And,
            Expr::bool(true),
            Expr::unary(deriva_expr::UnaryOp::Not, Expr::bool(true), Type::Bool),
            Type::Bool,
        );
        assert!(!oracle.feasible(&contradiction, &interner).unwrap());
    }

    #[test]
    fn satisfy_returns_a_witness_for_a_free_variable() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let oracle = SmtOracle::new();
        let gt_five = Expr::binary(
            BinOp::Eq,
            Expr::var(x, Type::Int),
            Expr::int(7),
            Type::Bool,
        );
        let model = oracle.satisfy(&gt_five, &interner).unwrap().expect("should be sat");
        assert_eq!(model.get(x), Some(&Literal::Int(7)));
    }

    #[test]
    fn satisfy_returns_none_when_unsat() {
        let interner = Interner::new();
        let oracle = SmtOracle::new();
        let contradiction = Expr::binary(
            BinOp::And,
            Expr::bool(true),
            Expr::unary(deriva_expr::UnaryOp::Not, Expr::bool(true), Type::Bool),
            Type::Bool,
        );
        assert_eq!(oracle.satisfy(&contradiction, &interner).unwrap(), None);
    }
}
