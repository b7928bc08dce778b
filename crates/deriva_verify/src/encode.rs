//! Encodes a hole-free [`Expr`] into a Z3 [`Dynamic`] AST.
//!
//! Z3 gets a full, semantic encoding only for the quantifier-free scalar
//! fragment: `Int`, `Bool`, and structural decomposition of `Tuple`/`Record`
//! built from them. Everything else this language can express — bags,
//! maps, `sum`/`the`, lambdas applied through `Map`/`Filter`/`MakeMap` — has
//! no compact first-order theory backing it in Z3, so it is encoded the way
//! the solver treats any construct it can't reason about semantically: as
//! an uninterpreted function of its encoded children. Two occurrences of
//! the same construct applied to equal children are forced equal by Z3's
//! congruence closure even though the solver never learns what `sum` or
//! `Map` actually compute — sound for checking whether two candidates are
//! obviously the same expression, not for deriving arithmetic facts about
//! what a `sum` evaluates to. Actual evaluation of those constructs belongs
//! to `deriva_eval`, not this crate.

use std::cell::RefCell;
use std::collections::HashMap;

use z3::ast::{Ast, Bool, Dynamic, Int};
use z3::{Context, FuncDecl, Sort};

use deriva_base::Symbol;
use deriva_expr::{BinOp, Expr, ExprKind, Type, UnaryOp};

/// Which Z3 sort a `deriva_expr::Type` maps to. Only `Int` and `Bool` get a
/// sort Z3 actually interprets; everything else shares one uninterpreted
/// "opaque identity" sort, encoded as `Int` purely because Z3's Rust
/// bindings make fresh uninterpreted sorts more awkward to thread through
/// than reusing `IntSort` as a bag of distinct tokens.
fn leaf_kind(ty: &Type) -> LeafKind {
    match ty {
        Type::Int => LeafKind::Int,
        Type::Bool => LeafKind::Bool,
        _ => LeafKind::Opaque,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeafKind {
    Int,
    Bool,
    Opaque,
}

pub struct Encoder<'ctx> {
    ctx: &'ctx Context,
    interner: &'ctx deriva_base::Interner,
    consts: RefCell<HashMap<Symbol, Dynamic<'ctx>>>,
    fresh: RefCell<u32>,
}

impl<'ctx> Encoder<'ctx> {
    pub fn new(ctx: &'ctx Context, interner: &'ctx deriva_base::Interner) -> Self {
        Encoder { ctx, interner, consts: RefCell::new(HashMap::new()), fresh: RefCell::new(0) }
    }

    /// Encodes `expr`, which must carry `Type::Bool` and contain no holes.
    pub fn encode_bool(&self, expr: &Expr) -> Bool<'ctx> {
        debug_assert_eq!(expr.ty, Type::Bool, "encode_bool requires a Bool-typed expression");
        self.encode(expr)
            .as_bool()
            .unwrap_or_else(|| panic!("expression typed Bool encoded to a non-bool Z3 sort"))
    }

    fn named_const(&self, name: Symbol, ty: &Type) -> Dynamic<'ctx> {
        if let Some(existing) = self.consts.borrow().get(&name) {
            return existing.clone();
        }
        let resolved = self.interner.resolve(name);
        let built = match leaf_kind(ty) {
            LeafKind::Int => Dynamic::from_ast(&Int::new_const(self.ctx, resolved)),
            LeafKind::Bool => Dynamic::from_ast(&Bool::new_const(self.ctx, resolved)),
            LeafKind::Opaque => Dynamic::from_ast(&Int::new_const(self.ctx, resolved)),
        };
        self.consts.borrow_mut().insert(name, built.clone());
        built
    }

    fn fresh_name(&self, prefix: &str) -> String {
        let mut n = self.fresh.borrow_mut();
        *n += 1;
        format!("{prefix}!{n}")
    }

    pub fn encode(&self, expr: &Expr) -> Dynamic<'ctx> {
        match &expr.kind {
            ExprKind::Var(name) => self.named_const(*name, &expr.ty),
            ExprKind::Lit(deriva_expr::Literal::Int(n)) => Dynamic::from_ast(&Int::from_i64(self.ctx, *n)),
            ExprKind::Lit(deriva_expr::Literal::Bool(b)) => Dynamic::from_ast(&Bool::from_bool(self.ctx, *b)),
            ExprKind::Lit(deriva_expr::Literal::Str(s)) => {
                Dynamic::from_ast(&Int::from_i64(self.ctx, string_token(s)))
            }
            ExprKind::Hole(h) => panic!("cannot hand the solver an open hole ({})", h.name),
            ExprKind::Unary(UnaryOp::Not, a) => {
                Dynamic::from_ast(&self.encode(a).as_bool().expect("Not operand must be Bool").not())
            }
            ExprKind::Unary(op, a) => self.opaque_call(&format!("{op}"), &[a], &expr.ty),
            ExprKind::Binary(BinOp::Add, a, b) => {
                let l = self.encode(a).as_int().expect("Add operand must be Int");
                let r = self.encode(b).as_int().expect("Add operand must be Int");
                Dynamic::from_ast(&(l + r))
            }
            ExprKind::Binary(BinOp::And, a, b) => {
                let l = self.encode(a).as_bool().expect("And operand must be Bool");
                let r = self.encode(b).as_bool().expect("And operand must be Bool");
                Dynamic::from_ast(&Bool::and(self.ctx, &[&l, &r]))
            }
            ExprKind::Binary(BinOp::Or, a, b) => {
                let l = self.encode(a).as_bool().expect("Or operand must be Bool");
                let r = self.encode(b).as_bool().expect("Or operand must be Bool");
                Dynamic::from_ast(&Bool::or(self.ctx, &[&l, &r]))
            }
            ExprKind::Binary(BinOp::Eq, a, b) => Dynamic::from_ast(&self.structural_eq(&a.ty, a, b)),
            ExprKind::Binary(BinOp::In, a, b) => self.opaque_call("in", &[a, b], &Type::Bool),
            ExprKind::Tuple(items) => {
                // Only reachable standalone (not immediately under `TupleGet`
                // or `Eq`, both of which short-circuit into this node's
                // children directly); give it an opaque identity.
                let children: Vec<&Expr> = items.iter().map(|e| e.as_ref()).collect();
                self.opaque_call("tuple", &children, &expr.ty)
            }
            ExprKind::TupleGet(tuple, idx) => {
                if let ExprKind::Tuple(items) = &tuple.kind {
                    return self.encode(&items[*idx]);
                }
                self.opaque_call(&format!("get{idx}"), &[tuple], &expr.ty)
            }
            ExprKind::RecordGet(record, field) => {
                if let ExprKind::Record(fields) = &record.kind {
                    if let Some((_, v)) = fields.iter().find(|(f, _)| f == field) {
                        return self.encode(v);
                    }
                }
                self.opaque_call(&format!("field_{}", self.interner.resolve(*field)), &[record], &expr.ty)
            }
            ExprKind::HandleGet(handle) => self.opaque_call("handle_val", &[handle], &expr.ty),
            ExprKind::Map(bag, lambda) => self.opaque_call("map", &[bag, &lambda.body], &expr.ty),
            ExprKind::Filter(bag, pred) => self.opaque_call("filter", &[bag, &pred.body], &expr.ty),
            ExprKind::MakeMap(bag, key, value) => {
                self.opaque_call("make_map", &[bag, &key.body, &value.body], &expr.ty)
            }
            ExprKind::MapGet(map, key) => self.opaque_call("map_get", &[map, key], &expr.ty),
            ExprKind::AlterMaybe(maybe, lambda) => {
                self.opaque_call("alter_maybe", &[maybe, &lambda.body], &expr.ty)
            }
            ExprKind::Lambda(lambda) => self.opaque_call("lambda", &[&lambda.body], &expr.ty),
            ExprKind::App(func, arg) => self.opaque_call("app", &[func, arg], &expr.ty),
        }
    }

    /// Structural equality: decomposes `Tuple`/`Record` types field-by-field
    /// so Z3 sees the real per-field comparison instead of one opaque token,
    /// and falls back to same-sort equality (real for `Int`/`Bool`,
    /// congruence-based for everything else) at the leaves.
    fn structural_eq(&self, ty: &Type, a: &Expr, b: &Expr) -> Bool<'ctx> {
        match ty {
            Type::Tuple(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for (i, item_ty) in items.iter().enumerate() {
                    let a_i = Expr::tuple_get(a_rc(a), i);
                    let b_i = Expr::tuple_get(a_rc(b), i);
                    parts.push(self.structural_eq(item_ty, &a_i, &b_i));
                }
                let refs: Vec<&Bool> = parts.iter().collect();
                if refs.is_empty() {
                    Bool::from_bool(self.ctx, true)
                } else {
                    Bool::and(self.ctx, &refs)
                }
            }
            Type::Record(fields) => {
                let mut parts = Vec::with_capacity(fields.len());
                for (name, field_ty) in fields.iter() {
                    let a_i = Expr::record_get(a_rc(a), *name);
                    let b_i = Expr::record_get(a_rc(b), *name);
                    parts.push(self.structural_eq(field_ty, &a_i, &b_i));
                }
                let refs: Vec<&Bool> = parts.iter().collect();
                if refs.is_empty() {
                    Bool::from_bool(self.ctx, true)
                } else {
                    Bool::and(self.ctx, &refs)
                }
            }
            _ => self
                .encode(a)
                ._eq(&self.encode(b)),
        }
    }

    fn opaque_call(&self, tag: &str, args: &[&Expr], result_ty: &Type) -> Dynamic<'ctx> {
        let encoded_args: Vec<Dynamic<'ctx>> = args.iter().map(|a| self.encode(a)).collect();
        let domain_sorts: Vec<Sort> = encoded_args.iter().map(|a| a.get_sort()).collect();
        let domain_refs: Vec<&Sort> = domain_sorts.iter().collect();
        let range = match leaf_kind(result_ty) {
            LeafKind::Int => Sort::int(self.ctx),
            LeafKind::Bool => Sort::bool(self.ctx),
            LeafKind::Opaque => Sort::int(self.ctx),
        };
        let func_decl = FuncDecl::new(self.ctx, tag, &domain_refs, &range);
        let arg_refs: Vec<&dyn Ast> = encoded_args.iter().map(|a| a as &dyn Ast).collect();
        Dynamic::from_ast(&func_decl.apply(&arg_refs))
    }
}

fn string_token(s: &str) -> i64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut h = DefaultHasher::new();
    s.hash(&mut h);
    (h.finish() as i64).wrapping_abs()
}

/// `tuple_get`/`record_get` want an `Rc<Expr>`; cloning an `&Expr` here costs
/// one clone of the node only (its children stay shared via `Rc`).
fn a_rc(e: &Expr) -> std::rc::Rc<Expr> {
    std::rc::Rc::new(e.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deriva_base::Interner;
    use z3::{Config, SatResult, Solver};

    #[test]
    fn int_arithmetic_round_trips() {
        let interner = Interner::new();
        let cfg = Config::new();
        let ctx = Context::new(&cfg);
        let enc = Encoder::new(&ctx, &interner);
        let e = Expr::binary(BinOp::Eq, Expr::binary(BinOp::Add, Expr::int(2), Expr::int(3), Type::Int), Expr::int(5), Type::Bool);
        let b = enc.encode_bool(&e);
        let solver = Solver::new(&ctx);
        solver.assert(&b.not());
        assert_eq!(solver.check(), SatResult::Unsat);
    }

    #[test]
    fn tuple_equality_decomposes_field_by_field() {
        let interner = Interner::new();
        let cfg = Config::new();
        let ctx = Context::new(&cfg);
        let enc = Encoder::new(&ctx, &interner);
        let a = Expr::tuple(vec![Expr::int(1), Expr::bool(true)]);
        let b = Expr::tuple(vec![Expr::int(1), Expr::bool(true)]);
        let eq = Expr::binary(BinOp::Eq, a, b, Type::Bool);
        let encoded = enc.encode_bool(&eq);
        let solver = Solver::new(&ctx);
        solver.assert(&encoded.not());
        assert_eq!(solver.check(), SatResult::Unsat);
    }
}
