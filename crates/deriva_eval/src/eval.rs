//! The reference interpreter.
//!
//! `eval` runs a (possibly still-holed) expression against one concrete
//! environment. Hitting a hole is not a Rust error in the `std::error`
//! sense — it's the expected outcome when the search calls `eval` on a
//! partial candidate before that hole has a filling — so it's threaded back
//! as `Err(EvalSignal::MissingHole(..))` rather than mixed in with the
//! handful of conditions ([`deriva_base::SynthesisError`]) that mean the
//! evaluator was handed something it should never see, such as an unbound
//! variable in a supposedly-closed expression.

use std::rc::Rc;

use deriva_expr::{BinOp, Expr, ExprKind, Type, UnaryOp};

use crate::env::Env;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalSignal {
    MissingHole(deriva_expr::HoleId),
}

pub type EvalResult = Result<Value, EvalSignal>;

pub fn eval(expr: &Expr, env: &Rc<Env>) -> EvalResult {
    match &expr.kind {
        ExprKind::Var(name) => Ok(env
            .lookup(*name)
            .unwrap_or_else(|| panic!("unbound variable {name} in a supposedly-closed expression"))
            .clone()),
        ExprKind::Lit(lit) => Ok(eval_literal(lit)),
        ExprKind::Hole(h) => Err(EvalSignal::MissingHole(h.name)),
        ExprKind::Unary(op, a) => eval_unary(*op, a, env, &expr.ty),
        ExprKind::Binary(op, a, b) => eval_binary(*op, a, b, env),
        ExprKind::Tuple(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items.iter() {
                values.push(eval(item, env)?);
            }
            Ok(Value::Tuple(Rc::new(values)))
        }
        ExprKind::TupleGet(e, idx) => match eval(e, env)? {
            Value::Tuple(items) => Ok(items[*idx].clone()),
            other => unreachable!("TupleGet on non-tuple value {other}"),
        },
        ExprKind::RecordGet(e, field) => match eval(e, env)? {
            Value::Record(fields) => Ok(fields
                .iter()
                .find(|(f, _)| f == field)
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| unreachable!("record missing field {field}"))),
            other => unreachable!("RecordGet on non-record value {other}"),
        },
        ExprKind::HandleGet(e) => match eval(e, env)? {
            Value::Handle(_, _, inner) => Ok((*inner).clone()),
            other => unreachable!("HandleGet on non-handle value {other}"),
        },
        ExprKind::Map(bag, lambda) => {
            let items = eval_bag(bag, env)?;
            let mut out = Vec::with_capacity(items.len());
            for item in items.iter() {
                let inner_env = env.extend(lambda.param, item.clone());
                out.push(eval(&lambda.body, &inner_env)?);
            }
            Ok(Value::Bag(Rc::new(out)))
        }
        ExprKind::Filter(bag, predicate) => {
            let items = eval_bag(bag, env)?;
            let mut out = Vec::with_capacity(items.len());
            for item in items.iter() {
                let inner_env = env.extend(predicate.param, item.clone());
                if as_bool(eval(&predicate.body, &inner_env)?) {
                    out.push(item.clone());
                }
            }
            Ok(Value::Bag(Rc::new(out)))
        }
        ExprKind::MakeMap(bag, key, value) => {
            let items = eval_bag(bag, env)?;
            let mut out: Vec<(Value, Value)> = Vec::new();
            for item in items.iter() {
                let key_env = env.extend(key.param, item.clone());
                let k = eval(&key.body, &key_env)?;
                let value_env = env.extend(value.param, item.clone());
                let v = eval(&value.body, &value_env)?;
                if let Some(slot) = out.iter_mut().find(|(k2, _)| k2 == &k) {
                    slot.1 = v;
                } else {
                    out.push((k, v));
                }
            }
            Ok(Value::Map(Rc::new(out)))
        }
        ExprKind::MapGet(map, key) => {
            let map_value = eval(map, env)?;
            let key_value = eval(key, env)?;
            let value_ty = match &map.ty {
                Type::Map(_, v) => (**v).clone(),
                other => unreachable!("MapGet on non-map type {other}"),
            };
            match map_value {
                Value::Map(entries) => Ok(entries
                    .iter()
                    .find(|(k, _)| k == &key_value)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_else(|| default_value(&value_ty))),
                other => unreachable!("MapGet on non-map value {other}"),
            }
        }
        ExprKind::AlterMaybe(maybe, lambda) => match eval(maybe, env)? {
            Value::Maybe(None) => Ok(Value::Maybe(None)),
            Value::Maybe(Some(inner)) => {
                let inner_env = env.extend(lambda.param, (*inner).clone());
                Ok(Value::Maybe(Some(Rc::new(eval(&lambda.body, &inner_env)?))))
            }
            other => unreachable!("AlterMaybe on non-maybe value {other}"),
        },
        ExprKind::Lambda(lambda) => Ok(Value::Closure(lambda.clone(), env.clone())),
        ExprKind::App(func, arg) => match eval(func, env)? {
            Value::Closure(lambda, closure_env) => {
                let arg_value = eval(arg, env)?;
                let call_env = closure_env.extend(lambda.param, arg_value);
                eval(&lambda.body, &call_env)
            }
            other => unreachable!("App on non-function value {other}"),
        },
    }
}

fn eval_literal(lit: &deriva_expr::Literal) -> Value {
    match lit {
        deriva_expr::Literal::Int(n) => Value::Int(*n),
        deriva_expr::Literal::Bool(b) => Value::Bool(*b),
        deriva_expr::Literal::Str(s) => Value::Str(s.clone()),
    }
}

fn eval_bag(expr: &Expr, env: &Rc<Env>) -> Result<Rc<Vec<Value>>, EvalSignal> {
    match eval(expr, env)? {
        Value::Bag(items) => Ok(items),
        other => unreachable!("expected a bag, found {other}"),
    }
}

fn as_bool(v: Value) -> bool {
    match v {
        Value::Bool(b) => b,
        other => unreachable!("expected a bool, found {other}"),
    }
}

fn eval_unary(op: UnaryOp, arg: &Expr, env: &Rc<Env>, result_ty: &Type) -> EvalResult {
    match op {
        UnaryOp::Sum => {
            let items = eval_bag(arg, env)?;
            let total: i64 = items
                .iter()
                .map(|v| match v {
                    Value::Int(n) => *n,
                    other => unreachable!("sum over non-int bag element {other}"),
                })
                .sum();
            Ok(Value::Int(total))
        }
        UnaryOp::The => {
            let items = eval_bag(arg, env)?;
            Ok(Value::Maybe(items.first().cloned().map(Rc::new)))
        }
        UnaryOp::Not => {
            let b = as_bool(eval(arg, env)?);
            let _ = result_ty;
            Ok(Value::Bool(!b))
        }
    }
}

fn eval_binary(op: BinOp, lhs: &Expr, rhs: &Expr, env: &Rc<Env>) -> EvalResult {
    match op {
        BinOp::Add => {
            let a = eval(lhs, env)?;
            let b = eval(rhs, env)?;
            match (a, b) {
                (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x + y)),
                (x, y) => unreachable!("Add over non-int operands {x}, {y}"),
            }
        }
        BinOp::And => Ok(Value::Bool(as_bool(eval(lhs, env)?) && as_bool(eval(rhs, env)?))),
        BinOp::Or => Ok(Value::Bool(as_bool(eval(lhs, env)?) || as_bool(eval(rhs, env)?))),
        BinOp::Eq => {
            let a = eval(lhs, env)?;
            let b = eval(rhs, env)?;
            Ok(Value::Bool(a == b))
        }
        BinOp::In => {
            let needle = eval(lhs, env)?;
            let haystack = eval_bag(rhs, env)?;
            Ok(Value::Bool(haystack.iter().any(|v| v == &needle)))
        }
    }
}

/// The value a `MapGet` yields for a key the map doesn't hold, keyed purely
/// off the value type. There is no user-visible "default expression" in
/// this model, so a `MakeMap` is only sound to query at keys that were
/// present when it was built; `MapGet` at any other key degrades to this
/// type-directed zero value rather than panicking.
fn default_value(ty: &Type) -> Value {
    match ty {
        Type::Int => Value::Int(0),
        Type::Bool => Value::Bool(false),
        Type::Str => Value::Str(Rc::from("")),
        Type::Native(tag) => Value::Native(*tag, 0),
        Type::Bag(_) => Value::Bag(Rc::new(Vec::new())),
        Type::Maybe(_) => Value::Maybe(None),
        Type::Map(_, _) => Value::Map(Rc::new(Vec::new())),
        Type::Tuple(items) => Value::Tuple(Rc::new(items.iter().map(default_value).collect())),
        Type::Record(fields) => {
            Value::Record(Rc::new(fields.iter().map(|(f, t)| (*f, default_value(t))).collect()))
        }
        Type::Handle(tag, inner) => Value::Handle(*tag, 0, Rc::new(default_value(inner))),
        Type::Function(..) => unreachable!("no default value for a function type"),
    }
}

/// Every environment active at a point where hole `target` is reached while
/// evaluating `expr` against `top_env`.
///
/// A hole nested inside a `Map`/`Filter`/`MakeMap` lambda is reached once per
/// bag element, each time under a different binding for the lambda's
/// parameter — so this returns a `Vec`, not a single `Env`. Other holes
/// encountered along the way (the target is not necessarily the only hole
/// left, just the one the search is asking about) are papered over with a
/// type-directed placeholder so evaluation can keep walking the rest of the
/// structure instead of stopping at the first unrelated hole.
pub fn all_envs_for_hole(expr: &Expr, target: deriva_expr::HoleId, top_env: &Rc<Env>) -> Vec<Rc<Env>> {
    let mut out = Vec::new();
    let _ = collect(expr, top_env, target, &mut out);
    out
}

fn collect(expr: &Expr, env: &Rc<Env>, target: deriva_expr::HoleId, out: &mut Vec<Rc<Env>>) -> Value {
    match &expr.kind {
        ExprKind::Var(name) => env
            .lookup(*name)
            .unwrap_or_else(|| panic!("unbound variable {name} in a supposedly-closed expression"))
            .clone(),
        ExprKind::Lit(lit) => eval_literal(lit),
        ExprKind::Hole(h) => {
            if h.name == target {
                out.push(env.clone());
            }
            default_value(&expr.ty)
        }
        ExprKind::Unary(op, a) => {
            let a_val = collect(a, env, target, out);
            eval_unary_on(*op, a_val)
        }
        ExprKind::Binary(op, a, b) => {
            let a_val = collect(a, env, target, out);
            let b_val = collect(b, env, target, out);
            eval_binary_on(*op, a_val, b_val)
        }
        ExprKind::Tuple(items) => {
            Value::Tuple(Rc::new(items.iter().map(|e| collect(e, env, target, out)).collect()))
        }
        ExprKind::TupleGet(e, idx) => match collect(e, env, target, out) {
            Value::Tuple(items) => items[*idx].clone(),
            other => unreachable!("TupleGet on non-tuple value {other}"),
        },
        ExprKind::RecordGet(e, field) => match collect(e, env, target, out) {
            Value::Record(fields) => fields
                .iter()
                .find(|(f, _)| f == field)
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| default_value(&expr.ty)),
            _ => default_value(&expr.ty),
        },
        ExprKind::HandleGet(e) => match collect(e, env, target, out) {
            Value::Handle(_, _, inner) => (*inner).clone(),
            _ => default_value(&expr.ty),
        },
        ExprKind::Map(bag, lambda) => {
            let items = match collect(bag, env, target, out) {
                Value::Bag(items) => items,
                _ => Rc::new(Vec::new()),
            };
            let mut results = Vec::with_capacity(items.len());
            for item in items.iter() {
                let inner_env = env.extend(lambda.param, item.clone());
                results.push(collect(&lambda.body, &inner_env, target, out));
            }
            Value::Bag(Rc::new(results))
        }
        ExprKind::Filter(bag, predicate) => {
            let items = match collect(bag, env, target, out) {
                Value::Bag(items) => items,
                _ => Rc::new(Vec::new()),
            };
            let mut results = Vec::new();
            for item in items.iter() {
                let inner_env = env.extend(predicate.param, item.clone());
                if let Value::Bool(true) = collect(&predicate.body, &inner_env, target, out) {
                    results.push(item.clone());
                }
            }
            Value::Bag(Rc::new(results))
        }
        ExprKind::MakeMap(bag, key, value) => {
            let items = match collect(bag, env, target, out) {
                Value::Bag(items) => items,
                _ => Rc::new(Vec::new()),
            };
            let mut entries: Vec<(Value, Value)> = Vec::new();
            for item in items.iter() {
                let key_env = env.extend(key.param, item.clone());
                let k = collect(&key.body, &key_env, target, out);
                let value_env = env.extend(value.param, item.clone());
                let v = collect(&value.body, &value_env, target, out);
                if let Some(slot) = entries.iter_mut().find(|(k2, _)| k2 == &k) {
                    slot.1 = v;
                } else {
                    entries.push((k, v));
                }
            }
            Value::Map(Rc::new(entries))
        }
        ExprKind::MapGet(map, key) => {
            let map_val = collect(map, env, target, out);
            let key_val = collect(key, env, target, out);
            match map_val {
                Value::Map(entries) => entries
                    .iter()
                    .find(|(k, _)| k == &key_val)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_else(|| default_value(&expr.ty)),
                _ => default_value(&expr.ty),
            }
        }
        ExprKind::AlterMaybe(maybe, lambda) => match collect(maybe, env, target, out) {
            Value::Maybe(None) => Value::Maybe(None),
            Value::Maybe(Some(inner)) => {
                let inner_env = env.extend(lambda.param, (*inner).clone());
                Value::Maybe(Some(Rc::new(collect(&lambda.body, &inner_env, target, out))))
            }
            _ => default_value(&expr.ty),
        },
        ExprKind::Lambda(lambda) => Value::Closure(lambda.clone(), env.clone()),
        ExprKind::App(func, arg) => match collect(func, env, target, out) {
            Value::Closure(lambda, closure_env) => {
                let arg_val = collect(arg, env, target, out);
                let call_env = closure_env.extend(lambda.param, arg_val);
                collect(&lambda.body, &call_env, target, out)
            }
            _ => default_value(&expr.ty),
        },
    }
}

fn eval_unary_on(op: UnaryOp, a: Value) -> Value {
    match op {
        UnaryOp::Sum => match a {
            Value::Bag(items) => Value::Int(
                items
                    .iter()
                    .map(|v| if let Value::Int(n) = v { *n } else { 0 })
                    .sum(),
            ),
            _ => Value::Int(0),
        },
        UnaryOp::The => match a {
            Value::Bag(items) => Value::Maybe(items.first().cloned().map(Rc::new)),
            _ => Value::Maybe(None),
        },
        UnaryOp::Not => match a {
            Value::Bool(b) => Value::Bool(!b),
            _ => Value::Bool(false),
        },
    }
}

fn eval_binary_on(op: BinOp, a: Value, b: Value) -> Value {
    match op {
        BinOp::Add => match (a, b) {
            (Value::Int(x), Value::Int(y)) => Value::Int(x + y),
            _ => Value::Int(0),
        },
        BinOp::And => Value::Bool(matches!(a, Value::Bool(true)) && matches!(b, Value::Bool(true))),
        BinOp::Or => Value::Bool(matches!(a, Value::Bool(true)) || matches!(b, Value::Bool(true))),
        BinOp::Eq => Value::Bool(a == b),
        BinOp::In => match b {
            Value::Bag(items) => Value::Bool(items.iter().any(|v| v == &a)),
            _ => Value::Bool(false),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deriva_expr::HoleId;

    #[test]
    fn arithmetic_and_booleans() {
        let env = Env::empty();
        let e = Expr::binary(BinOp::Add, Expr::int(2), Expr::int(3), Type::Int);
        assert_eq!(eval(&e, &env), Ok(Value::Int(5)));

        let e = Expr::unary(UnaryOp::Not, Expr::bool(false), Type::Bool);
        assert_eq!(eval(&e, &env), Ok(Value::Bool(true)));
    }

    #[test]
    fn sum_and_the_over_bags() {
        let mut interner = deriva_base::Interner::new();
        let x = interner.intern("x");
        let env = Env::empty().extend(x, Value::Bag(Rc::new(vec![Value::Int(1), Value::Int(2), Value::Int(3)])));
        let bag = Expr::var(x, Type::bag(Type::Int));
        let e = Expr::unary(UnaryOp::Sum, bag.clone(), Type::Int);
        assert_eq!(eval(&e, &env), Ok(Value::Int(6)));

        let the = Expr::unary(UnaryOp::The, bag, Type::maybe(Type::Int));
        assert_eq!(eval(&the, &env), Ok(Value::Maybe(Some(Rc::new(Value::Int(1))))));
    }

    #[test]
    fn map_and_filter_close_over_the_bound_element() {
        let mut interner = deriva_base::Interner::new();
        let v = interner.intern("v");
        let env = Env::empty();
        let bag_expr = Expr::tuple(vec![]); // placeholder unused directly
        let _ = bag_expr;
        let lambda = std::rc::Rc::new(deriva_expr::Lambda::new(v, Type::Int, Expr::binary(BinOp::Add, Expr::var(v, Type::Int), Expr::int(1), Type::Int)));
        let literal_bag = Expr::new(
            ExprKind::Lit(deriva_expr::Literal::Int(0)),
            Type::Int,
        );
        let _ = literal_bag;
        let mapped = Expr::map(
            Expr::new(ExprKind::Var(interner.intern("xs")), Type::bag(Type::Int)),
            lambda,
        );
        let xs = interner.lookup("xs").unwrap();
        let env = env.extend(xs, Value::Bag(Rc::new(vec![Value::Int(1), Value::Int(2)])));
        let result = eval(&mapped, &env).unwrap();
        assert_eq!(result, Value::Bag(Rc::new(vec![Value::Int(2), Value::Int(3)])));
    }

    #[test]
    fn hole_short_circuits_with_missing_hole_signal() {
        use deriva_expr::{HoleBuilder, HoleRef};
        #[derive(Debug)]
        struct Stub;
        impl HoleBuilder for Stub {
            fn build<'a>(
                &'a self,
                _cache: &'a deriva_expr::Cache,
                _size: u32,
            ) -> Box<dyn Iterator<Item = std::rc::Rc<Expr>> + 'a> {
                Box::new(std::iter::empty())
            }
        }
        let gen = deriva_expr::HoleIdGen::new();
        let id: HoleId = gen.fresh_hole();
        let hole = Expr::hole(HoleRef { name: id, ty: Type::Int, builder: std::rc::Rc::new(Stub) });
        let env = Env::empty();
        assert_eq!(eval(&hole, &env), Err(EvalSignal::MissingHole(id)));
    }

    #[test]
    fn all_envs_for_hole_collects_one_env_per_bag_element() {
        use deriva_expr::{HoleBuilder, HoleRef};
        #[derive(Debug)]
        struct Stub;
        impl HoleBuilder for Stub {
            fn build<'a>(
                &'a self,
                _cache: &'a deriva_expr::Cache,
                _size: u32,
            ) -> Box<dyn Iterator<Item = std::rc::Rc<Expr>> + 'a> {
                Box::new(std::iter::empty())
            }
        }
        let mut interner = deriva_base::Interner::new();
        let xs = interner.intern("xs");
        let v = interner.intern("v");
        let gen = deriva_expr::HoleIdGen::new();
        let id = gen.fresh_hole();
        let hole = Expr::hole(HoleRef { name: id, ty: Type::Bool, builder: std::rc::Rc::new(Stub) });
        let lambda = std::rc::Rc::new(deriva_expr::Lambda::new(v, Type::Int, hole));
        let filter = Expr::filter(Expr::var(xs, Type::bag(Type::Int)), lambda);
        let env = Env::empty().extend(xs, Value::Bag(Rc::new(vec![Value::Int(1), Value::Int(2), Value::Int(3)])));
        let envs = all_envs_for_hole(&filter, id, &env);
        assert_eq!(envs.len(), 3);
        assert_eq!(envs[0].lookup(v), Some(&Value::Int(1)));
        assert_eq!(envs[2].lookup(v), Some(&Value::Int(3)));
    }
}
