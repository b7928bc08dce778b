//! The expression AST.
//!
//! Every node carries its type in a shared header, matching the typing
//! invariant: `e.ty` is always derivable from `e.kind`'s children by the
//! typing rules, except for [`ExprKind::Hole`] where the type is the hole's
//! declared type. Children are `Rc<Expr>` so that a candidate pulled out of
//! the cache can be folded into many different parents without cloning the
//! subtree it points to.

use std::fmt;
use std::rc::Rc;

use deriva_base::Symbol;

use crate::hole::HoleRef;
use crate::lit::{BinOp, Literal, UnaryOp};
use crate::ty::Type;

/// A lambda: a bound variable, its type, and a body. Used as the second
/// argument of `Map`, `Filter`, `MakeMap`, and `AlterMaybe`.
#[derive(Debug, Clone)]
pub struct Lambda {
    pub param: Symbol,
    pub param_type: Type,
    pub body: Rc<Expr>,
}

impl Lambda {
    pub fn new(param: Symbol, param_type: Type, body: Rc<Expr>) -> Self {
        Lambda { param, param_type, body }
    }
}

/// A typed expression node.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Var(Symbol),
    Lit(Literal),
    Hole(HoleRef),
    Unary(UnaryOp, Rc<Expr>),
    Binary(BinOp, Rc<Expr>, Rc<Expr>),
    Tuple(Rc<[Rc<Expr>]>),
    TupleGet(Rc<Expr>, usize),
    RecordGet(Rc<Expr>, Symbol),
    /// `.val` projection out of a `Handle`.
    HandleGet(Rc<Expr>),
    Map(Rc<Expr>, Rc<Lambda>),
    Filter(Rc<Expr>, Rc<Lambda>),
    MakeMap(Rc<Expr>, Rc<Lambda>, Rc<Lambda>),
    MapGet(Rc<Expr>, Rc<Expr>),
    AlterMaybe(Rc<Expr>, Rc<Lambda>),
    Lambda(Rc<Lambda>),
    App(Rc<Expr>, Rc<Expr>),
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Type) -> Rc<Expr> {
        Rc::new(Expr { kind, ty })
    }

    pub fn var(name: Symbol, ty: Type) -> Rc<Expr> {
        Expr::new(ExprKind::Var(name), ty)
    }

    pub fn int(n: i64) -> Rc<Expr> {
        Expr::new(ExprKind::Lit(Literal::Int(n)), Type::Int)
    }

    pub fn bool(b: bool) -> Rc<Expr> {
        Expr::new(ExprKind::Lit(Literal::Bool(b)), Type::Bool)
    }

    pub fn str_lit(s: impl Into<Rc<str>>) -> Rc<Expr> {
        Expr::new(ExprKind::Lit(Literal::Str(s.into())), Type::Str)
    }

    pub fn hole(hole: HoleRef) -> Rc<Expr> {
        let ty = hole.ty.clone();
        Expr::new(ExprKind::Hole(hole), ty)
    }

    pub fn unary(op: UnaryOp, arg: Rc<Expr>, ty: Type) -> Rc<Expr> {
        Expr::new(ExprKind::Unary(op, arg), ty)
    }

    pub fn binary(op: BinOp, lhs: Rc<Expr>, rhs: Rc<Expr>, ty: Type) -> Rc<Expr> {
        Expr::new(ExprKind::Binary(op, lhs, rhs), ty)
    }

    pub fn tuple(items: Vec<Rc<Expr>>) -> Rc<Expr> {
        let ty = Type::tuple(items.iter().map(|e| e.ty.clone()));
        Expr::new(ExprKind::Tuple(items.into()), ty)
    }

    pub fn tuple_get(tuple: Rc<Expr>, index: usize) -> Rc<Expr> {
        let ty = match &tuple.ty {
            Type::Tuple(ts) => ts[index].clone(),
            other => panic!("tuple_get on non-tuple type {other}"),
        };
        Expr::new(ExprKind::TupleGet(tuple, index), ty)
    }

    pub fn record_get(record: Rc<Expr>, field: Symbol) -> Rc<Expr> {
        let ty = match &record.ty {
            Type::Record(fields) => fields
                .iter()
                .find(|(f, _)| *f == field)
                .map(|(_, t)| t.clone())
                .unwrap_or_else(|| panic!("no such field on record type {}", record.ty)),
            other => panic!("record_get on non-record type {other}"),
        };
        Expr::new(ExprKind::RecordGet(record, field), ty)
    }

    pub fn handle_get(handle: Rc<Expr>) -> Rc<Expr> {
        let ty = match &handle.ty {
            Type::Handle(_, inner) => (**inner).clone(),
            other => panic!("handle_get on non-handle type {other}"),
        };
        Expr::new(ExprKind::HandleGet(handle), ty)
    }

    pub fn map(bag: Rc<Expr>, lambda: Rc<Lambda>) -> Rc<Expr> {
        let ty = Type::bag(lambda.body.ty.clone());
        Expr::new(ExprKind::Map(bag, lambda), ty)
    }

    pub fn filter(bag: Rc<Expr>, predicate: Rc<Lambda>) -> Rc<Expr> {
        let ty = bag.ty.clone();
        Expr::new(ExprKind::Filter(bag, predicate), ty)
    }

    pub fn make_map(bag: Rc<Expr>, key: Rc<Lambda>, value: Rc<Lambda>) -> Rc<Expr> {
        let ty = Type::map(key.body.ty.clone(), value.body.ty.clone());
        Expr::new(ExprKind::MakeMap(bag, key, value), ty)
    }

    pub fn map_get(map: Rc<Expr>, key: Rc<Expr>) -> Rc<Expr> {
        let ty = match &map.ty {
            Type::Map(_, v) => (**v).clone(),
            other => panic!("map_get on non-map type {other}"),
        };
        Expr::new(ExprKind::MapGet(map, key), ty)
    }

    pub fn alter_maybe(maybe: Rc<Expr>, lambda: Rc<Lambda>) -> Rc<Expr> {
        let ty = Type::maybe(lambda.body.ty.clone());
        Expr::new(ExprKind::AlterMaybe(maybe, lambda), ty)
    }

    pub fn lambda(lambda: Rc<Lambda>) -> Rc<Expr> {
        let ty = Type::function([lambda.param_type.clone()], lambda.body.ty.clone());
        Expr::new(ExprKind::Lambda(lambda), ty)
    }

    pub fn app(func: Rc<Expr>, arg: Rc<Expr>) -> Rc<Expr> {
        let ty = match &func.ty {
            Type::Function(_, ret) => (**ret).clone(),
            other => panic!("app on non-function type {other}"),
        };
        Expr::new(ExprKind::App(func, arg), ty)
    }

    /// Structural size: one plus the sizes of every immediate child. Holes,
    /// literals, and variables have size 1.
    pub fn size(&self) -> u32 {
        1 + self.child_sizes()
    }

    fn child_sizes(&self) -> u32 {
        match &self.kind {
            ExprKind::Var(_) | ExprKind::Lit(_) | ExprKind::Hole(_) => 0,
            ExprKind::Unary(_, a) => a.size(),
            ExprKind::Binary(_, a, b) => a.size() + b.size(),
            ExprKind::Tuple(items) => items.iter().map(|e| e.size()).sum(),
            ExprKind::TupleGet(e, _) => e.size(),
            ExprKind::RecordGet(e, _) => e.size(),
            ExprKind::HandleGet(e) => e.size(),
            ExprKind::Map(bag, f) => bag.size() + f.body.size(),
            ExprKind::Filter(bag, p) => bag.size() + p.body.size(),
            ExprKind::MakeMap(bag, k, v) => bag.size() + k.body.size() + v.body.size(),
            ExprKind::MapGet(m, k) => m.size() + k.size(),
            ExprKind::AlterMaybe(m, f) => m.size() + f.body.size(),
            ExprKind::Lambda(l) => l.body.size(),
            ExprKind::App(f, a) => f.size() + a.size(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Var(name) => write!(f, "{name}"),
            ExprKind::Lit(lit) => write!(f, "{lit}"),
            ExprKind::Hole(h) => write!(f, "{}[{}]", h.name, h.ty),
            ExprKind::Unary(op, a) => write!(f, "{op}({a})"),
            ExprKind::Binary(op, a, b) => write!(f, "({a} {op} {b})"),
            ExprKind::Tuple(items) => {
                write!(f, "(")?;
                for (i, e) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, ")")
            }
            ExprKind::TupleGet(e, n) => write!(f, "{e}.{n}"),
            ExprKind::RecordGet(e, field) => write!(f, "{e}.{field}"),
            ExprKind::HandleGet(e) => write!(f, "{e}.val"),
            ExprKind::Map(bag, l) => write!(f, "Map({bag}, {l})"),
            ExprKind::Filter(bag, l) => write!(f, "Filter({bag}, {l})"),
            ExprKind::MakeMap(bag, k, v) => write!(f, "MakeMap({bag}, {k}, {v})"),
            ExprKind::MapGet(m, k) => write!(f, "{m}[{k}]"),
            ExprKind::AlterMaybe(m, l) => write!(f, "AlterMaybe({m}, {l})"),
            ExprKind::Lambda(l) => write!(f, "{l}"),
            ExprKind::App(func, arg) => write!(f, "{func}({arg})"),
        }
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\\{} -> {}", self.param, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deriva_base::Interner;

    #[test]
    fn size_of_literal_is_one() {
        assert_eq!(Expr::int(5).size(), 1);
    }

    #[test]
    fn size_of_binary_sums_children_plus_one() {
        let e = Expr::binary(BinOp::Add, Expr::int(1), Expr::int(2), Type::Int);
        assert_eq!(e.size(), 3);
    }

    #[test]
    fn display_renders_binary_infix() {
        let e = Expr::binary(BinOp::Add, Expr::int(1), Expr::int(2), Type::Int);
        assert_eq!(e.to_string(), "(1 + 2)");
    }

    #[test]
    fn tuple_get_derives_element_type() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let tup = Expr::tuple(vec![Expr::int(1), Expr::bool(true)]);
        let got = Expr::tuple_get(tup, 1);
        assert_eq!(got.ty, Type::Bool);
        let _ = Expr::var(x, Type::Int); // exercise var constructor
    }
}
