//! Literal values and the operators that close over them.

use std::fmt;
use std::rc::Rc;

/// A literal value. The literal's `Type` is implied by the variant, matching
/// the "every node's type is derivable" invariant: we never need to store a
/// redundant type alongside a literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Str(Rc<str>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{n}"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// Unary operators: `sum` (`Bag(Int) -> Int`), `the` (`Bag(T) -> Maybe(T)`),
/// `not` (`Bool -> Bool`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Sum,
    The,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Sum => "sum",
            UnaryOp::The => "the",
            UnaryOp::Not => "not",
        };
        write!(f, "{s}")
    }
}

/// Binary operators. `In` and `Eq` are polymorphic over the operand type;
/// the rest are monomorphic as noted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    /// `Int, Int -> Int`
    Add,
    /// `Bool, Bool -> Bool`
    And,
    /// `Bool, Bool -> Bool`
    Or,
    /// `T, T -> Bool`, for any `T` that is not a `Map`.
    Eq,
    /// `T, Bag(T) -> Bool`
    In,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Eq => "==",
            BinOp::In => "in",
        };
        write!(f, "{s}")
    }
}
