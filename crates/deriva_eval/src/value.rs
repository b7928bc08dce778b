//! Concrete values produced by evaluating an expression over an example
//! environment.
//!
//! `Value` is the runtime counterpart of `deriva_expr::Type`: one variant per
//! type constructor, plus [`Value::Closure`] for evaluated lambdas. Bags,
//! maps, tuples, and records are `Rc`-wrapped so that fingerprinting many
//! candidates against the same example bag doesn't reallocate its contents
//! each time.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use deriva_base::Symbol;

use crate::env::Env;
use deriva_expr::Lambda;

#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(Rc<str>),
    /// An opaque native value, identified only by an identity token; values
    /// of `Native` types support no operations beyond equality, so the token
    /// is all a `Value` ever needs to carry.
    Native(Symbol, u64),
    Bag(Rc<Vec<Value>>),
    Maybe(Option<Rc<Value>>),
    /// Represented as an association list rather than a hash map: map keys
    /// are arbitrary `Value`s (themselves possibly bags or tuples), and we'd
    /// rather pay a linear scan on lookup than maintain a second hashing
    /// scheme parallel to this one.
    Map(Rc<Vec<(Value, Value)>>),
    Tuple(Rc<Vec<Value>>),
    Record(Rc<Vec<(Symbol, Value)>>),
    /// A boxed, identity-bearing value: two handles are equal iff their tags
    /// and identity tokens match, regardless of the wrapped value.
    Handle(Symbol, u64, Rc<Value>),
    Closure(Rc<Lambda>, Rc<Env>),
}

impl Value {
    pub fn map_get(&self, key: &Value) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Native(t1, a), Value::Native(t2, b)) => t1 == t2 && a == b,
            (Value::Bag(a), Value::Bag(b)) => bag_eq(a, b),
            (Value::Maybe(a), Value::Maybe(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => map_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Handle(t1, i1, _), Value::Handle(t2, i2, _)) => t1 == t2 && i1 == i2,
            (Value::Closure(..), Value::Closure(..)) => {
                // Function values never participate in observational
                // equivalence or example-set deduplication in this system;
                // two closures are simply never equal.
                false
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

/// Bags are unordered multisets: equal iff they hold the same elements with
/// the same multiplicity, independent of enumeration order.
fn bag_eq(a: &[Value], b: &[Value]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    'outer: for x in a {
        for (j, y) in b.iter().enumerate() {
            if !used[j] && x == y {
                used[j] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}

fn map_eq(a: &[(Value, Value)], b: &[(Value, Value)]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|(k, v)| b.iter().any(|(k2, v2)| k == k2 && v == v2))
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Int(n) => {
                0u8.hash(state);
                n.hash(state);
            }
            Value::Bool(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            Value::Str(s) => {
                2u8.hash(state);
                s.hash(state);
            }
            Value::Native(tag, id) => {
                3u8.hash(state);
                tag.hash(state);
                id.hash(state);
            }
            Value::Bag(items) => {
                4u8.hash(state);
                // Order-independent: fold a commutative combinator instead
                // of hashing the sequence, so permutations collide.
                let mut acc: u64 = 0;
                for item in items.iter() {
                    acc ^= fingerprint(item);
                }
                acc.hash(state);
            }
            Value::Maybe(inner) => {
                5u8.hash(state);
                inner.as_deref().hash(state);
            }
            Value::Map(entries) => {
                6u8.hash(state);
                let mut acc: u64 = 0;
                for (k, v) in entries.iter() {
                    acc ^= fingerprint(k).wrapping_mul(31).wrapping_add(fingerprint(v));
                }
                acc.hash(state);
            }
            Value::Tuple(items) => {
                7u8.hash(state);
                items.hash(state);
            }
            Value::Record(fields) => {
                8u8.hash(state);
                fields.hash(state);
            }
            Value::Handle(tag, id, _) => {
                9u8.hash(state);
                tag.hash(state);
                id.hash(state);
            }
            Value::Closure(..) => {
                10u8.hash(state);
            }
        }
    }
}

fn fingerprint(v: &Value) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    let mut h = DefaultHasher::new();
    v.hash(&mut h);
    h.finish()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Native(tag, id) => write!(f, "{tag}#{id}"),
            Value::Bag(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Maybe(None) => write!(f, "none"),
            Value::Maybe(Some(v)) => write!(f, "some({v})"),
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, ")")
            }
            Value::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Handle(tag, id, inner) => write!(f, "{tag}#{id}({inner})"),
            Value::Closure(..) => write!(f, "<closure>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bags_compare_equal_regardless_of_order() {
        let a = Value::Bag(Rc::new(vec![Value::Int(1), Value::Int(2)]));
        let b = Value::Bag(Rc::new(vec![Value::Int(2), Value::Int(1)]));
        assert_eq!(a, b);
    }

    #[test]
    fn bags_respect_multiplicity() {
        let a = Value::Bag(Rc::new(vec![Value::Int(1), Value::Int(1)]));
        let b = Value::Bag(Rc::new(vec![Value::Int(1), Value::Int(2)]));
        assert_ne!(a, b);
    }

    #[test]
    fn closures_are_never_equal() {
        let mut interner = deriva_base::Interner::new();
        let x = interner.intern("x");
        let lambda = Rc::new(Lambda::new(x, deriva_expr::Type::Int, deriva_expr::Expr::int(1)));
        let env = Env::empty();
        let a = Value::Closure(lambda.clone(), env.clone());
        let b = Value::Closure(lambda, env);
        assert_ne!(a, b);
    }

    #[test]
    fn handles_compare_by_tag_and_identity_not_payload() {
        let mut interner = deriva_base::Interner::new();
        let tag = interner.intern("Node");
        let a = Value::Handle(tag, 1, Rc::new(Value::Int(5)));
        let b = Value::Handle(tag, 1, Rc::new(Value::Int(999)));
        assert_eq!(a, b);
    }
}
