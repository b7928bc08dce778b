//! The type algebra.
//!
//! Types compare structurally: two `Type` values are equal iff they have the
//! same shape, regardless of where they were constructed. `Map` keys may not
//! themselves be `Map` — [`Type::map`] enforces this at construction so a
//! malformed map type can never enter the system.

use std::fmt;
use std::rc::Rc;

use deriva_base::Symbol;

/// A recursive type. Cheap to clone: the recursive cases hold `Rc`s.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Bool,
    Str,
    /// An opaque type identified only by name; values of this type support no
    /// operations beyond equality.
    Native(Symbol),
    Bag(Rc<Type>),
    Maybe(Rc<Type>),
    Map(Rc<Type>, Rc<Type>),
    Tuple(Rc<[Type]>),
    Record(Rc<[(Symbol, Type)]>),
    /// A nominal boxed type: two handles are related only if their tags match.
    Handle(Symbol, Rc<Type>),
    Function(Rc<[Type]>, Rc<Type>),
}

impl Type {
    pub fn bag(elem: Type) -> Type {
        Type::Bag(Rc::new(elem))
    }

    pub fn maybe(elem: Type) -> Type {
        Type::Maybe(Rc::new(elem))
    }

    /// Builds a `Map(K, V)` type.
    ///
    /// # Panics
    ///
    /// Panics if `key` is itself a `Map` — map keys may not be maps.
    pub fn map(key: Type, value: Type) -> Type {
        assert!(
            !matches!(key, Type::Map(..)),
            "map keys may not themselves be maps"
        );
        Type::Map(Rc::new(key), Rc::new(value))
    }

    pub fn tuple(items: impl IntoIterator<Item = Type>) -> Type {
        Type::Tuple(items.into_iter().collect())
    }

    pub fn record(fields: impl IntoIterator<Item = (Symbol, Type)>) -> Type {
        Type::Record(fields.into_iter().collect())
    }

    pub fn handle(tag: Symbol, inner: Type) -> Type {
        Type::Handle(tag, Rc::new(inner))
    }

    pub fn function(args: impl IntoIterator<Item = Type>, ret: Type) -> Type {
        Type::Function(args.into_iter().collect(), Rc::new(ret))
    }

    /// The element type of a `Bag`, if this is one.
    pub fn bag_elem(&self) -> Option<&Type> {
        match self {
            Type::Bag(t) => Some(t),
            _ => None,
        }
    }

    pub fn maybe_elem(&self) -> Option<&Type> {
        match self {
            Type::Maybe(t) => Some(t),
            _ => None,
        }
    }

    pub fn map_kv(&self) -> Option<(&Type, &Type)> {
        match self {
            Type::Map(k, v) => Some((k, v)),
            _ => None,
        }
    }

    /// The kind of the top-level type constructor, ignoring the types nested
    /// inside it. Used as the outer key of the expression cache.
    pub fn tag(&self) -> TypeTag {
        match self {
            Type::Int => TypeTag::Int,
            Type::Bool => TypeTag::Bool,
            Type::Str => TypeTag::Str,
            Type::Native(_) => TypeTag::Native,
            Type::Bag(_) => TypeTag::Bag,
            Type::Maybe(_) => TypeTag::Maybe,
            Type::Map(..) => TypeTag::Map,
            Type::Tuple(_) => TypeTag::Tuple,
            Type::Record(_) => TypeTag::Record,
            Type::Handle(..) => TypeTag::Handle,
            Type::Function(..) => TypeTag::Function,
        }
    }
}

/// The outer key used by [`crate::Cache`][cache]: which constructor a type is
/// rooted at, independent of its type parameters.
///
/// [cache]: ../deriva_core/struct.Cache.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Int,
    Bool,
    Str,
    Native,
    Bag,
    Maybe,
    Map,
    Tuple,
    Record,
    Handle,
    Function,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::Bool => write!(f, "Bool"),
            Type::Str => write!(f, "Str"),
            Type::Native(name) => write!(f, "{name}"),
            Type::Bag(t) => write!(f, "Bag({t})"),
            Type::Maybe(t) => write!(f, "Maybe({t})"),
            Type::Map(k, v) => write!(f, "Map({k}, {v})"),
            Type::Tuple(ts) => {
                write!(f, "(")?;
                for (i, t) in ts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, ")")
            }
            Type::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, t)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {t}")?;
                }
                write!(f, "}}")
            }
            Type::Handle(tag, inner) => write!(f, "Handle({tag}, {inner})"),
            Type::Function(args, ret) => {
                write!(f, "(")?;
                for (i, t) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, ") -> {ret}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality() {
        assert_eq!(Type::bag(Type::Int), Type::bag(Type::Int));
        assert_ne!(Type::bag(Type::Int), Type::bag(Type::Bool));
    }

    #[test]
    #[should_panic(expected = "map keys may not themselves be maps")]
    fn map_keys_cannot_be_maps() {
        let _ = Type::map(Type::map(Type::Int, Type::Bool), Type::Int);
    }

    #[test]
    fn tag_ignores_parameters() {
        assert_eq!(Type::bag(Type::Int).tag(), Type::bag(Type::Bool).tag());
        assert_ne!(Type::bag(Type::Int).tag(), Type::maybe(Type::Int).tag());
    }

    #[test]
    fn display_renders_nested_types() {
        let t = Type::map(Type::Str, Type::bag(Type::Int));
        assert_eq!(t.to_string(), "Map(Str, Bag(Int))");
    }
}
