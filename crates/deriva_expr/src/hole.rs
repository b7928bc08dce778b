//! Holes: typed placeholders that synthesis fills in.

use std::fmt;
use std::rc::Rc;

use crate::cache::Cache;
use crate::expr::Expr;
use crate::ty::Type;

/// A globally-unique hole identifier.
///
/// The source language used reflection-based string names; we use a
/// monotonic counter instead; see [`HoleIdGen`]. Names are opaque — nothing
/// outside substitution and cache bookkeeping should parse them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HoleId(u64);

impl fmt::Display for HoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?h{}", self.0)
    }
}

/// Generates fresh, globally-unique [`HoleId`]s and variable names for one
/// synthesis session. Shared (via `&` or a single owner) across every
/// `find_consistent_exps` / `synth` call in that session so that two holes,
/// or a hole and a freshened lambda-bound variable, never collide.
#[derive(Debug, Default)]
pub struct HoleIdGen {
    next: std::cell::Cell<u64>,
}

impl HoleIdGen {
    pub fn new() -> Self {
        Self { next: std::cell::Cell::new(0) }
    }

    pub fn fresh_hole(&self) -> HoleId {
        let id = self.next.get();
        self.next.set(id + 1);
        HoleId(id)
    }

    /// A fresh variable name, e.g. for a lambda bound-variable introduced
    /// while lifting a `Map`, `Filter`, or `AlterMaybe` body.
    pub fn fresh_var_name(&self) -> String {
        let id = self.next.get();
        self.next.set(id + 1);
        format!("v{id}")
    }
}

/// The opaque reference a hole carries to the builder that may fill it.
///
/// This is deliberately a bare, method-free marker: the expression model has
/// no business calling into the builder (that's the search's job), it only
/// needs to carry the handle around intact through substitution. The search
/// layer downcasts or otherwise knows the concrete builder type it put there.
pub trait HoleBuilder: fmt::Debug {
    /// Enumerate well-typed candidates of exactly `size`, drawing
    /// sub-expressions from `cache`. See the builder contract for the full
    /// recipe; this trait only fixes the shape collaborators agree on.
    fn build<'a>(&'a self, cache: &'a Cache, size: u32) -> Box<dyn Iterator<Item = Rc<Expr>> + 'a>;

    /// The type this builder treats as its root-enumeration seed; used by
    /// diagnostics only.
    fn describe(&self) -> &str {
        "builder"
    }
}

/// A hole: a name, a type, and a handle to the builder that can fill it.
#[derive(Clone)]
pub struct HoleRef {
    pub name: HoleId,
    pub ty: Type,
    pub builder: Rc<dyn HoleBuilder>,
}

impl fmt::Debug for HoleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HoleRef")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .finish()
    }
}

impl PartialEq for HoleRef {
    /// Holes compare by name and type only; the builder handle is opaque and
    /// two holes naming the same slot always carry the same builder anyway.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.ty == other.ty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_distinct() {
        let gen = HoleIdGen::new();
        let a = gen.fresh_hole();
        let b = gen.fresh_hole();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_and_var_names_share_the_counter() {
        let gen = HoleIdGen::new();
        let h = gen.fresh_hole();
        let name = gen.fresh_var_name();
        assert_ne!(h.to_string(), name);
    }
}
