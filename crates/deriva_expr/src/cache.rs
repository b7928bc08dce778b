//! The expression cache: every candidate built so far, indexed for fast
//! retrieval by type and size, and tagged so a search round can evict
//! exactly the entries it contributed.
//!
//! Indexing is three levels deep — [`TypeTag`], then the full [`Type`], then
//! size — matching how [`HoleBuilder`][crate::hole::HoleBuilder] impls
//! actually query it: "give me everything of this exact type at this exact
//! size" is the hot path, and grouping by tag first lets a builder looking
//! for, say, any `Bag(_)` at all scan one bucket instead of the whole cache.
//!
//! Iteration order within a bucket is insertion order, not hash order: two
//! runs over the same examples must enumerate candidates in the same
//! sequence, or a size-bounded search could return a different (just as
//! valid, but nondeterministic) answer from one run to the next.

use std::collections::HashMap;
use std::rc::Rc;

use crate::expr::Expr;
use crate::ty::{Type, TypeTag};

/// Identifies which round of search contributed a cache entry, so that round
/// can later be rolled back with [`Cache::evict`]. Rounds are opaque,
/// monotonically-assigned small integers; the search layer owns the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u32);

struct Entry {
    expr: Rc<Expr>,
    tag: Tag,
}

#[derive(Default)]
struct SizeBucket {
    entries: Vec<Entry>,
}

#[derive(Default)]
struct TypeBucket {
    by_size: HashMap<u32, SizeBucket>,
    /// Insertion order of the sizes touched, so `iter_type` can walk them
    /// smallest-first without re-sorting the map's keys each time.
    size_order: Vec<u32>,
}

#[derive(Default)]
struct TagBucket {
    by_type: HashMap<Type, TypeBucket>,
    type_order: Vec<Type>,
}

/// The expression cache, keyed first by [`TypeTag`], then by exact [`Type`],
/// then by expression size.
#[derive(Default)]
pub struct Cache {
    by_tag: HashMap<TypeTag, TagBucket>,
}

impl Cache {
    pub fn new() -> Self {
        Cache { by_tag: HashMap::new() }
    }

    /// Records `expr` under its own type and size, attributing it to `tag`.
    pub fn add(&mut self, expr: Rc<Expr>, tag: Tag) {
        let ty = expr.ty.clone();
        let size = expr.size();
        let tag_bucket = self.by_tag.entry(ty.tag()).or_default();
        if !tag_bucket.by_type.contains_key(&ty) {
            tag_bucket.type_order.push(ty.clone());
        }
        let type_bucket = tag_bucket.by_type.entry(ty).or_default();
        let size_bucket = type_bucket.by_size.entry(size).or_default();
        if size_bucket.entries.is_empty() {
            type_bucket.size_order.push(size);
        }
        size_bucket.entries.push(Entry { expr, tag });
    }

    /// Removes every entry attributed to `tag`. Used when a round of search
    /// must be unwound — e.g. a hole-filling turned out infeasible and the
    /// candidates built while exploring it need to disappear again.
    pub fn evict(&mut self, tag: Tag) {
        for tag_bucket in self.by_tag.values_mut() {
            for type_bucket in tag_bucket.by_type.values_mut() {
                for size_bucket in type_bucket.by_size.values_mut() {
                    size_bucket.entries.retain(|e| e.tag != tag);
                }
            }
        }
    }

    /// Removes the single entry at `expr`'s type and `size` that is
    /// `Rc::ptr_eq` to `expr`; a no-op if no such entry exists. Used when
    /// observational-equivalence replacement (§4.4's fingerprint rule)
    /// supersedes one specific cached candidate with a cheaper one sharing
    /// its fingerprint — unlike [`Cache::evict`], this never touches any
    /// other entry, even one with an equal but distinct `Rc<Expr>`.
    pub fn evict_one(&mut self, ty: &Type, size: u32, expr: &Rc<Expr>) {
        if let Some(size_bucket) = self
            .by_tag
            .get_mut(&ty.tag())
            .and_then(|tb| tb.by_type.get_mut(ty))
            .and_then(|tyb| tyb.by_size.get_mut(&size))
        {
            if let Some(pos) = size_bucket.entries.iter().position(|e| Rc::ptr_eq(&e.expr, expr)) {
                size_bucket.entries.remove(pos);
            }
        }
    }

    /// True if `tag` still owns at least one live entry.
    pub fn is_tag(&self, tag: Tag) -> bool {
        self.by_tag.values().any(|tb| {
            tb.by_type
                .values()
                .any(|tyb| tyb.by_size.values().any(|sb| sb.entries.iter().any(|e| e.tag == tag)))
        })
    }

    /// All cached expressions of exactly type `ty` and exactly `size`, in
    /// insertion order.
    pub fn find(&self, ty: &Type, size: u32) -> impl Iterator<Item = Rc<Expr>> + '_ {
        self.by_tag
            .get(&ty.tag())
            .and_then(|tb| tb.by_type.get(ty))
            .and_then(|tyb| tyb.by_size.get(&size))
            .into_iter()
            .flat_map(|sb| sb.entries.iter().map(|e| e.expr.clone()))
    }

    /// All cached expressions of exactly type `ty`, any size, smallest first.
    pub fn find_all_sizes(&self, ty: &Type) -> impl Iterator<Item = Rc<Expr>> + '_ {
        self.by_tag
            .get(&ty.tag())
            .and_then(|tb| tb.by_type.get(ty))
            .into_iter()
            .flat_map(|tyb| {
                let mut sizes = tyb.size_order.clone();
                sizes.sort_unstable();
                sizes
                    .into_iter()
                    .filter_map(move |s| tyb.by_size.get(&s))
                    .flat_map(|sb| sb.entries.iter().map(|e| e.expr.clone()).collect::<Vec<_>>())
            })
    }

    /// Every cached expression whose type shares `tag`'s top-level
    /// constructor, regardless of type parameters or size.
    pub fn find_by_type_tag(&self, tag: TypeTag) -> impl Iterator<Item = Rc<Expr>> + '_ {
        self.by_tag
            .get(&tag)
            .into_iter()
            .flat_map(|tb| tb.type_order.iter())
            .filter_map(move |ty| self.by_tag.get(&tag).and_then(|tb| tb.by_type.get(ty)))
            .flat_map(|tyb| {
                tyb.size_order
                    .iter()
                    .filter_map(move |s| tyb.by_size.get(s))
                    .flat_map(|sb| sb.entries.iter().map(|e| e.expr.clone()).collect::<Vec<_>>())
            })
    }

    /// Every cached expression of exactly `size`, regardless of type. Used
    /// by binary lifts like `==` that accept any operand type as long as
    /// both sides match.
    pub fn all_at_size(&self, size: u32) -> Vec<Rc<Expr>> {
        self.by_tag
            .values()
            .flat_map(|tb| tb.by_type.values())
            .filter_map(move |tyb| tyb.by_size.get(&size))
            .flat_map(|sb| sb.entries.iter().map(|e| e.expr.clone()))
            .collect()
    }

    /// Iterates every expression currently in the cache, in no particular
    /// cross-bucket order. Used by `find_holes`-style sweeps over the whole
    /// candidate pool.
    pub fn iter(&self) -> impl Iterator<Item = Rc<Expr>> + '_ {
        self.by_tag.values().flat_map(|tb| {
            tb.by_type.values().flat_map(|tyb| {
                tyb.by_size
                    .values()
                    .flat_map(|sb| sb.entries.iter().map(|e| e.expr.clone()))
            })
        })
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.values().all(|tb| {
            tb.by_type
                .values()
                .all(|tyb| tyb.by_size.values().all(|sb| sb.entries.is_empty()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_returns_entries_of_exact_type_and_size() {
        let mut cache = Cache::new();
        cache.add(Expr::int(1), Tag(0));
        cache.add(Expr::bool(true), Tag(0));
        let ints: Vec<_> = cache.find(&Type::Int, 1).collect();
        assert_eq!(ints.len(), 1);
    }

    #[test]
    fn evict_removes_only_that_tags_entries() {
        let mut cache = Cache::new();
        cache.add(Expr::int(1), Tag(0));
        cache.add(Expr::int(2), Tag(1));
        cache.evict(Tag(0));
        let ints: Vec<_> = cache.find(&Type::Int, 1).collect();
        assert_eq!(ints.len(), 1);
        assert!(!cache.is_tag(Tag(0)));
        assert!(cache.is_tag(Tag(1)));
    }

    #[test]
    fn evict_one_removes_only_the_matching_rc_not_equal_ones() {
        let mut cache = Cache::new();
        let kept = Expr::int(1);
        let removed = Expr::int(1);
        cache.add(kept.clone(), Tag(0));
        cache.add(removed.clone(), Tag(0));
        cache.evict_one(&Type::Int, 1, &removed);
        let ints: Vec<_> = cache.find(&Type::Int, 1).collect();
        assert_eq!(ints.len(), 1);
        assert!(Rc::ptr_eq(&ints[0], &kept));
    }

    #[test]
    fn find_all_sizes_orders_smallest_first() {
        let mut cache = Cache::new();
        let big = crate::expr::Expr::binary(
            crate::lit::BinOp::Add,
            Expr::int(1),
            Expr::int(2),
            Type::Int,
        );
        cache.add(big, Tag(0));
        cache.add(Expr::int(9), Tag(0));
        let sizes: Vec<u32> = cache.find_all_sizes(&Type::Int).map(|e| e.size()).collect();
        assert_eq!(sizes, vec![1, 3]);
    }
}
