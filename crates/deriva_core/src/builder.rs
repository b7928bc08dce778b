//! The builder: given a cache and a target size, enumerates every well-typed
//! candidate expression of exactly that size.
//!
//! The trait contract ([`HoleBuilder`]) only asks for a lazy iterator; this
//! implementation builds its result eagerly into a `Vec` and hands back its
//! `into_iter()`. At the sizes this search explores (single-digit node
//! counts per hole) the difference is not observable, and it sidesteps
//! threading a cache-cloning lifetime through a hand-rolled iterator chain.

use std::cell::RefCell;
use std::rc::Rc;

use deriva_base::Interner;
use deriva_expr::{BinOp, Cache, Expr, ExprKind, HoleBuilder, HoleIdGen, Lambda, Tag, Type, TypeTag, UnaryOp};

use crate::combinatorics::pick_to_sum;
use crate::cost::CostModel;

/// Tag shared by every fresh bound variable a [`Builder`] inserts into a
/// cloned cache while enumerating a `Map`/`Filter`/`AlterMaybe` body. The
/// clone is dropped at the end of that call, so the tag never needs evicting.
const AUGMENT_TAG: Tag = Tag(u32::MAX);

/// A fresh, independent copy of every expression currently in `cache`.
/// `Cache` has no `derive(Clone)` — its buckets are keyed by [`Type`], which
/// is cheap but not `Copy` — so this rebuilds one entry at a time through the
/// public `add` API rather than duplicating its private index structure.
/// The rebuilt cache's tags are not meaningful; it is discarded at the end of
/// the `Map`/`Filter`/`AlterMaybe` call that created it.
fn clone_cache(cache: &Cache) -> Cache {
    let mut out = Cache::new();
    for e in cache.iter() {
        out.add(e, Tag(0));
    }
    out
}

/// A builder: a set of seed templates plus feature flags, parameterized by a
/// cost model used only to order within-type candidates deterministically
/// when two are otherwise equivalent (the search does the real fingerprint
/// bookkeeping; the builder just needs *a* total order to stay deterministic).
pub struct Builder {
    /// Seed expressions, possibly themselves containing holes.
    pub roots: Vec<Rc<Expr>>,
    pub build_sums: bool,
    pub build_maps: bool,
    pub build_filters: bool,
    pub build_tuples: bool,
    pub cost_model: Rc<dyn CostModel>,
    pub hole_gen: Rc<HoleIdGen>,
    pub interner: Rc<RefCell<Interner>>,
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("roots", &self.roots.len())
            .field("build_sums", &self.build_sums)
            .field("build_maps", &self.build_maps)
            .field("build_filters", &self.build_filters)
            .field("build_tuples", &self.build_tuples)
            .finish()
    }
}

impl Builder {
    pub fn new(
        roots: Vec<Rc<Expr>>,
        cost_model: Rc<dyn CostModel>,
        hole_gen: Rc<HoleIdGen>,
        interner: Rc<RefCell<Interner>>,
    ) -> Self {
        Builder {
            roots,
            build_sums: true,
            build_maps: false,
            build_filters: false,
            build_tuples: false,
            cost_model,
            hole_gen,
            interner,
        }
    }

    fn seed_roots(&self) -> Vec<Rc<Expr>> {
        self.roots
            .iter()
            .filter(|r| !deriva_expr::traverse::contains_holes(r) && r.size() == 1)
            .cloned()
            .collect()
    }

    /// Step 2 of the recipe: for every root that still has holes, distribute
    /// `size - 1` over its holes and draw one cache candidate per hole.
    fn holed_roots(&self, cache: &Cache, size: u32) -> Vec<Rc<Expr>> {
        let mut out = Vec::new();
        if size < 2 {
            return out;
        }
        for root in &self.roots {
            let holes = deriva_expr::traverse::find_holes(root);
            if holes.is_empty() {
                continue;
            }
            let hole_types: Vec<Type> = holes
                .iter()
                .map(|h| match &h.kind {
                    ExprKind::Hole(href) => href.ty.clone(),
                    _ => unreachable!("find_holes only returns Hole nodes"),
                })
                .collect();
            for split in pick_to_sum(holes.len(), size - 1) {
                let per_hole_candidates: Vec<Vec<Rc<Expr>>> = hole_types
                    .iter()
                    .zip(split.iter())
                    .map(|(ty, &sz)| cache.find(ty, sz).collect())
                    .collect();
                for combo in crate::combinatorics::cross_product(&per_hole_candidates) {
                    let mut filled = root.clone();
                    let mut interner = self.interner.borrow_mut();
                    for (hole_expr, replacement) in holes.iter().zip(combo.iter()) {
                        if let ExprKind::Hole(href) = &hole_expr.kind {
                            filled = deriva_expr::subst::substitute_hole(
                                &filled,
                                href.name,
                                replacement,
                                &mut interner,
                            );
                        }
                    }
                    if filled.size() == size {
                        out.push(filled);
                    }
                }
            }
        }
        out
    }

    fn at_tag_size(cache: &Cache, tag: TypeTag, size: u32) -> Vec<Rc<Expr>> {
        cache.find_by_type_tag(tag).filter(|e| e.size() == size).collect()
    }

    /// Step 3: unary lifts over everything cached at `size - 1`.
    fn unary_lifts(&self, cache: &Cache, size: u32) -> Vec<Rc<Expr>> {
        let mut out = Vec::new();
        let child_size = size - 1;

        if self.build_sums {
            for bag in Self::at_tag_size(cache, TypeTag::Bag, child_size) {
                if bag.ty == Type::bag(Type::Int) {
                    out.push(Expr::unary(UnaryOp::Sum, bag, Type::Int));
                }
            }
        }

        for bag in Self::at_tag_size(cache, TypeTag::Bag, child_size) {
            if let Some(elem) = bag.ty.bag_elem() {
                let result_ty = Type::maybe(elem.clone());
                out.push(Expr::unary(UnaryOp::The, bag, result_ty));
            }
        }

        for b in cache.find(&Type::Bool, child_size) {
            out.push(Expr::unary(UnaryOp::Not, b, Type::Bool));
        }

        for h in Self::at_tag_size(cache, TypeTag::Handle, child_size) {
            out.push(Expr::handle_get(h));
        }

        for t in Self::at_tag_size(cache, TypeTag::Tuple, child_size) {
            if let Type::Tuple(items) = &t.ty {
                for idx in 0..items.len() {
                    out.push(Expr::tuple_get(t.clone(), idx));
                }
            }
        }

        out
    }

    /// Step 4: binary lifts over every split `size - 1 = s1 + s2`.
    fn binary_lifts(&self, cache: &Cache, size: u32) -> Vec<Rc<Expr>> {
        let mut out = Vec::new();
        if size < 3 {
            return out;
        }
        let budget = size - 1;
        for s1 in 1..budget {
            let s2 = budget - s1;

            for a in cache.find(&Type::Int, s1) {
                for b in cache.find(&Type::Int, s2) {
                    out.push(Expr::binary(BinOp::Add, a.clone(), b, Type::Int));
                }
            }

            for a in cache.find(&Type::Bool, s1) {
                for b in cache.find(&Type::Bool, s2) {
                    out.push(Expr::binary(BinOp::And, a.clone(), b.clone(), Type::Bool));
                    out.push(Expr::binary(BinOp::Or, a.clone(), b, Type::Bool));
                }
            }

            for a in cache.all_at_size(s1) {
                if matches!(a.ty, Type::Map(..)) {
                    continue;
                }
                for b in cache.find(&a.ty, s2) {
                    out.push(Expr::binary(BinOp::Eq, a.clone(), b, Type::Bool));
                }
            }

            for map in Self::at_tag_size(cache, TypeTag::Map, s1) {
                if let Type::Map(k, _) = map.ty.clone() {
                    for key in cache.find(&k, s2) {
                        out.push(Expr::map_get(map.clone(), key));
                    }
                }
            }
        }
        out
    }

    /// `Map(bag, \v. body)`: freshen a variable of the bag's element type,
    /// install it in a size-1 overlay on a cloned cache, and recurse into
    /// `self.build` to find candidate bodies of any type at the remaining
    /// budget. This generalizes the recipe's "enumerate bodies from roots"
    /// step by reusing the same size-indexed enumeration the top-level
    /// search already does, rather than restricting bodies to direct
    /// root substitutions.
    fn map_lifts(&self, cache: &Cache, size: u32) -> Vec<Rc<Expr>> {
        let mut out = Vec::new();
        if size < 3 {
            return out;
        }
        let budget = size - 1;
        for s1 in 1..budget {
            let s2 = budget - s1;
            for bag in Self::at_tag_size(cache, TypeTag::Bag, s1) {
                let Some(elem_ty) = bag.ty.bag_elem().cloned() else { continue };
                let (augmented, param) = self.augment_with_fresh_var(cache, &elem_ty);
                for body in self.build_vec(&augmented, s2) {
                    let lambda = Rc::new(Lambda::new(param, elem_ty.clone(), body));
                    out.push(Expr::map(bag.clone(), lambda));
                }
            }
        }
        out
    }

    /// `Filter(bag, \v. body)`, same recursive-body strategy as `map_lifts`
    /// but restricted to `Bool`-typed bodies.
    fn filter_lifts(&self, cache: &Cache, size: u32) -> Vec<Rc<Expr>> {
        let mut out = Vec::new();
        if size < 3 {
            return out;
        }
        let budget = size - 1;
        for s1 in 1..budget {
            let s2 = budget - s1;
            for bag in Self::at_tag_size(cache, TypeTag::Bag, s1) {
                let Some(elem_ty) = bag.ty.bag_elem().cloned() else { continue };
                let (augmented, param) = self.augment_with_fresh_var(cache, &elem_ty);
                for body in self.build_vec(&augmented, s2) {
                    if body.ty != Type::Bool {
                        continue;
                    }
                    let lambda = Rc::new(Lambda::new(param, elem_ty.clone(), body));
                    out.push(Expr::filter(bag.clone(), lambda));
                }
            }
        }
        out
    }

    /// `AlterMaybe(m, \v. body)`, same strategy again over a `Maybe`'s
    /// element type.
    fn alter_maybe_lifts(&self, cache: &Cache, size: u32) -> Vec<Rc<Expr>> {
        let mut out = Vec::new();
        if size < 3 {
            return out;
        }
        let budget = size - 1;
        for s1 in 1..budget {
            let s2 = budget - s1;
            for m in Self::at_tag_size(cache, TypeTag::Maybe, s1) {
                let Some(elem_ty) = m.ty.maybe_elem().cloned() else { continue };
                let (augmented, param) = self.augment_with_fresh_var(cache, &elem_ty);
                for body in self.build_vec(&augmented, s2) {
                    let lambda = Rc::new(Lambda::new(param, elem_ty.clone(), body));
                    out.push(Expr::alter_maybe(m.clone(), lambda));
                }
            }
        }
        out
    }

    /// Pairwise tuple construction: `(a, b)` for every split of the budget.
    /// Marked a non-goal by the spec this crate grew from; kept behind
    /// `build_tuples` for callers that want it anyway.
    fn tuple_lifts(&self, cache: &Cache, size: u32) -> Vec<Rc<Expr>> {
        let mut out = Vec::new();
        if size < 3 {
            return out;
        }
        let budget = size - 1;
        for s1 in 1..budget {
            let s2 = budget - s1;
            for a in cache.all_at_size(s1) {
                for b in cache.all_at_size(s2) {
                    out.push(Expr::tuple(vec![a.clone(), b.clone()]));
                }
            }
        }
        out
    }

    fn augment_with_fresh_var(&self, cache: &Cache, elem_ty: &Type) -> (Cache, deriva_base::Symbol) {
        let mut augmented = clone_cache(cache);
        let name = {
            let mut interner = self.interner.borrow_mut();
            interner.intern(&self.hole_gen.fresh_var_name())
        };
        let var = Expr::var(name, elem_ty.clone());
        augmented.add(var, AUGMENT_TAG);
        (augmented, name)
    }

    fn build_vec(&self, cache: &Cache, size: u32) -> Vec<Rc<Expr>> {
        self.build(cache, size).collect()
    }
}

impl HoleBuilder for Builder {
    fn build<'a>(&'a self, cache: &'a Cache, size: u32) -> Box<dyn Iterator<Item = Rc<Expr>> + 'a> {
        let mut out = Vec::new();
        if size == 0 {
            return Box::new(std::iter::empty());
        }
        if size == 1 {
            out.extend(self.seed_roots());
        }
        out.extend(self.holed_roots(cache, size));
        if size >= 2 {
            out.extend(self.unary_lifts(cache, size));
        }
        if size >= 3 {
            out.extend(self.binary_lifts(cache, size));
            if self.build_maps {
                out.extend(self.map_lifts(cache, size));
            }
            if self.build_filters {
                out.extend(self.filter_lifts(cache, size));
            }
            out.extend(self.alter_maybe_lifts(cache, size));
            if self.build_tuples {
                out.extend(self.tuple_lifts(cache, size));
            }
        }
        Box::new(out.into_iter())
    }

    fn describe(&self) -> &str {
        "deriva builder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::ConstantCost;
    use deriva_expr::Tag as CacheTag;

    fn new_builder(roots: Vec<Rc<Expr>>) -> Builder {
        Builder::new(roots, Rc::new(ConstantCost), Rc::new(HoleIdGen::new()), Rc::new(RefCell::new(Interner::new())))
    }

    #[test]
    fn size_one_yields_holeless_roots_only() {
        let builder = new_builder(vec![Expr::int(0), Expr::int(1)]);
        let cache = Cache::new();
        let got: Vec<_> = builder.build(&cache, 1).collect();
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn size_zero_yields_nothing() {
        let builder = new_builder(vec![Expr::int(0)]);
        let cache = Cache::new();
        assert_eq!(builder.build(&cache, 0).count(), 0);
    }

    #[test]
    fn binary_add_lift_combines_cached_ints() {
        let builder = new_builder(vec![]);
        let mut cache = Cache::new();
        cache.add(Expr::int(1), CacheTag(0));
        cache.add(Expr::int(2), CacheTag(0));
        let got: Vec<_> = builder.build(&cache, 3).collect();
        assert!(got.iter().any(|e| e.to_string() == "(1 + 1)"));
    }

    #[test]
    fn sum_lift_requires_bag_of_int() {
        let builder = new_builder(vec![]);
        let mut interner = Interner::new();
        let xs = interner.intern("xs");
        let mut cache = Cache::new();
        cache.add(Expr::var(xs, Type::bag(Type::Int)), CacheTag(0));
        let got: Vec<_> = builder.build(&cache, 2).collect();
        assert!(got.iter().any(|e| matches!(&e.kind, ExprKind::Unary(UnaryOp::Sum, _))));
    }
}
