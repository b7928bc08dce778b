//! # deriva-expr
//!
//! The typed expression model shared by every other crate in the deriva
//! workspace: [`Type`], [`Expr`], holes, the expression [`Cache`], and
//! capture-avoiding substitution.
//!
//! The [`Cache`] lives here rather than in `deriva-core` even though it is
//! conceptually a search data structure: [`crate::hole::HoleBuilder::build`]
//! takes a `&Cache` argument, and a hole is part of the expression model, so
//! `Cache` has to be visible wherever `Expr` is.

pub mod cache;
pub mod expr;
pub mod hole;
pub mod lit;
pub mod subst;
pub mod traverse;
pub mod ty;

pub use cache::{Cache, Tag};
pub use expr::{Expr, ExprKind, Lambda};
pub use hole::{HoleBuilder, HoleId, HoleIdGen, HoleRef};
pub use lit::{BinOp, Literal, UnaryOp};
pub use ty::{Type, TypeTag};
