//! # deriva-eval
//!
//! The reference interpreter: runs a `deriva_expr::Expr` against a concrete
//! [`Env`] to produce a [`Value`], the basis for both fingerprinting
//! (observational-equivalence pruning in the cache) and counterexample
//! checking in the outer synthesis loop.

pub mod env;
pub mod eval;
pub mod value;

pub use env::Env;
pub use eval::{all_envs_for_hole, eval, EvalResult, EvalSignal};
pub use value::Value;
