#![cfg_attr(docsrs, feature(doc_cfg))]

//! # deriva-verify
//!
//! The SMT oracle behind the two external operations the search treats as a
//! black box: [`SmtOracle::satisfy`] and [`SmtOracle::feasible`].
//!
//! ## Encoding strategy
//!
//! | deriva type | Z3 encoding |
//! |-------------|-------------|
//! | `Int` | Z3 `IntSort` |
//! | `Bool` | Z3 `BoolSort` |
//! | `Tuple`/`Record` | decomposed field-by-field, recursively |
//! | everything else (`Bag`, `Maybe`, `Map`, `Str`, `Native`, `Handle`, `Function`) | an uninterpreted identity, compared only by Z3's congruence closure |
//!
//! See [`encode`] for why the second row stops at congruence rather than
//! full collection semantics.

pub mod encode;
pub mod error;
pub mod solver;

pub use encode::Encoder;
pub use error::{VerifyError, VerifyResult};
pub use solver::{Model, SmtOracle};
