#![cfg_attr(docsrs, feature(doc_cfg))]

//! # deriva-core
//!
//! Bottom-up enumerative synthesis with CEGIS refinement.
//!
//! [`builder::Builder`] enumerates well-typed candidates of a given size from
//! a shared [`deriva_expr::Cache`]; [`search::find_consistent_exps`] drives
//! that enumeration goal-hole by goal-hole, pruning by cost and by
//! observational equivalence against the current example set;
//! [`synth::synth`] wraps the whole thing in the outer counterexample loop,
//! growing the example set each time the solver refutes a candidate.
//!
//! None of this crate runs the search lazily in the sense a generator would:
//! every stage builds a `Vec` and hands it back. At the node counts this
//! search explores that's an implementation detail, not a semantic one — see
//! [`builder`] for the same call on the `HoleBuilder` trait's iterator
//! contract.

pub mod builder;
pub mod combinatorics;
pub mod cost;
pub mod search;
pub mod synth;

pub use builder::Builder;
pub use combinatorics::{cross_product, pick_to_sum};
pub use cost::{ConstantCost, CostModel, RuntimeCost};
pub use search::{find_consistent_exps, SearchContext};
pub use synth::synth;
