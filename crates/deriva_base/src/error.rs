//! Fatal internal errors.
//!
//! Everything in [`SynthesisError`] represents a broken invariant, not a normal
//! "couldn't find a solution" outcome. A search that exhausts its size bound
//! without finding a hole-filling is not an error: it simply yields nothing.
//! These variants are for cases the core is not supposed to be able to reach.

use std::fmt;

/// Alias for `std::result::Result<T, SynthesisError>`.
pub type Result<T> = std::result::Result<T, SynthesisError>;

/// A fatal error raised when the synthesizer detects a broken invariant.
///
/// None of these are meant to be recovered from by the caller; they indicate
/// a bug in the core, in a collaborator (evaluator, solver), or in a hand
/// written specification that violates the contracts in this crate's docs.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisError {
    /// The evaluator reported a missing hole while evaluating an expression
    /// that `contains_holes` said was closed.
    MissingHoleInClosedExpr {
        /// The name of the hole that should not have existed.
        hole: String,
    },
    /// Repeated substitution of a mapping into a specification did not reach
    /// a fixed point (a closed expression) within a bounded number of passes.
    ExpansionDidNotConverge {
        /// Debug rendering of the specification at the point expansion gave up.
        spec: String,
    },
    /// The solver returned a counterexample that is already present in the
    /// example set driving the current search.
    DuplicateCounterexample,
    /// The solver reported `Unknown` for the given query.
    SolverUnknown,
    /// A lower-level error surfaced from a collaborator (e.g. the SMT backend).
    Collaborator(String),
}

impl fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthesisError::MissingHoleInClosedExpr { hole } => {
                write!(f, "evaluator hit hole '{hole}' in an expression that should have been closed")
            }
            SynthesisError::ExpansionDidNotConverge { spec } => {
                write!(f, "expand() did not converge on: {spec}")
            }
            SynthesisError::DuplicateCounterexample => {
                write!(f, "solver returned a counterexample already present in the example set")
            }
            SynthesisError::SolverUnknown => {
                write!(f, "solver returned unknown")
            }
            SynthesisError::Collaborator(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for SynthesisError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_hole_display_names_the_hole() {
        let err = SynthesisError::MissingHoleInClosedExpr { hole: "h3".into() };
        assert!(err.to_string().contains("h3"));
    }

    #[test]
    fn expansion_error_carries_spec_rendering() {
        let err = SynthesisError::ExpansionDidNotConverge { spec: "hole[int] == x".into() };
        assert!(err.to_string().contains("hole[int] == x"));
    }
}
