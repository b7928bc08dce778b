//! Errors the SMT oracle can raise.
//!
//! These are distinct from [`deriva_base::SynthesisError`]: a `VerifyError`
//! means the solver itself couldn't answer (timeout, or a genuine Z3
//! configuration problem), not that a core invariant broke.

use std::fmt;

pub type VerifyResult<T> = Result<T, VerifyError>;

#[derive(Debug, Clone, PartialEq)]
pub enum VerifyError {
    /// Z3 returned `unknown` — timeout, or the query fell outside the
    /// decidable fragment the encoder targets.
    Unknown,
    /// Z3 rejected the query itself (bad sort application, etc.) rather than
    /// failing to decide it.
    Internal(String),
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyError::Unknown => write!(f, "solver returned unknown"),
            VerifyError::Internal(msg) => write!(f, "solver error: {msg}"),
        }
    }
}

impl std::error::Error for VerifyError {}
