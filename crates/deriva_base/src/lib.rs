#![cfg_attr(docsrs, feature(doc_cfg))]

//! # deriva-base
//!
//! Small structural primitives shared by every crate in the deriva workspace.
//!
//! - [`Interner`]/[`Symbol`] — string interning for O(1) name equality (variable
//!   names, record fields, handle tags)
//! - [`SynthesisError`]/[`Result`] — fatal internal errors: the kind of thing
//!   that means a core invariant broke, not a normal "no solution found"
//!
//! # Example
//!
//! ```
//! use deriva_base::Interner;
//!
//! let mut interner = Interner::new();
//! let x = interner.intern("x");
//! let y = interner.intern("y");
//! assert_ne!(x, y);
//! assert_eq!(interner.resolve(x), "x");
//! ```

pub mod error;
pub mod intern;

pub use error::{Result, SynthesisError};
pub use intern::{Interner, Symbol, SymbolEq};
