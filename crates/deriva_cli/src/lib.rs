//! # deriva-cli
//!
//! Demo walkthroughs for the deriva synthesizer, runnable from the command
//! line. This crate has no logic of its own beyond argument parsing and
//! narration; all synthesis happens in `deriva-core`.

pub mod cli;
pub mod config;
pub mod demo;

pub use cli::run_cli;
