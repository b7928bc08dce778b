//! Command-line interface for `deriva demo`.
//!
//! The CLI is built on [`clap`]'s derive macros. Each [`Demo`] variant maps
//! to a walkthrough in [`crate::demo`]; there is no other behavior here
//! beyond parsing and dispatch.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::SynthConfig;
use crate::demo;

/// Command-line interface for the deriva synthesis demos.
#[derive(Parser)]
#[command(name = "deriva")]
#[command(about = "Demos for the deriva program synthesizer", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one of the built-in synthesis walkthroughs.
    Demo {
        #[command(subcommand)]
        which: Demo,
    },
}

/// The available walkthroughs, one per notable shape of search problem.
#[derive(Subcommand)]
pub enum Demo {
    /// Synthesize a hole filled by a literal constant.
    Const,
    /// Synthesize a hole filled by a free variable, discovered via a
    /// solver-produced counterexample.
    Var,
    /// Synthesize a hole filled by `sum` over a seeded bag.
    Sum,
    /// Discover a `filter` expression that reproduces a target bag.
    Filter,
    /// Show that a costlier observationally-equivalent candidate never
    /// displaces a cheaper one already in the cache.
    CostTie,
    /// Print every way to split `total` into `n` positive parts, in
    /// canonical order. Defaults to splitting 5 into 3 parts; override with
    /// `--config deriva.toml` (see [`crate::config`]).
    PickToSum {
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

/// Parses `std::env::args()` and runs the selected demo, printing its
/// result to stdout.
pub fn run_cli() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let Commands::Demo { which } = cli.command;
    let output = match which {
        Demo::Const => demo::constant()?,
        Demo::Var => demo::variable_binding()?,
        Demo::Sum => demo::bag_sum()?,
        Demo::Filter => demo::filter_discovery()?,
        Demo::CostTie => demo::cost_tie_break()?,
        Demo::PickToSum { config } => {
            let settings = match config {
                Some(path) => SynthConfig::load(&path)?.pick_to_sum,
                None => SynthConfig::default().pick_to_sum,
            };
            demo::pick_to_sum(settings.n, settings.total)?
        }
    };
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_well_formed() {
        Cli::command().debug_assert();
    }
}
