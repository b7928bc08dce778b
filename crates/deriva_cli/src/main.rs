//! `deriva` - standalone binary
//!
//! Thin wrapper around [`deriva_cli::run_cli`], handling error display and
//! exit codes. All command logic lives in the library crate for testability.

fn main() {
    if let Err(e) = deriva_cli::run_cli() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
