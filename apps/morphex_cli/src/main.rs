//! The `morphex` binary.
//!
//! A thin wrapper around [`morphex_cli::run_cli`], handling error display
//! and exit codes. All driver logic lives in the library crate for
//! testability.
//!
//! # Exit Codes
//!
//! - `0` - success
//! - `1` - any configuration, parse or I/O error (details on stderr)

fn main() {
    if let Err(e) = morphex_cli::run_cli() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
