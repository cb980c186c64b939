//! Driver library behind the `morphex` binary.

pub mod cli;
pub mod run;

pub use cli::run_cli;
