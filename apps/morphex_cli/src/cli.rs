//! Command-line argument parsing for `morphex`.

use std::path::PathBuf;

use clap::Parser;

use crate::run::{run, CliError};

/// Linguistic pattern matcher over morphologically annotated text.
#[derive(Parser)]
#[command(name = "morphex")]
#[command(about = "Find pattern matches in annotated text", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Word-attribute configuration document (JSON).
    pub config: PathBuf,

    /// Pattern definitions.
    pub patterns: PathBuf,

    /// Annotated text document (JSON).
    pub text: PathBuf,

    /// Bound on expanded variant length.
    #[arg(long, default_value_t = 12)]
    pub max_size: usize,
}

/// Parses arguments and runs the driver.
pub fn run_cli() -> Result<(), CliError> {
    env_logger::init();
    let cli = Cli::parse();
    run(&cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_positional_paths() {
        let cli = Cli::parse_from(["morphex", "c.json", "p.mxp", "t.json"]);
        assert_eq!(cli.config, PathBuf::from("c.json"));
        assert_eq!(cli.patterns, PathBuf::from("p.mxp"));
        assert_eq!(cli.text, PathBuf::from("t.json"));
        assert_eq!(cli.max_size, 12);
    }

    #[test]
    fn max_size_is_configurable() {
        let cli = Cli::parse_from(["morphex", "c", "p", "t", "--max-size", "7"]);
        assert_eq!(cli.max_size, 7);
    }
}
