//! The compile-and-match driver.
//!
//! Load the configuration, build the pattern set, bail out with exit code 1
//! if anything was reported, load the text, and then for every pattern:
//! echo its canonical form, print its expanded variants, compile them and
//! probe every start position, printing each matched span as `{w1 w2 …}`.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use log::warn;

use morphex_engine::builder::build_patterns_from_file;
use morphex_engine::matcher::MatchContext;
use morphex_engine::states::States;
use morphex_engine::variants::PatternBuildContext;
use morphex_language::errors::ErrorProcessor;
use morphex_text::config::{ConfigError, Configuration};
use morphex_text::loader::{load_words, TextError};
use morphex_text::Text;

use crate::cli::Cli;

/// Variant lengths must stay below the 8-bit offset encoding of word
/// conditions.
const MAX_VARIANT_SIZE: usize = 254;

/// Driver failures; pattern-file diagnostics are printed separately.
#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Text(TextError),
    /// Errors were reported against the pattern file.
    Patterns,
    Io(io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => e.fmt(f),
            CliError::Text(e) => e.fmt(f),
            CliError::Patterns => f.write_str("the pattern file has errors"),
            CliError::Io(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<TextError> for CliError {
    fn from(e: TextError) -> Self {
        CliError::Text(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

pub fn run(cli: &Cli) -> Result<(), CliError> {
    let configuration = Arc::new(Configuration::load_from_file(&cli.config)?);

    let mut errors = ErrorProcessor::new();
    let patterns = build_patterns_from_file(configuration.clone(), &cli.patterns, &mut errors);
    if errors.has_any_errors() {
        errors.print_errors(
            &mut io::stderr().lock(),
            &cli.patterns.display().to_string(),
        )?;
        return Err(CliError::Patterns);
    }

    let words = load_words(&configuration, patterns.strings(), &cli.text)?;
    let text = Text::new(configuration, words);

    let mut max_size = cli.max_size;
    if max_size > MAX_VARIANT_SIZE {
        warn!(
            "--max-size {} exceeds the variant length limit, using {}",
            max_size, MAX_VARIANT_SIZE
        );
        max_size = MAX_VARIANT_SIZE;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for pattern in patterns.iter() {
        writeln!(out, "{}", pattern.print(&patterns))?;

        let mut build_context = PatternBuildContext::new(&patterns);
        let mut variants = pattern.build(&mut build_context, max_size);
        variants.sort_and_remove_duplicates(&patterns);
        write!(out, "{}", variants.print(&patterns))?;

        let states = States::compile(&variants, &patterns);
        let mut match_context = MatchContext::new(&text, &states);
        for start in 0..text.len() {
            match_context.match_from(start);
        }
        for span in match_context.found() {
            let mut matched = String::new();
            for index in span.begin..=span.end {
                if !matched.is_empty() {
                    matched.push(' ');
                }
                matched.push_str(text.word(index).text());
            }
            writeln!(out, "{{{}}}", matched)?;
        }
        writeln!(out)?;
    }
    Ok(())
}
