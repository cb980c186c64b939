//! Line-oriented reading of pattern files.
//!
//! A pattern definition starts at the first character of a line and may
//! continue on following lines; a continuation line starts with a blank and
//! carries at least one token. Lines without tokens separate definitions.
//!
//! The reader validates each line before tokenizing it: the file must be
//! valid UTF-8 and free of control characters other than tab; tabs are
//! expanded to 8-column stops (counted in characters) so reported columns
//! and highlight lines agree with what the user sees.

use std::fs;
use std::path::Path;

use morphex_base::Span;

use crate::errors::{ErrorProcessor, ParseError, Severity};
use crate::lexer::Tokenizer;
use crate::source::SharedLine;
use crate::token::Token;

const TAB_SIZE: usize = 8;

/// Expands tabs to `TAB_SIZE`-column stops, counting columns in characters.
fn replace_tabs(line: &str) -> String {
    let mut result = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let spaces = TAB_SIZE - column % TAB_SIZE;
            for _ in 0..spaces {
                result.push(' ');
            }
            column += spaces;
        } else {
            result.push(c);
            column += 1;
        }
    }
    result
}

/// Reads a pattern file and yields one token group per definition.
pub struct PatternsReader {
    raw_lines: Vec<Vec<u8>>,
    next_line: usize,
    line: String,
    line_number: usize,
    tokenizer: Tokenizer,
}

impl PatternsReader {
    /// Opens `path`. On failure a critical error is recorded and the reader
    /// stays empty.
    pub fn open(path: &Path, errors: &mut ErrorProcessor) -> Self {
        match fs::read(path) {
            Ok(bytes) => Self::from_bytes(bytes, errors),
            Err(_) => {
                errors.add_error(ParseError::bare("the file not found", Severity::Critical));
                Self::empty()
            }
        }
    }

    /// Builds a reader over in-memory source text.
    pub fn from_source(source: &str, errors: &mut ErrorProcessor) -> Self {
        Self::from_bytes(source.as_bytes().to_vec(), errors)
    }

    fn empty() -> Self {
        Self {
            raw_lines: Vec::new(),
            next_line: 0,
            line: String::new(),
            line_number: 0,
            tokenizer: Tokenizer::new(),
        }
    }

    fn from_bytes(bytes: Vec<u8>, errors: &mut ErrorProcessor) -> Self {
        let mut reader = Self::empty();
        reader.raw_lines = bytes
            .split(|&b| b == b'\n')
            .map(<[u8]>::to_vec)
            .collect();
        if !reader.skip_empty_lines(errors) && !errors.has_critical_errors() {
            errors.add_error(ParseError::bare("the file is empty", Severity::Critical));
        }
        reader
    }

    /// `true` while another definition's tokens are available.
    pub fn has_more(&self) -> bool {
        !self.tokenizer.is_empty()
    }

    /// Takes the tokens of the next definition.
    ///
    /// The first line of the definition has already been tokenized; this
    /// consumes its continuation lines and positions the reader at the
    /// following definition.
    pub fn read_pattern(&mut self, errors: &mut ErrorProcessor) -> Vec<Token> {
        debug_assert!(!self.tokenizer.is_empty());

        if self.line_starts_with_space() {
            let first = self.tokenizer.tokens()[0].span.start;
            errors.add_error(ParseError::in_line(
                SharedLine::new(self.line.clone(), self.line_number),
                vec![Span::new(0, first + 1)],
                "a pattern definition is required to be written \
                 from the first character of the line",
                Severity::Error,
            ));
        }
        self.line.clear();

        // Consume continuation lines: blank-led and carrying tokens.
        while self.next_line < self.raw_lines.len() {
            self.read_line(errors);
            if !self.line_starts_with_space() {
                break;
            }
            if !self.tokenize_held_line(errors) {
                self.line.clear();
                break;
            }
        }

        let tokens = self.tokenizer.take();
        self.skip_empty_lines(errors);
        tokens
    }

    /// Tokenizes the held line; `true` if it contributed tokens.
    fn tokenize_held_line(&mut self, errors: &mut ErrorProcessor) -> bool {
        let before = self.tokenizer.len();
        self.tokenizer.tokenize_line(
            SharedLine::new(self.line.clone(), self.line_number),
            errors,
        );
        self.tokenizer.len() > before
    }

    fn read_line(&mut self, errors: &mut ErrorProcessor) {
        self.line_number += 1;
        let mut raw = self.raw_lines[self.next_line].clone();
        self.next_line += 1;

        if raw.last() == Some(&b'\r') {
            raw.pop();
        }

        match String::from_utf8(raw) {
            Ok(line) => {
                let line = replace_tabs(&line);
                if let Some(offset) = line
                    .char_indices()
                    .find_map(|(i, c)| c.is_ascii_control().then_some(i))
                {
                    errors.add_error(ParseError::in_line(
                        SharedLine::new(line.clone(), self.line_number),
                        vec![Span::at(offset, 1)],
                        "the file is not a text file",
                        Severity::Critical,
                    ));
                    self.line.clear();
                } else {
                    self.line = line;
                }
            }
            Err(e) => {
                let offset = e.utf8_error().valid_up_to();
                let lossy = String::from_utf8_lossy(e.as_bytes()).into_owned();
                errors.add_error(ParseError::in_line(
                    SharedLine::new(lossy, self.line_number),
                    vec![Span::at(offset, 1)],
                    "the file is not valid UTF-8",
                    Severity::Critical,
                ));
                self.line.clear();
            }
        }
    }

    /// Advances to the next line with tokens; `false` when none remain.
    fn skip_empty_lines(&mut self, errors: &mut ErrorProcessor) -> bool {
        self.tokenizer.reset();

        loop {
            if errors.has_critical_errors() {
                break;
            }
            if self.tokenize_held_line(errors) {
                break;
            }
            if self.next_line >= self.raw_lines.len() {
                break;
            }
            self.read_line(errors);
        }

        if self.tokenizer.is_empty() || errors.has_critical_errors() {
            self.tokenizer.reset();
            return false;
        }
        true
    }

    fn line_starts_with_space(&self) -> bool {
        self.line.starts_with(' ')
    }
}
