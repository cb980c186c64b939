//! Line-addressed diagnostics.
//!
//! Errors accumulate instead of aborting: the reader, lexer and parser all
//! push into one [`ErrorProcessor`] and processing continues while it can,
//! so a single run reports everything wrong with a pattern file. Only
//! *critical* errors (missing file, broken encoding) stop further reading.
//!
//! Rendering follows the classic compiler shape:
//!
//! ```text
//! patterns.mxp:3:error: closing brace `}` expected
//! P = { A N
//!     ^
//! ```
//!
//! The highlight line puts `^` at the last byte of every reported segment
//! and `~` under the rest of the segment, one column per UTF-8 character.

use std::io::{self, Write};

use morphex_base::Span;

use crate::source::SharedLine;

/// Whether an error allows processing to continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    /// Reading stops; the file cannot be processed further.
    Critical,
}

/// One recorded diagnostic.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub severity: Severity,
    pub line: Option<SharedLine>,
    pub segments: Vec<Span>,
    pub message: String,
}

impl ParseError {
    /// An error without a source position.
    pub fn bare(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            severity,
            line: None,
            segments: Vec::new(),
            message: message.into(),
        }
    }

    /// An error pointing at one or more segments of a line.
    pub fn in_line(
        line: SharedLine,
        segments: Vec<Span>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            severity,
            line: Some(line),
            segments,
            message: message.into(),
        }
    }

    fn print(&self, out: &mut dyn Write, filename: &str) -> io::Result<()> {
        let Some(line) = &self.line else {
            return writeln!(out, "{}:error: {}.", filename, self.message);
        };

        writeln!(out, "{}:{}:error: {}", filename, line.number(), self.message)?;
        writeln!(out, "{}", line.text())?;
        writeln!(out, "{}", highlights(line.text(), &self.segments))?;
        writeln!(out)
    }
}

/// Builds the `^`/`~` highlight line for `source`.
fn highlights(source: &str, segments: &[Span]) -> String {
    let len = source.len();
    let mut marked = vec![false; len + 1];
    let mut tips = vec![false; len + 1];
    let mut last_offset = 0;

    let bytes = source.as_bytes();
    for segment in segments {
        let length = segment.len().max(1);
        let first = segment.start.min(len);
        let last = first.saturating_add(length - 1).min(len);
        last_offset = last_offset.max(last);
        for slot in marked.iter_mut().take(last + 1).skip(first) {
            *slot = true;
        }
        // The caret goes on the column of the character holding the
        // segment's last byte.
        let mut tip = last;
        while tip > 0 && tip < len && (bytes[tip] & 0xC0) == 0x80 {
            tip -= 1;
        }
        tips[tip] = true;
    }

    let mut rendered = String::new();
    for i in 0..=last_offset {
        // One output column per character: skip UTF-8 continuation bytes.
        let first_in_char = i >= len || (bytes[i] & 0xC0) != 0x80;
        if first_in_char {
            rendered.push(if tips[i] {
                '^'
            } else if marked[i] {
                '~'
            } else {
                ' '
            });
        }
    }
    rendered
}

/// Accumulates diagnostics grouped by line number.
#[derive(Debug, Default)]
pub struct ErrorProcessor {
    errors: Vec<Vec<ParseError>>,
    has_errors: bool,
    has_critical: bool,
}

impl ErrorProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.errors.clear();
        self.has_errors = false;
        self.has_critical = false;
    }

    pub fn add_error(&mut self, error: ParseError) {
        let index = error.line.as_ref().map_or(0, |l| l.number());
        if self.errors.len() <= index {
            self.errors.resize_with(index + 1, Vec::new);
        }
        self.has_errors = true;
        if error.severity == Severity::Critical {
            self.has_critical = true;
        }
        self.errors[index].push(error);
    }

    pub fn has_any_errors(&self) -> bool {
        self.has_errors
    }

    pub fn has_critical_errors(&self) -> bool {
        self.has_critical
    }

    /// Writes every recorded error in line order.
    pub fn print_errors(&self, out: &mut dyn Write, filename: &str) -> io::Result<()> {
        for line_errors in &self.errors {
            for error in line_errors {
                error.print(out, filename)?;
            }
        }
        Ok(())
    }
}
