//! Shared source lines.
//!
//! Tokens and diagnostics both need the text and number of the line they
//! came from, long after the reader has moved on. Lines are therefore
//! reference-counted: every token of a line and every error on it share one
//! allocation.

use std::fmt;
use std::rc::Rc;

struct FileLine {
    text: String,
    number: usize,
}

/// A cheaply cloneable handle to one source line.
#[derive(Clone)]
pub struct SharedLine(Rc<FileLine>);

impl SharedLine {
    /// Wraps a line; `number` is 1-based.
    pub fn new(text: String, number: usize) -> Self {
        Self(Rc::new(FileLine { text, number }))
    }

    pub fn text(&self) -> &str {
        &self.0.text
    }

    pub fn number(&self) -> usize {
        self.0.number
    }
}

impl fmt::Debug for SharedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.0.number, self.0.text)
    }
}
