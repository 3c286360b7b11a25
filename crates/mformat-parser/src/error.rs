//! Parse error types for the mformat parser.

use std::fmt;

/// A fatal parse error.
///
/// The parser assumes input that is syntactically close to valid MATLAB;
/// when the expression partitioner meets a shape it cannot explain (or a
/// block keyword has no enclosing block), the file is rejected with one of
/// these. `pos` is the byte offset of the offending token when known, for
/// diagnostic rendering against the source.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Human-readable description of what went wrong.
    pub message: String,
    /// Byte offset of the offending token in the source, when known.
    pub pos: Option<usize>,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(message: impl Into<String>, pos: Option<usize>) -> Self {
        Self {
            message: message.into(),
            pos,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}
