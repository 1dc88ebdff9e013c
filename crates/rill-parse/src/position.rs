//! Source positions.

use std::fmt;

/// A location in the source text.
///
/// Lines and columns are 1-indexed; columns count characters. The offset is
/// a 0-indexed byte position into the stream fed so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Position {
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column, in characters.
    pub column: u32,
    /// 0-indexed byte offset.
    pub offset: usize,
}

impl Position {
    /// Create a new position.
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// The position of the first character of a stream.
    pub fn start() -> Self {
        Self::new(1, 1, 0)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
