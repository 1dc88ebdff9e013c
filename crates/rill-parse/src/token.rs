//! Token types produced by the tokenizer.

use crate::Position;

/// Kinds of tokens in a rill document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A mapping key (a bareword run terminated by `: `).
    Key,
    /// The `:` separator following a key.
    Colon,
    /// A `- ` sequence item marker.
    Dash,
    /// An unquoted scalar run (also inline `{...}`/`[...]` captures).
    Scalar,
    /// A quoted scalar (`"..."` or `'...'`) or a literal block scalar;
    /// its text bypasses type coercion downstream.
    Quoted,
    /// One indentation level entered.
    Indent,
    /// One indentation level left; `indent` carries the target level.
    Dedent,
    /// End of a line.
    Newline,
    /// A `#` comment (only emitted when comments are preserved).
    Comment,
    /// End of input, emitted exactly once by `finalize`.
    Eof,
}

/// A single token.
///
/// `indent` is the indentation level of the token in units of the configured
/// indent size. Tokens following a `Dash` on the same line sit one level
/// deeper than the dash itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// The token payload, after escape processing and trimming.
    pub text: String,
    /// Position of the first character of the token.
    pub pos: Position,
    /// Indentation level (for `Dedent`: the target level).
    pub indent: usize,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, text: impl Into<String>, pos: Position, indent: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            pos,
            indent,
        }
    }
}
