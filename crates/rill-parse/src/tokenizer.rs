//! Incremental tokenizer.
//!
//! The tokenizer turns an append-only character buffer into a token stream
//! that is safe to consume while the document is still being generated: a
//! token is only emitted once enough input exists to prove where it ends.
//! When the tail of the buffer could still be extended into a longer token,
//! the scan position rewinds to the token start and [`Tokenizer::next`]
//! returns `None` until more input arrives or [`Tokenizer::finalize`] lifts
//! the restriction.
//!
//! Indentation is measured only on lines that carry content; blank and
//! comment-only lines never touch the indent stack. The tokenizer never
//! fails: malformed runs degrade into scalars and problems are recorded as
//! diagnostics.

use std::collections::VecDeque;

use crate::trace;
use crate::{Diagnostic, Options, Position, Token, TokenKind};

/// A saved scan position, used to rewind after a partial token.
#[derive(Debug, Clone, Copy)]
struct Mark {
    pos: usize,
    line: u32,
    column: u32,
}

/// Incremental tokenizer over a growing buffer.
pub struct Tokenizer {
    opts: Options,
    buf: String,
    pos: usize,
    line: u32,
    column: u32,

    at_line_start: bool,
    /// Levels entered so far; the first entry is always 0.
    indent_stack: Vec<usize>,
    /// Indent level of the current line, including `- ` bumps.
    line_indent: usize,
    /// Whether a `-` at the current position may start a sequence item.
    dash_ok: bool,
    /// Whether the previous token on this line was a `Colon`.
    after_colon: bool,

    pending: VecDeque<Token>,
    finishing: bool,
    eof_flushed: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Tokenizer {
    /// Create a tokenizer with the given options.
    pub fn new(opts: Options) -> Self {
        Self {
            opts,
            buf: String::new(),
            pos: 0,
            line: 1,
            column: 1,
            at_line_start: true,
            indent_stack: vec![0],
            line_indent: 0,
            dash_ok: true,
            after_colon: false,
            pending: VecDeque::new(),
            finishing: false,
            eof_flushed: false,
            diagnostics: Vec::new(),
        }
    }

    /// Append a chunk to the buffer. Never scans the chunk contents.
    pub fn write(&mut self, chunk: &str) {
        self.buf.push_str(chunk);
    }

    /// Get the next complete token, or `None` when the remaining buffer
    /// cannot produce one without further input.
    pub fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                trace!("token {:?} {:?} at {}", token.kind, token.text, token.pos);
                return Some(token);
            }
            if self.eof_flushed || !self.lex_step() {
                return None;
            }
        }
    }

    /// Enter the finishing phase and drain everything that remains.
    ///
    /// Partial tokens at the tail are now allowed to resolve; afterwards a
    /// synthetic `Dedent` closes each open level, followed by one `Eof`.
    pub fn finalize(&mut self) -> Vec<Token> {
        self.finishing = true;
        let mut tokens = Vec::new();
        while let Some(token) = self.next() {
            tokens.push(token);
        }
        tokens
    }

    /// Whether `finalize` has been called.
    pub fn is_finishing(&self) -> bool {
        self.finishing
    }

    /// Diagnostics recorded so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Take and clear the recorded diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Drop the buffer and rebuild the initial state.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.pos = 0;
        self.line = 1;
        self.column = 1;
        self.at_line_start = true;
        self.indent_stack.clear();
        self.indent_stack.push(0);
        self.line_indent = 0;
        self.dash_ok = true;
        self.after_colon = false;
        self.pending.clear();
        self.finishing = false;
        self.eof_flushed = false;
        self.diagnostics.clear();
    }

    // ------------------------------------------------------------------
    // Scan primitives
    // ------------------------------------------------------------------

    #[inline]
    fn peek(&self) -> Option<char> {
        self.buf[self.pos..].chars().next()
    }

    #[inline]
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.buf[self.pos..].chars().nth(n)
    }

    /// Advance by one character.
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    fn rewind(&mut self, mark: Mark) {
        self.pos = mark.pos;
        self.line = mark.line;
        self.column = mark.column;
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column, self.pos)
    }

    fn push_token(&mut self, kind: TokenKind, text: impl Into<String>, pos: Position) {
        let indent = self.line_indent;
        self.pending.push_back(Token::new(kind, text, pos, indent));
    }

    // ------------------------------------------------------------------
    // Lexing steps
    // ------------------------------------------------------------------

    /// Make progress: push at least one token, consume input, or flush the
    /// end state. Returns `false` when blocked awaiting more input.
    fn lex_step(&mut self) -> bool {
        if self.at_line_start {
            return self.lex_line_start();
        }
        self.skip_inline_ws();
        let c = match self.peek() {
            Some(c) => c,
            None => {
                if self.finishing {
                    self.flush_end();
                    return true;
                }
                return false;
            }
        };
        match c {
            '\n' => self.lex_newline(),
            '\r' => {
                if self.peek_nth(1) == Some('\n') {
                    self.lex_newline()
                } else if self.peek_nth(1).is_none() && !self.finishing {
                    false
                } else {
                    self.bump();
                    true
                }
            }
            '#' => self.lex_comment(),
            '"' | '\'' => self.lex_quoted(c),
            '-' if self.dash_ok => self.lex_dash(),
            '|' if self.after_colon => self.lex_block_scalar(),
            '{' | '[' => self.lex_flow(),
            _ => self.lex_bareword(),
        }
    }

    /// Measure leading whitespace and emit `Indent`/`Dedent` as needed.
    ///
    /// Blank lines emit `Newline` and stay in line-start state; comment-only
    /// lines are handled without touching the indent stack.
    fn lex_line_start(&mut self) -> bool {
        let mark = self.mark();
        let tab_pos = self.position();
        let mut width = 0usize;
        let mut saw_tab = false;
        loop {
            match self.peek() {
                Some(' ') => {
                    width += 1;
                    self.bump();
                }
                Some('\t') => {
                    saw_tab = true;
                    width += self.opts.indent_size;
                    self.bump();
                }
                _ => break,
            }
        }
        match self.peek() {
            None => {
                if self.finishing {
                    self.flush_end();
                    true
                } else {
                    self.rewind(mark);
                    false
                }
            }
            Some('\n') => {
                let pos = self.position();
                self.bump();
                self.push_token(TokenKind::Newline, "\n", pos);
                true
            }
            Some('\r') => {
                if self.peek_nth(1) == Some('\n') {
                    let pos = self.position();
                    self.bump();
                    self.bump();
                    self.push_token(TokenKind::Newline, "\n", pos);
                    true
                } else if self.peek_nth(1).is_none() && !self.finishing {
                    self.rewind(mark);
                    false
                } else {
                    self.bump();
                    true
                }
            }
            Some('#') => {
                // Comment-only line: the indent stack is untouched.
                if self.lex_comment() {
                    self.at_line_start = false;
                    true
                } else {
                    self.rewind(mark);
                    false
                }
            }
            Some(_) => {
                if saw_tab && !self.opts.allow_tabs {
                    self.diagnostics
                        .push(Diagnostic::warning("tab in indentation", tab_pos));
                }
                let level = width / self.opts.indent_size;
                self.apply_indent(level);
                self.at_line_start = false;
                self.line_indent = level;
                self.dash_ok = true;
                self.after_colon = false;
                true
            }
        }
    }

    /// Compare `level` against the indent stack and queue `Indent`/`Dedent`.
    fn apply_indent(&mut self, level: usize) {
        let pos = self.position();
        let top = *self.indent_stack.last().unwrap();
        if level > top {
            self.indent_stack.push(level);
            self.line_indent = level;
            self.push_token(TokenKind::Indent, "", pos);
        } else if level < top {
            while *self.indent_stack.last().unwrap() > level {
                self.indent_stack.pop();
                let target = (*self.indent_stack.last().unwrap()).max(level);
                self.line_indent = target;
                self.push_token(TokenKind::Dedent, "", pos);
            }
            if *self.indent_stack.last().unwrap() != level {
                self.diagnostics
                    .push(Diagnostic::warning("inconsistent indentation", pos));
                self.indent_stack.push(level);
                self.line_indent = level;
                self.push_token(TokenKind::Indent, "", pos);
            }
        }
    }

    fn skip_inline_ws(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.bump();
        }
    }

    fn lex_newline(&mut self) -> bool {
        let pos = self.position();
        if self.peek() == Some('\r') {
            self.bump();
        }
        self.bump();
        self.push_token(TokenKind::Newline, "\n", pos);
        self.at_line_start = true;
        self.after_colon = false;
        true
    }

    /// Lex `#` through end of line; emits a token only with
    /// `preserve_comments`.
    fn lex_comment(&mut self) -> bool {
        let mark = self.mark();
        let pos = self.position();
        self.bump(); // '#'
        let text_start = self.pos;
        loop {
            match self.peek() {
                None => {
                    if self.finishing {
                        break;
                    }
                    self.rewind(mark);
                    return false;
                }
                Some('\n') => break,
                Some('\r') if self.peek_nth(1) == Some('\n') => break,
                Some('\r') if self.peek_nth(1).is_none() && !self.finishing => {
                    self.rewind(mark);
                    return false;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        if self.opts.preserve_comments {
            let text = self.buf[text_start..self.pos].trim().to_string();
            self.push_token(TokenKind::Comment, text, pos);
        }
        self.after_colon = false;
        self.dash_ok = false;
        true
    }

    /// Lex a `- ` marker, or fall back to a bareword for a lone `-`.
    fn lex_dash(&mut self) -> bool {
        match self.peek_nth(1) {
            Some(' ') | Some('\t') => {
                let pos = self.position();
                self.bump();
                self.bump();
                self.push_token(TokenKind::Dash, "-", pos);
                // Content of the item sits one level deeper than the dash.
                self.line_indent += 1;
                self.after_colon = false;
                true
            }
            None if !self.finishing => false,
            _ => self.lex_bareword(),
        }
    }

    /// Lex a quoted scalar with escape processing.
    fn lex_quoted(&mut self, quote: char) -> bool {
        let mark = self.mark();
        let pos = self.position();
        self.bump(); // opening quote
        let mut text = String::new();
        loop {
            match self.peek() {
                None => {
                    if self.finishing {
                        self.diagnostics
                            .push(Diagnostic::error("unterminated quoted scalar", pos));
                        break;
                    }
                    self.rewind(mark);
                    return false;
                }
                Some(c) if c == quote => {
                    self.bump();
                    break;
                }
                Some('\n') => {
                    // Terminates the scalar; the newline is not consumed.
                    self.diagnostics
                        .push(Diagnostic::error("unterminated quoted scalar", pos));
                    break;
                }
                Some('\r') if self.peek_nth(1) == Some('\n') => {
                    self.diagnostics
                        .push(Diagnostic::error("unterminated quoted scalar", pos));
                    break;
                }
                Some('\\') => match self.peek_nth(1) {
                    None => {
                        if self.finishing {
                            self.diagnostics
                                .push(Diagnostic::error("unterminated quoted scalar", pos));
                            self.bump();
                            break;
                        }
                        self.rewind(mark);
                        return false;
                    }
                    Some(esc) => {
                        self.bump();
                        self.bump();
                        match esc {
                            'n' => text.push('\n'),
                            't' => text.push('\t'),
                            'r' => text.push('\r'),
                            '\\' | '"' | '\'' => text.push(esc),
                            // Unknown escapes pass the character through.
                            other => text.push(other),
                        }
                    }
                },
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
        self.push_token(TokenKind::Quoted, text, pos);
        self.after_colon = false;
        self.dash_ok = false;
        true
    }

    /// Lex a bareword run, producing `Key` + `Colon` when it is terminated
    /// by a key-terminating colon, otherwise a `Scalar`.
    fn lex_bareword(&mut self) -> bool {
        let mark = self.mark();
        let pos = self.position();
        let start = self.pos;
        loop {
            match self.peek() {
                None => {
                    if self.finishing {
                        break;
                    }
                    self.rewind(mark);
                    return false;
                }
                Some('\n') | Some('#') => break,
                Some('\r') if self.peek_nth(1) == Some('\n') => break,
                Some('\r') if self.peek_nth(1).is_none() && !self.finishing => {
                    self.rewind(mark);
                    return false;
                }
                Some(':') => match self.peek_nth(1) {
                    Some(' ') | Some('\t') | Some('\n') => return self.finish_key(start, pos),
                    Some('\r') if self.peek_nth(2) == Some('\n') => {
                        return self.finish_key(start, pos)
                    }
                    None => {
                        if self.finishing {
                            return self.finish_key(start, pos);
                        }
                        self.rewind(mark);
                        return false;
                    }
                    // A `:` inside a bareword is just a character.
                    _ => {
                        self.bump();
                    }
                },
                Some(_) => {
                    self.bump();
                }
            }
        }
        let text = self.buf[start..self.pos].trim_end().to_string();
        self.push_token(TokenKind::Scalar, text, pos);
        self.after_colon = false;
        self.dash_ok = false;
        true
    }

    /// Emit `Key` + `Colon` for a bareword ending at the current `:`.
    fn finish_key(&mut self, start: usize, pos: Position) -> bool {
        let key = self.buf[start..self.pos].trim_end().to_string();
        let colon_pos = self.position();
        self.bump(); // ':'
        self.push_token(TokenKind::Key, key, pos);
        self.push_token(TokenKind::Colon, ":", colon_pos);
        self.after_colon = true;
        self.dash_ok = false;
        true
    }

    /// Capture an inline `{...}`/`[...]` span as a single scalar.
    ///
    /// A naive depth counter over both bracket kinds; the interior is not
    /// parsed and the capture never crosses a newline.
    fn lex_flow(&mut self) -> bool {
        let mark = self.mark();
        let pos = self.position();
        let start = self.pos;
        let mut depth = 0i32;
        loop {
            match self.peek() {
                None => {
                    if self.finishing {
                        break;
                    }
                    self.rewind(mark);
                    return false;
                }
                Some('\n') => break,
                Some('\r') if self.peek_nth(1) == Some('\n') => break,
                Some('\r') if self.peek_nth(1).is_none() && !self.finishing => {
                    self.rewind(mark);
                    return false;
                }
                Some('{') | Some('[') => {
                    depth += 1;
                    self.bump();
                }
                Some('}') | Some(']') => {
                    depth -= 1;
                    self.bump();
                    if depth <= 0 {
                        break;
                    }
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        let text = self.buf[start..self.pos].trim_end().to_string();
        self.push_token(TokenKind::Scalar, text, pos);
        self.after_colon = false;
        self.dash_ok = false;
        true
    }

    /// Lex a literal block scalar introduced by `|` at a value position.
    ///
    /// The first non-empty line fixes the strip indent; exactly that many
    /// leading spaces are removed from each line and the lines are joined
    /// with `\n`. The token is withheld until a terminating line (or
    /// finalize) proves where the block ends. The joined text is emitted as
    /// a `Quoted` token so it bypasses coercion.
    fn lex_block_scalar(&mut self) -> bool {
        let mark = self.mark();
        let pos = self.position();
        self.bump(); // '|'

        // Skip the remainder of the introducer line.
        loop {
            match self.peek() {
                None => {
                    if self.finishing {
                        self.push_block(pos, Vec::new());
                        return true;
                    }
                    self.rewind(mark);
                    return false;
                }
                Some('\n') => {
                    self.bump();
                    break;
                }
                Some('\r') if self.peek_nth(1) == Some('\n') => {
                    self.bump();
                    self.bump();
                    break;
                }
                Some('\r') if self.peek_nth(1).is_none() && !self.finishing => {
                    self.rewind(mark);
                    return false;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }

        let mut strip: Option<usize> = None;
        let mut lines: Vec<String> = Vec::new();
        loop {
            let line_mark = self.mark();
            let mut ws = 0usize;
            while self.peek() == Some(' ') {
                ws += 1;
                self.bump();
            }

            let newline = match self.peek() {
                None => {
                    if self.finishing {
                        // Whitespace-only unterminated tail: not content.
                        break;
                    }
                    self.rewind(mark);
                    return false;
                }
                Some('\n') => Some(()),
                Some('\r') if self.peek_nth(1) == Some('\n') => Some(()),
                Some('\r') if self.peek_nth(1).is_none() && !self.finishing => {
                    self.rewind(mark);
                    return false;
                }
                Some(_) => None,
            };

            match (newline, strip) {
                (Some(()), None) => {
                    // Blank line before the first content line: skipped.
                    if self.peek() == Some('\r') {
                        self.bump();
                    }
                    self.bump();
                }
                (Some(()), Some(base)) => {
                    if ws >= base {
                        if self.peek() == Some('\r') {
                            self.bump();
                        }
                        self.bump();
                        lines.push(" ".repeat(ws - base));
                    } else {
                        // The line ends the block; leave it for normal lexing.
                        self.rewind(line_mark);
                        break;
                    }
                }
                (None, None) => {
                    if ws == 0 {
                        // Zero-indent first content line: empty block.
                        self.rewind(line_mark);
                        break;
                    }
                    match self.read_block_line() {
                        Some(text) => {
                            strip = Some(ws);
                            lines.push(text);
                        }
                        None => {
                            self.rewind(mark);
                            return false;
                        }
                    }
                }
                (None, Some(base)) => {
                    if ws < base {
                        self.rewind(line_mark);
                        break;
                    }
                    match self.read_block_line() {
                        Some(text) => {
                            lines.push(format!("{}{}", " ".repeat(ws - base), text))
                        }
                        None => {
                            self.rewind(mark);
                            return false;
                        }
                    }
                }
            }
        }

        // The block ends at a line start; re-measure indentation there.
        self.at_line_start = true;
        self.push_block(pos, lines);
        true
    }

    fn push_block(&mut self, pos: Position, lines: Vec<String>) {
        self.push_token(TokenKind::Quoted, lines.join("\n"), pos);
        self.after_colon = false;
        self.dash_ok = false;
    }

    /// Read the rest of a block-scalar line, consuming its newline.
    fn read_block_line(&mut self) -> Option<String> {
        let start = self.pos;
        loop {
            match self.peek() {
                None => {
                    if self.finishing {
                        return Some(self.buf[start..self.pos].to_string());
                    }
                    return None;
                }
                Some('\n') => {
                    let text = self.buf[start..self.pos].to_string();
                    self.bump();
                    return Some(text);
                }
                Some('\r') if self.peek_nth(1) == Some('\n') => {
                    let text = self.buf[start..self.pos].to_string();
                    self.bump();
                    self.bump();
                    return Some(text);
                }
                Some('\r') if self.peek_nth(1).is_none() && !self.finishing => return None,
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    /// Close all open levels and emit the final `Eof`.
    fn flush_end(&mut self) {
        if self.eof_flushed {
            return;
        }
        let pos = self.position();
        while *self.indent_stack.last().unwrap() > 0 {
            self.indent_stack.pop();
            let target = *self.indent_stack.last().unwrap();
            self.line_indent = target;
            self.push_token(TokenKind::Dedent, "", pos);
        }
        self.line_indent = 0;
        self.pending.push_back(Token::new(TokenKind::Eof, "", pos, 0));
        self.eof_flushed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<(TokenKind, String)> {
        lex_with(source, Options::default())
    }

    fn lex_with(source: &str, opts: Options) -> Vec<(TokenKind, String)> {
        let mut tokenizer = Tokenizer::new(opts);
        tokenizer.write(source);
        let mut tokens = Vec::new();
        while let Some(t) = tokenizer.next() {
            tokens.push((t.kind, t.text));
        }
        for t in tokenizer.finalize() {
            tokens.push((t.kind, t.text));
        }
        tokens
    }

    fn kinds(tokens: &[(TokenKind, String)]) -> Vec<TokenKind> {
        tokens.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_simple_entry() {
        let tokens = lex("name: Alice\n");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Key, "name".to_string()),
                (TokenKind::Colon, ":".to_string()),
                (TokenKind::Scalar, "Alice".to_string()),
                (TokenKind::Newline, "\n".to_string()),
                (TokenKind::Eof, "".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_trailing_newline() {
        let tokens = lex("name: Alice");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Key,
                TokenKind::Colon,
                TokenKind::Scalar,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_indent_dedent() {
        let tokens = lex("a:\n  b: 1\nc: 2\n");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Key,
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::Key,
                TokenKind::Colon,
                TokenKind::Scalar,
                TokenKind::Newline,
                TokenKind::Dedent,
                TokenKind::Key,
                TokenKind::Colon,
                TokenKind::Scalar,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_finalize_closes_levels() {
        let tokens = lex("a:\n  b:\n    c: 1");
        let ks = kinds(&tokens);
        let dedents = ks.iter().filter(|k| **k == TokenKind::Dedent).count();
        assert_eq!(dedents, 2);
        assert_eq!(*ks.last().unwrap(), TokenKind::Eof);
    }

    #[test]
    fn test_dash_sequence() {
        let tokens = lex("items:\n  - one\n  - two\n");
        let ks = kinds(&tokens);
        assert_eq!(ks.iter().filter(|k| **k == TokenKind::Dash).count(), 2);
        assert!(tokens.contains(&(TokenKind::Scalar, "one".to_string())));
        assert!(tokens.contains(&(TokenKind::Scalar, "two".to_string())));
    }

    #[test]
    fn test_dash_indent_bump() {
        let mut tokenizer = Tokenizer::new(Options::default());
        tokenizer.write("- a: 1\n");
        let tokens = tokenizer.finalize();
        let dash = tokens.iter().find(|t| t.kind == TokenKind::Dash).unwrap();
        let key = tokens.iter().find(|t| t.kind == TokenKind::Key).unwrap();
        assert_eq!(dash.indent, 0);
        assert_eq!(key.indent, 1);
    }

    #[test]
    fn test_nested_dash() {
        let tokens = lex("- - a\n");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Dash,
                TokenKind::Dash,
                TokenKind::Scalar,
                TokenKind::Newline,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_lone_dash_is_scalar() {
        let tokens = lex("-\n");
        assert_eq!(tokens[0], (TokenKind::Scalar, "-".to_string()));
        let tokens = lex("-x\n");
        assert_eq!(tokens[0], (TokenKind::Scalar, "-x".to_string()));
    }

    #[test]
    fn test_colon_in_bareword() {
        let tokens = lex("url: http://example.com/a\n");
        assert!(tokens.contains(&(TokenKind::Scalar, "http://example.com/a".to_string())));
    }

    #[test]
    fn test_value_with_inner_key_colon() {
        // A key-terminating colon inside a value run splits the run; the
        // grammar has no way to tell it apart from a key.
        let tokens = lex("msg: hello: world\n");
        assert_eq!(
            tokens.iter().filter(|(k, _)| *k == TokenKind::Key).count(),
            2
        );
    }

    #[test]
    fn test_quoted_escapes() {
        let tokens = lex("a: \"x\\ny\"\n");
        assert!(tokens.contains(&(TokenKind::Quoted, "x\ny".to_string())));
        let tokens = lex("a: 'it\\'s'\n");
        assert!(tokens.contains(&(TokenKind::Quoted, "it's".to_string())));
        // Unknown escape passes the character through.
        let tokens = lex("a: \"x\\qy\"\n");
        assert!(tokens.contains(&(TokenKind::Quoted, "xqy".to_string())));
    }

    #[test]
    fn test_unterminated_quote_stops_at_newline() {
        let mut tokenizer = Tokenizer::new(Options::default());
        tokenizer.write("a: \"oops\nb: 2\n");
        let mut tokens = Vec::new();
        while let Some(t) = tokenizer.next() {
            tokens.push((t.kind, t.text));
        }
        assert!(tokens.contains(&(TokenKind::Quoted, "oops".to_string())));
        assert!(tokens.contains(&(TokenKind::Key, "b".to_string())));
        assert_eq!(tokenizer.diagnostics().len(), 1);
    }

    #[test]
    fn test_comment_consumed_by_default() {
        let tokens = lex("a: 1 # trailing\n# full line\nb: 2\n");
        assert!(!kinds(&tokens).contains(&TokenKind::Comment));
        assert!(tokens.contains(&(TokenKind::Scalar, "1".to_string())));
    }

    #[test]
    fn test_comment_preserved() {
        let opts = Options::default().with_preserve_comments(true);
        let tokens = lex_with("a: 1 # trailing\n", opts);
        assert!(tokens.contains(&(TokenKind::Comment, "trailing".to_string())));
    }

    #[test]
    fn test_comment_only_line_keeps_indent_stack() {
        let tokens = lex("a:\n  b: 1\n# comment at column zero\n  c: 2\n");
        // The comment line must not dedent: b and c stay siblings.
        let dedents_before_c = kinds(&tokens)
            .iter()
            .take_while(|k| **k != TokenKind::Eof)
            .filter(|k| **k == TokenKind::Dedent)
            .count();
        assert_eq!(dedents_before_c, 1, "only the final dedent expected");
    }

    #[test]
    fn test_blank_line_no_indent_change() {
        let tokens = lex("a:\n  b: 1\n\n  c: 2\n");
        let ks = kinds(&tokens);
        let interior: Vec<_> = ks
            .iter()
            .filter(|k| **k == TokenKind::Indent || **k == TokenKind::Dedent)
            .collect();
        // One indent in, one dedent out at finalize.
        assert_eq!(interior.len(), 2);
    }

    #[test]
    fn test_block_scalar() {
        let tokens = lex("description: |\n  line one\n  line two\nnext: end\n");
        assert!(tokens.contains(&(TokenKind::Quoted, "line one\nline two".to_string())));
        assert!(tokens.contains(&(TokenKind::Key, "next".to_string())));
    }

    #[test]
    fn test_block_scalar_preserves_deeper_indent() {
        let tokens = lex("d: |\n  a\n    b\nx: 1\n");
        assert!(tokens.contains(&(TokenKind::Quoted, "a\n  b".to_string())));
    }

    #[test]
    fn test_block_scalar_zero_indent_is_empty() {
        let tokens = lex("d: |\nnext: 1\n");
        assert!(tokens.contains(&(TokenKind::Quoted, "".to_string())));
        assert!(tokens.contains(&(TokenKind::Key, "next".to_string())));
    }

    #[test]
    fn test_block_scalar_at_eof() {
        let tokens = lex("d: |\n  tail");
        assert!(tokens.contains(&(TokenKind::Quoted, "tail".to_string())));
    }

    #[test]
    fn test_pipe_not_after_colon_is_scalar() {
        let tokens = lex("- |x\n");
        assert!(tokens.contains(&(TokenKind::Scalar, "|x".to_string())));
    }

    #[test]
    fn test_inline_flow() {
        let tokens = lex("a: {x: 1, y: [2, 3]}\n");
        assert!(tokens.contains(&(TokenKind::Scalar, "{x: 1, y: [2, 3]}".to_string())));
        let tokens = lex("a: [1, {b: 2}]\n");
        assert!(tokens.contains(&(TokenKind::Scalar, "[1, {b: 2}]".to_string())));
    }

    #[test]
    fn test_inline_flow_unterminated_stops_at_newline() {
        let tokens = lex("a: {x: 1\nb: 2\n");
        assert!(tokens.contains(&(TokenKind::Scalar, "{x: 1".to_string())));
        assert!(tokens.contains(&(TokenKind::Key, "b".to_string())));
    }

    #[test]
    fn test_streaming_rewind_bareword() {
        let mut tokenizer = Tokenizer::new(Options::default());
        tokenizer.write("inte");
        assert_eq!(tokenizer.next(), None);
        tokenizer.write("nt: tool\n");
        let t = tokenizer.next().unwrap();
        assert_eq!((t.kind, t.text.as_str()), (TokenKind::Key, "intent"));
    }

    #[test]
    fn test_streaming_rewind_trailing_colon() {
        // `a:` could still become `a:b`, so it is withheld.
        let mut tokenizer = Tokenizer::new(Options::default());
        tokenizer.write("a:");
        assert_eq!(tokenizer.next(), None);
        tokenizer.write("b\n");
        let t = tokenizer.next().unwrap();
        assert_eq!((t.kind, t.text.as_str()), (TokenKind::Scalar, "a:b"));
    }

    #[test]
    fn test_streaming_rewind_quoted() {
        let mut tokenizer = Tokenizer::new(Options::default());
        tokenizer.write("a: \"par");
        // Key and colon resolve; the open quote is withheld.
        assert_eq!(tokenizer.next().unwrap().kind, TokenKind::Key);
        assert_eq!(tokenizer.next().unwrap().kind, TokenKind::Colon);
        assert_eq!(tokenizer.next(), None);
        tokenizer.write("tial\"\n");
        let t = tokenizer.next().unwrap();
        assert_eq!((t.kind, t.text.as_str()), (TokenKind::Quoted, "partial"));
    }

    #[test]
    fn test_streaming_chunked_matches_whole() {
        let source = "a: 1\nb:\n  - x\n  - \"y z\"\nc: |\n  block\n";
        let whole = lex(source);
        for split in 1..source.len() {
            if !source.is_char_boundary(split) {
                continue;
            }
            let mut tokenizer = Tokenizer::new(Options::default());
            let mut tokens = Vec::new();
            tokenizer.write(&source[..split]);
            while let Some(t) = tokenizer.next() {
                tokens.push((t.kind, t.text));
            }
            tokenizer.write(&source[split..]);
            while let Some(t) = tokenizer.next() {
                tokens.push((t.kind, t.text));
            }
            for t in tokenizer.finalize() {
                tokens.push((t.kind, t.text));
            }
            assert_eq!(tokens, whole, "split at byte {}", split);
        }
    }

    #[test]
    fn test_tab_indentation_warns() {
        let tokens = lex("a:\n\tb: 1\n");
        assert!(kinds(&tokens).contains(&TokenKind::Indent));

        let mut tokenizer = Tokenizer::new(Options::default());
        tokenizer.write("a:\n\tb: 1\n");
        tokenizer.finalize();
        assert!(tokenizer
            .diagnostics()
            .iter()
            .any(|d| d.message.contains("tab")));

        let mut tokenizer = Tokenizer::new(Options::default().with_allow_tabs(true));
        tokenizer.write("a:\n\tb: 1\n");
        tokenizer.finalize();
        assert!(tokenizer.diagnostics().is_empty());
    }

    #[test]
    fn test_positions() {
        let mut tokenizer = Tokenizer::new(Options::default());
        tokenizer.write("a: 1\n  b: 2\n");
        let mut tokens = Vec::new();
        while let Some(t) = tokenizer.next() {
            tokens.push(t);
        }
        let a = &tokens[0];
        assert_eq!((a.pos.line, a.pos.column, a.pos.offset), (1, 1, 0));
        let one = tokens.iter().find(|t| t.text == "1").unwrap();
        assert_eq!((one.pos.line, one.pos.column, one.pos.offset), (1, 4, 3));
        let b = tokens.iter().find(|t| t.text == "b").unwrap();
        assert_eq!((b.pos.line, b.pos.column, b.pos.offset), (2, 3, 7));
    }

    #[test]
    fn test_reset() {
        let mut tokenizer = Tokenizer::new(Options::default());
        tokenizer.write("a:\n  b: 1\n");
        while tokenizer.next().is_some() {}
        tokenizer.reset();
        tokenizer.write("x: 2\n");
        let t = tokenizer.next().unwrap();
        assert_eq!((t.kind, t.text.as_str()), (TokenKind::Key, "x"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(lex(""), vec![(TokenKind::Eof, String::new())]);
    }

    #[test]
    fn test_whitespace_only_input() {
        let tokens = lex("   \n\n  ");
        assert_eq!(*kinds(&tokens).last().unwrap(), TokenKind::Eof);
        assert!(!kinds(&tokens).contains(&TokenKind::Indent));
    }

    #[test]
    fn test_crlf() {
        let tokens = lex("a: 1\r\nb: 2\r\n");
        assert!(tokens.contains(&(TokenKind::Scalar, "1".to_string())));
        assert!(tokens.contains(&(TokenKind::Key, "b".to_string())));
    }
}
