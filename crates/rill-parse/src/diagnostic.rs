//! Parse diagnostics and their rendering.

use std::fmt;

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::Position;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    /// Informational note.
    Info,
    /// Suspicious but recoverable.
    Warning,
    /// Structurally wrong; the tree is still best-effort usable.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A recorded parse problem.
///
/// Diagnostics are values, never panics: the tokenizer and parser push them
/// onto a list and keep going, so any well-formed prefix of the input still
/// yields a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    /// Human-readable description.
    pub message: String,
    /// Severity class.
    pub severity: Severity,
    /// Where the problem was noticed.
    pub pos: Position,
    /// Optional source excerpt or hint.
    pub context: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(message: impl Into<String>, pos: Position) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
            pos,
            context: None,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>, pos: Position) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Warning,
            pos,
            context: None,
        }
    }

    /// Attach a context string.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Render this diagnostic with ariadne.
    ///
    /// Returns a formatted report with source context, suitable for
    /// printing to a terminal.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    /// Write the ariadne report to a writer.
    pub fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, writer: W) {
        let end = (self.pos.offset + 1).min(source.len().max(1));
        let range = self.pos.offset.min(end - 1)..end;

        let kind = match self.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
            Severity::Info => ReportKind::Advice,
        };
        let color = match self.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
            Severity::Info => Color::Blue,
        };

        let mut report = Report::build(kind, (filename, range.clone()))
            .with_message(&self.message)
            .with_label(
                Label::new((filename, range))
                    .with_message(&self.message)
                    .with_color(color),
            );
        if let Some(context) = &self.context {
            report = report.with_help(context);
        }
        let _ = report
            .finish()
            .write((filename, Source::from(source)), writer);
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.severity, self.message, self.pos)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_display() {
        let diag = Diagnostic::warning("tab in indentation", Position::new(3, 1, 14));
        assert_eq!(format!("{}", diag), "warning: tab in indentation at 3:1");
    }

    #[test]
    fn test_render_contains_message() {
        let source = "a: 1\nb 2\n";
        let diag = Diagnostic::error("value without key", Position::new(2, 1, 5));
        let rendered = diag.render("test.rill", source);
        assert!(rendered.contains("value without key"));
    }
}
