//! Parser configuration.

/// Configuration shared by the tokenizer, parser, and streaming facade.
///
/// Options are fixed at construction time; changing behavior mid-stream is
/// not supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Spaces per indentation level. Must be at least 1.
    pub indent_size: usize,
    /// Accept tabs in indentation without a diagnostic. A tab always counts
    /// as `indent_size` spaces of width; this flag only controls whether a
    /// warning is recorded.
    pub allow_tabs: bool,
    /// Emit `Comment` tokens (and `Line` events) instead of consuming
    /// comments silently.
    pub preserve_comments: bool,
    /// Promote warnings to errors in the validate-only API.
    pub strict: bool,
    /// Root-mapping keys treated as intent containers.
    pub intent_keys: Vec<String>,
}

impl Options {
    /// Set the indent size (clamped to at least 1).
    pub fn with_indent_size(mut self, size: usize) -> Self {
        self.indent_size = size.max(1);
        self
    }

    /// Accept tabs in indentation.
    pub fn with_allow_tabs(mut self, allow: bool) -> Self {
        self.allow_tabs = allow;
        self
    }

    /// Emit comment tokens.
    pub fn with_preserve_comments(mut self, preserve: bool) -> Self {
        self.preserve_comments = preserve;
        self
    }

    /// Enable strict validation.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Replace the intent key set.
    pub fn with_intent_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.intent_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `key` names an intent container.
    pub fn is_intent_key(&self, key: &str) -> bool {
        self.intent_keys.iter().any(|k| k == key)
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            indent_size: 2,
            allow_tabs: false,
            preserve_comments: false,
            strict: false,
            intent_keys: vec!["intent".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = Options::default();
        assert_eq!(opts.indent_size, 2);
        assert!(!opts.allow_tabs);
        assert!(!opts.preserve_comments);
        assert!(opts.is_intent_key("intent"));
        assert!(!opts.is_intent_key("action"));
    }

    #[test]
    fn test_builders() {
        let opts = Options::default()
            .with_indent_size(0)
            .with_intent_keys(["action", "intent"]);
        assert_eq!(opts.indent_size, 1);
        assert!(opts.is_intent_key("action"));
        assert!(opts.is_intent_key("intent"));
    }
}
