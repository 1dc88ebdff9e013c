//! Noise preprocessor for raw LLM responses.
//!
//! Model output often wraps the document in conversational preamble or a
//! fenced code block. [`extract_payload`] recovers the inner text: a fenced
//! block tagged `yaml`, `yml`, or nothing wins; otherwise leading and
//! trailing lines are trimmed up to the first and last line that look like
//! a `key:` entry or a `- ` sequence item.

use std::sync::OnceLock;

use regex::Regex;

/// Matches a line that plausibly starts document content: a sequence dash
/// or a key-colon entry.
fn content_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // A key is a colon-terminated run without spaces, so prose that
        // happens to end in a colon ("The steps:") does not count.
        Regex::new(r#"^[ \t]*(?:-[ \t]|-$|"[^"]*"[ \t]*:|[^\s:#][^\s:]*:(?:[ \t]|$))"#).unwrap()
    })
}

/// Extract the document payload from a raw response.
pub fn extract_payload(text: &str) -> &str {
    if let Some(inner) = fenced_block(text) {
        return inner.trim();
    }
    trim_to_content_lines(text)
}

/// The content of the first fence tagged `yaml`, `yml`, or untagged.
fn fenced_block(text: &str) -> Option<&str> {
    let mut offset = 0;
    let mut open: Option<usize> = None;
    let mut wanted = false;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if let Some(tag) = trimmed.strip_prefix("```") {
            match open {
                None => {
                    open = Some(offset + line.len());
                    wanted = matches!(tag.trim(), "" | "yaml" | "yml");
                }
                Some(start) => {
                    if wanted {
                        return Some(&text[start..offset]);
                    }
                    open = None;
                }
            }
        }
        offset += line.len();
    }

    // An unclosed wanted fence runs to the end of the text.
    match open {
        Some(start) if wanted => Some(&text[start..]),
        _ => None,
    }
}

/// Trim leading and trailing lines up to the first and last content line.
fn trim_to_content_lines(text: &str) -> &str {
    let re = content_line_re();
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if re.is_match(line.trim_end_matches(['\n', '\r'])) {
            spans.push((offset, offset + line.len()));
        }
        offset += line.len();
    }
    match (spans.first(), spans.last()) {
        (Some(&(first, _)), Some(&(_, last))) => text[first..last].trim_end(),
        _ => text.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_yaml_block() {
        let response = "Sure, here is the plan:\n```yaml\nintent:\n  type: search\n```\nLet me know!";
        assert_eq!(extract_payload(response), "intent:\n  type: search");
    }

    #[test]
    fn test_untagged_fence() {
        let response = "```\na: 1\n```\n";
        assert_eq!(extract_payload(response), "a: 1");
    }

    #[test]
    fn test_non_yaml_fence_is_skipped() {
        // A json fence does not win; the heuristic falls back to the lines.
        let response = "```json\n{\"x\": 1}\n```\na: 1\n";
        assert_eq!(extract_payload(response), "a: 1");
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let response = "```yaml\na: 1\nb: 2";
        assert_eq!(extract_payload(response), "a: 1\nb: 2");
    }

    #[test]
    fn test_prose_trimmed_around_entries() {
        let response = "Here is what I will do.\n\nintent:\n  type: search\n  q: rust\n\nHope this helps!";
        assert_eq!(
            extract_payload(response),
            "intent:\n  type: search\n  q: rust"
        );
    }

    #[test]
    fn test_dash_lines_count_as_content() {
        let response = "The steps:\n- fetch\n- parse\nDone.";
        assert_eq!(extract_payload(response), "- fetch\n- parse");
    }

    #[test]
    fn test_no_content_lines_trims_whole() {
        assert_eq!(extract_payload("  just prose  "), "just prose");
    }

    #[test]
    fn test_plain_document_untouched() {
        let doc = "a: 1\nb:\n  c: 2";
        assert_eq!(extract_payload(doc), doc);
    }
}
