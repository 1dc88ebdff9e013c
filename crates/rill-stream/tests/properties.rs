//! Property-based tests.
//!
//! These verify invariants that must hold for ANY input, not just crafted
//! examples: the parser never panics, and feeding a document in chunks
//! yields the same value as feeding it whole, for every partition.

use proptest::prelude::*;

use rill_ir::Value;
use rill_parse::Options;
use rill_stream::{parse_str, StreamParser};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 128,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    }
}

/// Characters that exercise every tokenizer state, structural and not.
fn doc_char() -> impl Strategy<Value = char> {
    prop::sample::select(vec![
        'a', 'b', 'k', 'x', '0', '1', '9', ':', '-', ' ', '\n', '"', '\'', '#', '|', '{', '}',
        '[', ']', '.', '~', '\t',
    ])
}

fn doc_string() -> impl Strategy<Value = String> {
    prop::collection::vec(doc_char(), 0..80).prop_map(|chars| chars.into_iter().collect())
}

fn parse_chunked(source: &str, splits: &[usize]) -> Value {
    let mut stream = StreamParser::new(Options::default());
    let mut start = 0;
    for &split in splits {
        let split = split.min(source.len());
        if split > start && source.is_char_boundary(split) {
            stream.write(&source[start..split]);
            start = split;
        }
    }
    stream.write(&source[start..]);
    stream.end().value
}

proptest! {
    #![proptest_config(config())]

    /// The pipeline must never panic, whatever bytes arrive.
    #[test]
    fn parser_never_panics(input in doc_string()) {
        let _ = parse_str(&input);
    }

    /// Arbitrary unicode input must not panic either.
    #[test]
    fn parser_never_panics_on_unicode(input in "\\PC{0,40}") {
        let _ = parse_str(&input);
    }

    /// Feeding any partition of the input produces the same value as
    /// feeding it whole.
    #[test]
    fn streaming_equivalence(
        input in doc_string(),
        mut splits in prop::collection::vec(0usize..80, 0..4),
    ) {
        splits.sort_unstable();
        let whole = parse_str(&input).value;
        let chunked = parse_chunked(&input, &splits);
        prop_assert_eq!(whole, chunked);
    }

    /// Peeking between chunks never changes the final value.
    #[test]
    fn peek_does_not_disturb_stream(
        input in doc_string(),
        split in 0usize..80,
    ) {
        let whole = parse_str(&input).value;

        let mut stream = StreamParser::new(Options::default());
        let split = split.min(input.len());
        if input.is_char_boundary(split) {
            stream.write(&input[..split]);
            let first = stream.peek().value;
            let second = stream.peek().value;
            prop_assert_eq!(first, second);
            stream.write(&input[split..]);
        } else {
            stream.write(&input);
        }
        prop_assert_eq!(stream.end().value, whole);
    }

    /// Coercion is total: every scalar lands in exactly one typed bucket,
    /// and quoting always pins a string.
    #[test]
    fn coercion_totality(text in "\\PC{0,20}") {
        let _ = rill_ir::coerce_scalar(&text, false);
        let quoted = rill_ir::coerce_scalar(&text, true);
        prop_assert_eq!(quoted, Value::String(text));
    }
}
