//! Scalar type coercion.
//!
//! Coercion is total and deterministic: every unquoted scalar maps to
//! exactly one of null, bool, integer, float, array, object, or the
//! original string. Quoted scalars (and literal blocks) always stay
//! strings.

use crate::Value;

/// Largest integer magnitude that survives a round-trip through a double.
const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Whether `value` fits the safe-integer range.
pub(crate) fn in_safe_range(value: i64) -> bool {
    (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&value)
}

/// Coerce a scalar's text to a typed value.
pub fn coerce_scalar(text: &str, quoted: bool) -> Value {
    if quoted {
        return Value::String(text.to_string());
    }
    let trimmed = text.trim();
    match trimmed {
        "null" | "Null" | "NULL" | "~" => return Value::Null,
        "true" | "True" | "TRUE" => return Value::Bool(true),
        "false" | "False" | "FALSE" => return Value::Bool(false),
        _ => {}
    }

    if is_integer_literal(trimmed) {
        if let Ok(i) = trimmed.parse::<i64>() {
            if in_safe_range(i) {
                return Value::Int(i);
            }
        }
        // An integer literal beyond the safe range is carried as a double.
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return Value::Float(f);
            }
        }
    }

    if is_float_literal(trimmed) || is_scientific_literal(trimmed) {
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return Value::Float(f);
            }
        }
    }

    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
            if json.is_array() {
                return Value::from_json(json);
            }
        }
    }

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
            if json.is_object() {
                return Value::from_json(json);
            }
        }
    }

    Value::String(text.to_string())
}

/// `-?\d+`
fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// `-?\d+\.\d+`
fn is_float_literal(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    let mut parts = s.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let frac = match parts.next() {
        Some(frac) => frac,
        None => return false,
    };
    !whole.is_empty()
        && !frac.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
}

/// `-?\d+\.?\d*[eE][+-]?\d+`
fn is_scientific_literal(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    let mut parts = s.splitn(2, |c| c == 'e' || c == 'E');
    let mantissa = parts.next().unwrap_or("");
    let exponent = match parts.next() {
        Some(exponent) => exponent,
        None => return false,
    };

    let (whole, frac) = match mantissa.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (mantissa, ""),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let exponent = exponent
        .strip_prefix('+')
        .or_else(|| exponent.strip_prefix('-'))
        .unwrap_or(exponent);
    !exponent.is_empty() && exponent.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Object;

    #[test]
    fn test_null_variants() {
        for text in ["null", "Null", "NULL", "~"] {
            assert_eq!(coerce_scalar(text, false), Value::Null, "{}", text);
        }
    }

    #[test]
    fn test_bool_variants() {
        for text in ["true", "True", "TRUE"] {
            assert_eq!(coerce_scalar(text, false), Value::Bool(true));
        }
        for text in ["false", "False", "FALSE"] {
            assert_eq!(coerce_scalar(text, false), Value::Bool(false));
        }
        // Other casings are strings.
        assert_eq!(
            coerce_scalar("tRue", false),
            Value::String("tRue".to_string())
        );
    }

    #[test]
    fn test_integers() {
        assert_eq!(coerce_scalar("42", false), Value::Int(42));
        assert_eq!(coerce_scalar("-17", false), Value::Int(-17));
        assert_eq!(coerce_scalar("0", false), Value::Int(0));
        assert_eq!(
            coerce_scalar("9007199254740991", false),
            Value::Int(9007199254740991)
        );
        // Beyond the safe range, precision yields to a double.
        assert_eq!(
            coerce_scalar("9007199254740993", false),
            Value::Float(9007199254740992.0)
        );
    }

    #[test]
    fn test_floats() {
        assert_eq!(coerce_scalar("19.99", false), Value::Float(19.99));
        assert_eq!(coerce_scalar("-0.5", false), Value::Float(-0.5));
        // A bare trailing dot is not a float literal.
        assert_eq!(coerce_scalar("1.", false), Value::String("1.".to_string()));
        assert_eq!(coerce_scalar(".5", false), Value::String(".5".to_string()));
    }

    #[test]
    fn test_scientific() {
        assert_eq!(coerce_scalar("1e3", false), Value::Float(1000.0));
        assert_eq!(coerce_scalar("-2.5e-2", false), Value::Float(-0.025));
        assert_eq!(coerce_scalar("3.E2", false), Value::Float(300.0));
        assert_eq!(coerce_scalar("1e", false), Value::String("1e".to_string()));
        assert_eq!(
            coerce_scalar("e10", false),
            Value::String("e10".to_string())
        );
        // Overflowing exponents stay strings rather than infinities.
        assert_eq!(
            coerce_scalar("1e999", false),
            Value::String("1e999".to_string())
        );
    }

    #[test]
    fn test_quoted_bypasses_everything() {
        assert_eq!(coerce_scalar("42", true), Value::String("42".to_string()));
        assert_eq!(
            coerce_scalar("null", true),
            Value::String("null".to_string())
        );
        assert_eq!(coerce_scalar("", true), Value::String(String::new()));
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert_eq!(coerce_scalar("", false), Value::String(String::new()));
        // The fallback keeps the original untrimmed text.
        assert_eq!(
            coerce_scalar("   ", false),
            Value::String("   ".to_string())
        );
    }

    #[test]
    fn test_inline_array() {
        assert_eq!(
            coerce_scalar("[1, 2, 3]", false),
            Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        // Invalid JSON falls back to the string.
        assert_eq!(
            coerce_scalar("[1, 2,]", false),
            Value::String("[1, 2,]".to_string())
        );
    }

    #[test]
    fn test_inline_object() {
        let mut expected = Object::new();
        expected.insert("a", Value::Int(1));
        expected.insert("b", Value::String("x".to_string()));
        assert_eq!(
            coerce_scalar(r#"{"a": 1, "b": "x"}"#, false),
            Value::Object(expected)
        );
        assert_eq!(
            coerce_scalar("{a: 1}", false),
            Value::String("{a: 1}".to_string())
        );
    }

    #[test]
    fn test_fallback_string() {
        assert_eq!(
            coerce_scalar("hello world", false),
            Value::String("hello world".to_string())
        );
        assert_eq!(
            coerce_scalar("12abc", false),
            Value::String("12abc".to_string())
        );
    }
}
