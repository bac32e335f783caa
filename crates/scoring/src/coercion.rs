//! Numeric coercion of message fields.
//!
//! Messages come from loosely typed producers, so numbers may arrive as JSON
//! numbers, booleans or strings. The rules follow the usual host conventions:
//! floats truncate toward zero when an integer is wanted, booleans count as
//! 0/1, and strings are trimmed and may use `_` between digits.

use liquidity_core::{Error, NumericType, Result};
use serde_json::Value;
use std::borrow::Cow;

/// Coerce `value` to an integer.
pub fn coerce_int(field: &str, value: &Value) -> Result<i64> {
    let coerced = match value {
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate_to_i64)),
        Value::String(s) => parse_int_literal(s),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    coerced.ok_or_else(|| Error::coercion(field, NumericType::Integer, value.clone()))
}

/// Coerce `value` to a float.
pub fn coerce_float(field: &str, value: &Value) -> Result<f64> {
    let coerced = match value {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float_literal(s),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    coerced.ok_or_else(|| Error::coercion(field, NumericType::Float, value.clone()))
}

fn truncate_to_i64(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let truncated = value.trunc();
    // i64::MIN is exactly representable; its negation is the first value out of range.
    let lower = i64::MIN as f64;
    if truncated < lower || truncated >= -lower {
        return None;
    }
    Some(truncated as i64)
}

fn parse_int_literal(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits = strip_digit_separators(unsigned)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    if negative {
        format!("-{}", digits).parse().ok()
    } else {
        digits.parse().ok()
    }
}

fn parse_float_literal(text: &str) -> Option<f64> {
    let digits = strip_digit_separators(text.trim())?;
    // `f64::from_str` already takes an optional sign, exponents and
    // inf/infinity/nan in any case.
    digits.parse().ok()
}

/// Remove `_` separators. Each one must sit between two digits.
fn strip_digit_separators(text: &str) -> Option<Cow<'_, str>> {
    if !text.contains('_') {
        return Some(Cow::Borrowed(text));
    }

    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'_' {
            continue;
        }
        let before = i.checked_sub(1).map(|j| bytes[j]);
        let after = bytes.get(i + 1).copied();
        let between_digits = matches!(before, Some(c) if c.is_ascii_digit())
            && matches!(after, Some(c) if c.is_ascii_digit());
        if !between_digits {
            return None;
        }
    }

    Some(Cow::Owned(text.replace('_', "")))
}
