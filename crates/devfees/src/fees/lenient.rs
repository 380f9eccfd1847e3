//! Tolerant field decoding for fee records and project parameters.
//!
//! Upstream payloads carry numbers as JSON numbers, numeric strings, currency
//! strings, or nulls. These helpers normalise all of them without failing the
//! enclosing record.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parses the leading numeric portion of `raw`, ignoring `$`, `,` and
/// surrounding whitespace. Returns `None` when no finite number can be read.
pub(crate) fn parse_float_prefix(raw: &str) -> Option<f64> {
    let stripped: String = raw.chars().filter(|c| !matches!(c, '$' | ',')).collect();
    let cleaned = stripped.trim();
    let end = cleaned
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E')))
        .unwrap_or(cleaned.len());
    let candidate = &cleaned[..end];

    (1..=candidate.len())
        .rev()
        .find_map(|len| candidate[..len].parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64().filter(|value| value.is_finite()),
        Value::String(text) => parse_float_prefix(text),
        _ => None,
    }
}

/// Non-negative quantity; anything unparseable or negative becomes `0.0`.
pub(crate) fn quantity<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(value_as_f64)
        .filter(|value| *value >= 0.0)
        .unwrap_or(0.0))
}

fn as_count(value: f64) -> Option<u32> {
    if value < 0.0 {
        return None;
    }
    Some(value.floor().min(u32::MAX as f64) as u32)
}

/// Whole count; fractional inputs are floored, invalid inputs become `0`.
pub(crate) fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(value_as_f64)
        .and_then(as_count)
        .unwrap_or(0))
}

/// Optional whole count; invalid inputs are treated as absent.
pub(crate) fn optional_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(value_as_f64).and_then(as_count))
}

/// Optional signed amount such as a rate or a clamp bound.
pub(crate) fn optional_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(value_as_f64))
}

/// Free text; numbers are rendered, null becomes empty.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    })
}

/// Boolean flag that also accepts `"true"`, `"yes"`, `1`, and friends.
pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Bool(flag)) => flag,
        Some(Value::Number(number)) => number.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Some(Value::String(text)) => parse_flag(&text),
        _ => false,
    })
}

pub(crate) fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "t" | "yes" | "y" | "1" | "recurring" | "monthly"
    )
}
