//! Raw value coercion into declared scalar kinds and raw arrays.

use crate::core::{MapError, Record, Result, ScalarKind, Value};
use crate::engine::config::ArrayMergePolicy;
use crate::model::FieldValue;

pub(crate) fn coerce_scalar(
    field: &str,
    kind: ScalarKind,
    raw: &Value,
    strict: bool,
) -> Result<FieldValue> {
    let coerced = match kind {
        ScalarKind::Int => to_int(raw, strict).map(FieldValue::Integer),
        ScalarKind::Float => to_float(raw, strict).map(FieldValue::Float),
        ScalarKind::String => to_text(raw).map(FieldValue::Text),
        ScalarKind::Bool => to_bool(raw, strict).map(FieldValue::Boolean),
    };

    coerced.ok_or_else(|| MapError::Coercion {
        field: field.to_string(),
        expected: kind.name(),
        found: raw.type_name(),
    })
}

fn to_int(raw: &Value, strict: bool) -> Option<i64> {
    match raw {
        Value::Null => Some(0),
        Value::Boolean(b) => Some(i64::from(*b)),
        Value::Integer(i) => Some(*i),
        // whole and inside [-2^63, 2^63); NaN and infinities fail the range check
        Value::Float(f) if strict => {
            (f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64).then_some(*f as i64)
        }
        // saturating cast; NaN becomes 0
        Value::Float(f) => Some(f.trunc() as i64),
        Value::Text(text) if strict => text.trim().parse::<i64>().ok(),
        Value::Text(text) => Some(int_prefix(text)),
        Value::List(_) | Value::Record(_) if strict => None,
        Value::List(items) => Some(i64::from(!items.is_empty())),
        Value::Record(record) => Some(i64::from(!record.is_empty())),
    }
}

fn to_float(raw: &Value, strict: bool) -> Option<f64> {
    match raw {
        Value::Null => Some(0.0),
        Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Text(text) if strict => text.trim().parse::<f64>().ok(),
        Value::Text(text) => Some(float_prefix(text)),
        Value::List(_) | Value::Record(_) if strict => None,
        Value::List(items) => Some(if items.is_empty() { 0.0 } else { 1.0 }),
        Value::Record(record) => Some(if record.is_empty() { 0.0 } else { 1.0 }),
    }
}

fn to_text(raw: &Value) -> Option<String> {
    match raw {
        Value::Null => Some(String::new()),
        Value::Boolean(true) => Some("1".to_string()),
        Value::Boolean(false) => Some(String::new()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Text(text) => Some(text.clone()),
        Value::List(_) | Value::Record(_) => None,
    }
}

fn to_bool(raw: &Value, strict: bool) -> Option<bool> {
    if strict {
        return match raw {
            Value::Null => Some(false),
            Value::Boolean(b) => Some(*b),
            Value::Integer(0) => Some(false),
            Value::Integer(1) => Some(true),
            Value::Text(text) => match text.trim() {
                "" | "0" | "false" => Some(false),
                "1" | "true" => Some(true),
                _ => None,
            },
            _ => None,
        };
    }

    Some(match raw {
        Value::Null => false,
        Value::Boolean(b) => *b,
        Value::Integer(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::Text(text) => !(text.is_empty() || text == "0"),
        Value::List(items) => !items.is_empty(),
        Value::Record(record) => !record.is_empty(),
    })
}

/// Length of the leading `[+-]digits` run after whitespace.
fn numeric_prefix_len(text: &str, allow_fraction: bool) -> usize {
    let bytes = text.as_bytes();
    let mut idx = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        idx += 1;
    }

    let digits_start = idx;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    let mut digits = idx - digits_start;

    if allow_fraction && bytes.get(idx) == Some(&b'.') {
        let frac_start = idx + 1;
        let mut end = frac_start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if digits > 0 || end > frac_start {
            digits += end - frac_start;
            idx = end;
        }
    }

    if digits == 0 {
        return 0;
    }

    if allow_fraction && matches!(bytes.get(idx), Some(b'e' | b'E')) {
        let mut end = idx + 1;
        if matches!(bytes.get(end), Some(b'+' | b'-')) {
            end += 1;
        }
        let exp_start = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end > exp_start {
            idx = end;
        }
    }

    idx
}

fn int_prefix(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let len = numeric_prefix_len(trimmed, false);
    let digits = &trimmed[..len];
    match digits.parse::<i64>() {
        Ok(value) => value,
        // out of range: saturate in the direction of the sign
        Err(_) if len > 0 && digits.starts_with('-') => i64::MIN,
        Err(_) if len > 0 => i64::MAX,
        Err(_) => 0,
    }
}

fn float_prefix(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let len = numeric_prefix_len(trimmed, true);
    trimmed[..len].parse::<f64>().unwrap_or(0.0)
}

/// Raw array input as an array value: null is empty, a scalar is wrapped.
pub(crate) fn coerce_array(raw: &Value) -> Value {
    match raw {
        Value::Null => Value::List(Vec::new()),
        Value::List(_) | Value::Record(_) => raw.clone(),
        scalar => Value::List(vec![scalar.clone()]),
    }
}

/// Combines the held array with the incoming one under `policy`.
pub(crate) fn merge_array(policy: ArrayMergePolicy, current: Option<Value>, incoming: Value) -> Value {
    let current = match (policy, current) {
        (ArrayMergePolicy::Overlay, Some(current @ (Value::List(_) | Value::Record(_)))) => current,
        _ => return incoming,
    };

    match (current, incoming) {
        (Value::List(mut old), Value::List(new)) => {
            old.extend(new);
            Value::List(old)
        }
        (old, new) => {
            let mut merged = into_record(old);
            merged.overlay(into_record(new));
            Value::Record(merged)
        }
    }
}

fn into_record(value: Value) -> Record {
    match value {
        Value::Record(record) => record,
        Value::List(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| (idx.to_string(), item))
            .collect(),
        other => std::iter::once(("0".to_string(), other)).collect(),
    }
}

/// Array value in the shape the engine hands to the field.
pub(crate) fn array_field_value(value: Value) -> FieldValue {
    match value {
        Value::Record(record) => FieldValue::Record(record),
        Value::List(items) => FieldValue::List(items),
        other => FieldValue::List(vec![other]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    fn int(raw: impl Into<Value>) -> i64 {
        match coerce_scalar("f", ScalarKind::Int, &raw.into(), false).unwrap() {
            FieldValue::Integer(i) => i,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_int_from_text_uses_leading_digits() {
        assert_eq!(int("12"), 12);
        assert_eq!(int("  -7 apples"), -7);
        assert_eq!(int("12abc"), 12);
        assert_eq!(int("12.9"), 12);
        assert_eq!(int("abc"), 0);
        assert_eq!(int(Value::Null), 0);
        assert_eq!(int(3.99), 3);
        assert_eq!(int(true), 1);
    }

    #[test]
    fn test_strict_int_requires_whole_string() {
        let err = coerce_scalar("age", ScalarKind::Int, &Value::from("12abc"), true).unwrap_err();
        assert_eq!(
            err,
            MapError::Coercion {
                field: "age".into(),
                expected: "int",
                found: "string",
            }
        );
        assert!(coerce_scalar("age", ScalarKind::Int, &Value::from("12"), true).is_ok());
    }

    #[test]
    fn test_strict_int_rejects_out_of_range_floats() {
        for raw in [1e300, -1e300, 9.3e18, f64::INFINITY, f64::NAN, 2.5] {
            assert!(
                coerce_scalar("n", ScalarKind::Int, &Value::Float(raw), true).is_err(),
                "{} accepted",
                raw
            );
        }
        let whole = coerce_scalar("n", ScalarKind::Int, &Value::Float(-4096.0), true).unwrap();
        assert!(matches!(whole, FieldValue::Integer(-4096)));
    }

    #[test]
    fn test_float_prefix() {
        assert_eq!(float_prefix("3.5kg"), 3.5);
        assert_eq!(float_prefix("1e3x"), 1000.0);
        assert_eq!(float_prefix(".5"), 0.5);
        assert_eq!(float_prefix("e5"), 0.0);
    }

    #[test]
    fn test_text_coercion() {
        let text = |raw: Value| match coerce_scalar("f", ScalarKind::String, &raw, false) {
            Ok(FieldValue::Text(s)) => Some(s),
            _ => None,
        };
        assert_eq!(text(Value::Integer(12)), Some("12".to_string()));
        assert_eq!(text(Value::Float(1.0)), Some("1".to_string()));
        assert_eq!(text(Value::Boolean(true)), Some("1".to_string()));
        assert_eq!(text(Value::Boolean(false)), Some(String::new()));
        assert_eq!(text(Value::List(vec![])), None);
    }

    #[test]
    fn test_bool_falsy_values() {
        for raw in [
            Value::Null,
            Value::Boolean(false),
            Value::Integer(0),
            Value::Float(0.0),
            Value::from(""),
            Value::from("0"),
            Value::List(vec![]),
            Value::Record(Record::new()),
        ] {
            assert_eq!(to_bool(&raw, false), Some(false), "{:?}", raw);
        }
        assert_eq!(to_bool(&Value::from("false"), false), Some(true));
        assert_eq!(to_bool(&Value::from("yes"), true), None);
    }

    #[test]
    fn test_array_replace_and_overlay() {
        let old = Value::Record(record! { "a" => 1, "b" => 2 });
        let new = Value::Record(record! { "a" => "mello", "c" => "hoo" });

        assert_eq!(
            merge_array(ArrayMergePolicy::Replace, Some(old.clone()), new.clone()),
            new
        );
        assert_eq!(
            merge_array(ArrayMergePolicy::Overlay, Some(old), new),
            Value::Record(record! { "a" => "mello", "b" => 2, "c" => "hoo" })
        );

        let appended = merge_array(
            ArrayMergePolicy::Overlay,
            Some(Value::List(vec![Value::from(1)])),
            Value::List(vec![Value::from(2)]),
        );
        assert_eq!(appended, Value::List(vec![Value::from(1), Value::from(2)]));
    }

    #[test]
    fn test_scalar_wrapped_as_array() {
        assert_eq!(coerce_array(&Value::from(5)), Value::List(vec![Value::from(5)]));
        assert_eq!(coerce_array(&Value::Null), Value::List(vec![]));
    }
}
