//! Total accessors over raw server records.
//!
//! Every accessor takes an ordered list of candidate keys and returns the first usable value.
//! None of them fail: a missing key, a `null`, or a value of the wrong shape is simply skipped.

use flow_types::canonical_tag;
use serde_json::{Map, Value};

/// A raw record as returned by the remote service.
pub type Record = Map<String, Value>;

/// Returns the value as a record, if it is a JSON object.
pub fn as_record(value: &Value) -> Option<&Record> {
    value.as_object()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First non-blank string (or number rendered as text) among `keys`.
pub fn text(record: &Record, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| record.get(*key).and_then(scalar_text))
}

/// Like [`text`], but defaults to an empty string.
pub fn text_or_empty(record: &Record, keys: &[&str]) -> String {
    text(record, keys).unwrap_or_default()
}

/// Enum-like value folded to its canonical (trimmed, uppercase) form; empty when absent.
pub fn tag(record: &Record, keys: &[&str]) -> String {
    text(record, keys)
        .map(|value| canonical_tag(&value))
        .unwrap_or_default()
}

/// Enum-like value folded to trimmed lowercase; empty when absent.
pub fn lower_tag(record: &Record, keys: &[&str]) -> String {
    text(record, keys)
        .map(|value| value.to_lowercase())
        .unwrap_or_default()
}

fn scalar_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// First numeric (or numeric-string) value among `keys`.
pub fn number(record: &Record, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| record.get(*key).and_then(scalar_number))
}

/// First whole-number value among `keys`. Fractional values are skipped.
pub fn integer(record: &Record, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| {
        let value = record.get(*key)?;
        if let Some(n) = value.as_i64() {
            return Some(n);
        }
        scalar_number(value)
            .filter(|n| n.fract() == 0.0 && n.abs() < i64::MAX as f64)
            .map(|n| n as i64)
    })
}

/// First boolean-like value among `keys`, read the same way payload contracts read them.
pub fn flag(record: &Record, keys: &[&str]) -> Option<bool> {
    keys.iter()
        .find_map(|key| record.get(*key).and_then(flow_contracts::parse_bool_like))
}

/// First nested object among `keys`.
pub fn nested<'a>(record: &'a Record, keys: &[&str]) -> Option<&'a Record> {
    nested_value(record, keys).and_then(Value::as_object)
}

/// Like [`nested`], but keeps the object as a `Value` for resolvers that take one.
pub fn nested_value<'a>(record: &'a Record, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| record.get(*key).filter(|value| value.is_object()))
}

/// First array among `keys`; empty when none is present.
pub fn list<'a>(record: &'a Record, keys: &[&str]) -> &'a [Value] {
    keys.iter()
        .find_map(|key| record.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Normalises every item with `normalize`, dropping (and tracing) those that are not records.
pub fn normalize_each<T>(items: &[Value], normalize: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    items
        .iter()
        .filter_map(|item| {
            let normalized = normalize(item);
            if normalized.is_none() {
                tracing::trace!(?item, "dropping non-record item");
            }
            normalized
        })
        .collect()
}

/// A person's display name: an explicit full name, else the concatenated name parts.
pub fn person_name(record: &Record) -> Option<String> {
    if let Some(full) = text(record, &["full_name", "name", "display_name"]) {
        return Some(full);
    }

    let parts = [
        text(record, &["first_name", "given_name"]),
        text(record, &["middle_name"]),
        text(record, &["last_name", "family_name", "surname"]),
    ];
    let joined = parts.into_iter().flatten().collect::<Vec<_>>().join(" ");
    (!joined.is_empty()).then_some(joined)
}

/// Name of a related person: from a nested person record if present, else a flat text field.
pub fn related_name(record: &Record, nested_keys: &[&str], flat_keys: &[&str]) -> String {
    nested(record, nested_keys)
        .and_then(person_name)
        .or_else(|| text(record, flat_keys))
        .unwrap_or_default()
}
