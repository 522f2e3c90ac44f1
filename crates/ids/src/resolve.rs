//! Display-id resolution.
//!
//! Resolution order for a record:
//! 1. the first non-empty human-friendly field (for example `display_id`),
//! 2. the first non-empty primary identifier field, unless it is UUID-shaped,
//! 3. nothing.
//!
//! A UUID-shaped value is never returned, even when it sits in a "friendly" field.

use crate::classify::{is_technical_identifier, is_uuid_shaped};
use serde_json::Value;

/// Candidate field names used to resolve a record's display identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdentifierFields {
    /// Human-friendly fields, highest priority first.
    pub friendly: &'static [&'static str],
    /// Primary (internal) identifier fields, highest priority first.
    pub primary: &'static [&'static str],
}

/// Candidates shared by workflow records.
pub const DEFAULT_FIELDS: IdentifierFields = IdentifierFields {
    friendly: &["display_id", "public_id", "friendly_id"],
    primary: &["id"],
};

/// Candidates for patient records, which usually carry a hospital number.
pub const PATIENT_FIELDS: IdentifierFields = IdentifierFields {
    friendly: &[
        "patient_number",
        "mrn",
        "display_id",
        "public_id",
        "friendly_id",
    ],
    primary: &["id", "patient_id"],
};

/// Resolves the identifier to show to users, using [`DEFAULT_FIELDS`].
///
/// Strings and numbers are treated as already-resolved identifiers and only go through the
/// UUID check. Anything that is neither a scalar nor an object resolves to `None`.
pub fn resolve_display_id(value: &Value) -> Option<String> {
    resolve_display_id_with(value, &DEFAULT_FIELDS)
}

/// Resolves the identifier to show to users with explicit candidate fields.
pub fn resolve_display_id_with(value: &Value, fields: &IdentifierFields) -> Option<String> {
    match value {
        Value::String(_) | Value::Number(_) => scalar_text(value).filter(|s| !is_uuid_shaped(s)),
        Value::Object(map) => {
            let friendly = fields
                .friendly
                .iter()
                .filter_map(|key| map.get(*key).and_then(scalar_text))
                .find(|candidate| !is_uuid_shaped(candidate));
            if friendly.is_some() {
                return friendly;
            }

            fields
                .primary
                .iter()
                .filter_map(|key| map.get(*key).and_then(scalar_text))
                .find(|candidate| !is_uuid_shaped(candidate))
        }
        _ => None,
    }
}

/// Resolves a display identifier, falling back to the first internal identifier present.
///
/// Snapshots must never show a blank identifier when any candidate exists, so this returns the
/// raw internal id rather than nothing. Returns an empty string only when no candidate field
/// carries a value at all.
pub fn display_id_or_internal(value: &Value, fields: &IdentifierFields) -> String {
    if let Some(resolved) = resolve_display_id_with(value, fields) {
        return resolved;
    }

    let Value::Object(map) = value else {
        return scalar_text(value).unwrap_or_default();
    };

    fields
        .primary
        .iter()
        .chain(fields.friendly.iter())
        .find_map(|key| map.get(*key).and_then(scalar_text))
        .unwrap_or_default()
}

/// Returns the identifier if the caller may see it.
///
/// Callers without elevated visibility rights never see technical identifiers; blank input is
/// always `None`.
pub fn visible_identifier(value: &str, can_view_technical: bool) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if !can_view_technical && is_technical_identifier(value) {
        return None;
    }
    Some(value.to_string())
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
