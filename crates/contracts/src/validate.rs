//! The contract engine: coerces raw input field by field and collects every violation.

use crate::schema::{Contract, FieldKind, RuleContext};
use crate::{ContractError, ContractResult, ValidationFailure, Violation};
use flow_ids::is_accepted_identifier;
use flow_types::{canonical_tag, timestamp::is_date_time, NonEmptyText, TextError};
use serde_json::{Map, Value};

/// Path reported when the payload itself is not an object.
pub const ROOT_PATH: &str = "<root>";

/// Validates `raw` against `contract`, returning the normalised payload.
///
/// Every recognised field is coerced (trimmed, uppercased, parsed, defaulted). Unknown fields are
/// dropped. Every violation is collected before failing, so the caller sees the full list rather
/// than only the first problem.
///
/// # Errors
///
/// Returns [`ContractError::Validation`] naming every offending field.
pub fn validate(contract: &Contract, raw: &Value) -> ContractResult<Map<String, Value>> {
    let mut violations = Vec::new();
    let normalised = validate_object(contract, raw, "", &mut violations);

    if violations.is_empty() {
        return Ok(normalised);
    }

    Err(ContractError::Validation(ValidationFailure {
        contract: contract.name,
        violations,
    }))
}

pub(crate) fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn validate_object(
    contract: &Contract,
    raw: &Value,
    prefix: &str,
    violations: &mut Vec<Violation>,
) -> Map<String, Value> {
    let Value::Object(input) = raw else {
        let field = if prefix.is_empty() { ROOT_PATH } else { prefix };
        violations.push(Violation::new(field, "must be an object"));
        return Map::new();
    };

    let mut out = Map::new();
    for field in contract.fields {
        let path = join_path(prefix, field.name);
        match coerce(&field.kind, input.get(field.name), &path, violations) {
            Coerced::Value(value) => {
                out.insert(field.name.to_string(), value);
            }
            Coerced::Absent => {
                if let Some(default) = field.default {
                    out.insert(field.name.to_string(), default.to_value());
                } else if field.required {
                    violations.push(Violation::new(&path, "is required"));
                }
            }
            Coerced::Invalid(reason) => violations.push(Violation::new(&path, reason)),
        }
    }

    let mut ctx = RuleContext { prefix, violations };
    for rule in contract.rules {
        (rule.check)(&mut out, &mut ctx);
    }

    out
}

enum Coerced {
    Value(Value),
    Absent,
    Invalid(String),
}

fn coerce(
    kind: &FieldKind,
    value: Option<&Value>,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Coerced {
    let value = match value {
        None | Some(Value::Null) => return Coerced::Absent,
        Some(value) => value,
    };

    match kind {
        FieldKind::RouteState(inner) => match value {
            Value::Array(items) => coerce(inner, items.first(), path, violations),
            other => coerce(inner, Some(other), path, violations),
        },
        FieldKind::Identifier => match scalar_text(value) {
            Scalar::Blank => Coerced::Absent,
            Scalar::Text(text) if is_accepted_identifier(&text) => {
                Coerced::Value(Value::String(text))
            }
            Scalar::Text(_) => invalid("must be a UUID or a friendly identifier"),
            Scalar::NotScalar => invalid("must be a string identifier"),
        },
        FieldKind::Text { max_len } => match scalar_text(value) {
            Scalar::Blank => Coerced::Absent,
            Scalar::Text(text) => match NonEmptyText::bounded(text, *max_len) {
                Ok(text) => Coerced::Value(Value::String(text.into_inner())),
                Err(TextError::TooLong { max }) => {
                    invalid(format!("must be at most {max} characters"))
                }
                Err(TextError::Empty) => Coerced::Absent,
            },
            Scalar::NotScalar => invalid("must be text"),
        },
        FieldKind::Pattern { regex, hint } => match scalar_text(value) {
            Scalar::Blank => Coerced::Absent,
            Scalar::Text(text) if regex.is_match(&text) => Coerced::Value(Value::String(text)),
            Scalar::Text(_) | Scalar::NotScalar => invalid(format!("must match {hint}")),
        },
        FieldKind::Integer { min, max } => match parse_integer(value) {
            Numeric::Blank => Coerced::Absent,
            Numeric::Invalid => invalid("must be a whole number"),
            Numeric::Parsed(n) => {
                if let Some(min) = min.filter(|min| n < *min) {
                    return invalid(format!("must be at least {min}"));
                }
                if let Some(max) = max.filter(|max| n > *max) {
                    return invalid(format!("must be at most {max}"));
                }
                Coerced::Value(Value::from(n))
            }
        },
        FieldKind::Number { min, max } => match parse_number(value) {
            Numeric::Blank => Coerced::Absent,
            Numeric::Invalid => invalid("must be a number"),
            Numeric::Parsed(n) => {
                if let Some(min) = min.filter(|min| n < *min) {
                    return invalid(format!("must be at least {min}"));
                }
                if let Some(max) = max.filter(|max| n > *max) {
                    return invalid(format!("must be at most {max}"));
                }
                Coerced::Value(Value::from(n))
            }
        },
        FieldKind::Boolean => match parse_bool_like(value) {
            Some(flag) => Coerced::Value(Value::Bool(flag)),
            None => Coerced::Absent,
        },
        FieldKind::Timestamp => match scalar_text(value) {
            Scalar::Blank => Coerced::Absent,
            Scalar::Text(text) if is_date_time(&text) => Coerced::Value(Value::String(text)),
            Scalar::Text(_) | Scalar::NotScalar => invalid("must be an ISO-8601 date-time"),
        },
        FieldKind::Enum { values } => match scalar_text(value) {
            Scalar::Blank => Coerced::Absent,
            Scalar::Text(text) => {
                let tag = canonical_tag(&text);
                if values.contains(&tag.as_str()) {
                    Coerced::Value(Value::String(tag))
                } else {
                    invalid(format!("must be one of: {}", values.join(", ")))
                }
            }
            Scalar::NotScalar => invalid(format!("must be one of: {}", values.join(", "))),
        },
        FieldKind::Rows {
            contract,
            min_items,
        } => {
            let Value::Array(items) = value else {
                return invalid("must be a list");
            };
            if items.len() < *min_items {
                return invalid(format!(
                    "must contain at least {min_items} {}",
                    if *min_items == 1 { "entry" } else { "entries" }
                ));
            }
            let rows = items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let row_path = format!("{path}[{index}]");
                    Value::Object(validate_object(contract, item, &row_path, violations))
                })
                .collect();
            Coerced::Value(Value::Array(rows))
        }
    }
}

fn invalid(reason: impl Into<String>) -> Coerced {
    Coerced::Invalid(reason.into())
}

enum Scalar {
    Blank,
    Text(String),
    NotScalar,
}

fn scalar_text(value: &Value) -> Scalar {
    match value {
        Value::String(s) if s.trim().is_empty() => Scalar::Blank,
        Value::String(s) => Scalar::Text(s.trim().to_string()),
        Value::Number(n) => Scalar::Text(n.to_string()),
        _ => Scalar::NotScalar,
    }
}

enum Numeric<T> {
    Blank,
    Parsed(T),
    Invalid,
}

fn parse_number(value: &Value) -> Numeric<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => return Numeric::Blank,
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(n) if n.is_finite() => Numeric::Parsed(n),
        _ => Numeric::Invalid,
    }
}

fn parse_integer(value: &Value) -> Numeric<i64> {
    if let Value::Number(n) = value {
        if let Some(i) = n.as_i64() {
            return Numeric::Parsed(i);
        }
    }
    if let Value::String(s) = value {
        if let Ok(i) = s.trim().parse::<i64>() {
            return Numeric::Parsed(i);
        }
    }

    match parse_number(value) {
        Numeric::Blank => Numeric::Blank,
        Numeric::Parsed(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
            Numeric::Parsed(n as i64)
        }
        _ => Numeric::Invalid,
    }
}

/// Reads a boolean-like input: native booleans, or `1/true/yes/on` and `0/false/no/off`
/// (case-insensitive, trimmed). Anything else is `None`.
pub fn parse_bool_like(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
