//! Contract declarations.
//!
//! A [`Contract`] is plain data: a list of [`FieldSpec`]s describing each recognised field and a
//! short list of named cross-field [`Rule`]s. Contracts are declared as `static` items next to
//! the payload type they produce, so each one can be read (and diffed) field by field.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// A per-operation payload contract.
#[derive(Debug)]
pub struct Contract {
    /// Name used in error messages (usually the payload type name).
    pub name: &'static str,
    /// Recognised fields. Anything else in the input is dropped.
    pub fields: &'static [FieldSpec],
    /// Cross-field invariants, checked after every field has been coerced.
    pub rules: &'static [Rule],
}

impl Contract {
    /// Looks up a field declaration by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Declaration of a single field.
#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<DefaultValue>,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
        }
    }

    /// Value inserted when the field is absent (or present but unusable as a boolean).
    pub const fn or_default(self, default: DefaultValue) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }
}

/// Type and constraints of a field.
#[derive(Debug)]
pub enum FieldKind {
    /// UUID-shaped or friendly-shaped identifier.
    Identifier,
    /// Trimmed free text; blank counts as absent.
    Text { max_len: usize },
    /// Trimmed text that must match `regex`; `hint` describes the expected shape.
    Pattern {
        regex: &'static LazyLock<Regex>,
        hint: &'static str,
    },
    /// Whole number, native or numeric string.
    Integer { min: Option<i64>, max: Option<i64> },
    /// Any finite number, native or numeric string.
    Number { min: Option<f64>, max: Option<f64> },
    /// Native boolean or `1/true/yes/on`, `0/false/no/off`. Anything else is absent.
    Boolean,
    /// ISO-8601 date-time string.
    Timestamp,
    /// Member of a closed set of canonical (uppercase) values.
    Enum { values: &'static [&'static str] },
    /// Array of nested rows, each checked against `contract`.
    Rows {
        contract: &'static Contract,
        min_items: usize,
    },
    /// Navigation state that may arrive as a repeated query parameter; an array contributes its
    /// first element, which is then checked as the inner kind.
    RouteState(&'static FieldKind),
}

/// Default inserted for an absent field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DefaultValue {
    Text(&'static str),
    Boolean(bool),
}

impl DefaultValue {
    pub fn to_value(self) -> Value {
        match self {
            DefaultValue::Text(s) => Value::String(s.to_string()),
            DefaultValue::Boolean(b) => Value::Bool(b),
        }
    }
}

/// A named cross-field invariant.
///
/// `check` sees the coerced payload and may rewrite it (for example splitting a legacy blood
/// pressure string into its two numeric fields) as well as report violations.
pub struct Rule {
    pub name: &'static str,
    pub check: fn(&mut Map<String, Value>, &mut RuleContext<'_>),
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// Where a rule reports its violations. Field names are relative to the row being checked.
pub struct RuleContext<'a> {
    pub(crate) prefix: &'a str,
    pub(crate) violations: &'a mut Vec<crate::Violation>,
}

impl RuleContext<'_> {
    /// Records a violation against `field` (relative to the current row).
    pub fn violation(&mut self, field: &str, reason: impl Into<String>) {
        self.violations.push(crate::Violation {
            field: crate::validate::join_path(self.prefix, field),
            reason: reason.into(),
        });
    }
}

// ============================================================================
// Rule helpers
// ============================================================================

/// Returns the canonical string held in `field`, if any.
pub fn tag<'m>(payload: &'m Map<String, Value>, field: &str) -> Option<&'m str> {
    payload.get(field).and_then(Value::as_str)
}

/// Whether `field` is present in the coerced payload.
pub fn has(payload: &Map<String, Value>, field: &str) -> bool {
    payload.get(field).is_some_and(|v| !v.is_null())
}

/// Shared shape of "when `field` equals `value`, `dependent` is required" rules.
pub fn require_when(
    payload: &Map<String, Value>,
    ctx: &mut RuleContext<'_>,
    field: &str,
    values: &[&str],
    dependent: &str,
) {
    if let Some(actual) = tag(payload, field) {
        if values.contains(&actual) && !has(payload, dependent) {
            ctx.violation(dependent, format!("is required when {field} is {actual}"));
        }
    }
}
