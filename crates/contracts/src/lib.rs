//! Payload contracts for workflow mutations and queries.
//!
//! Every operation the engine forwards to the remote service has a contract declared as data
//! (see [`schema`]). Validation coerces the caller's loosely-typed input into a normalised
//! payload and reports *every* offending field, never just the first.
//!
//! This crate focuses on:
//! - the contract engine ([`validate`])
//! - one contract plus one typed payload per operation, grouped by domain
//! - translation from the normalised map into the typed payload
//!
//! Validation always happens before any network interaction; nothing here performs I/O.

pub mod ipd;
pub mod legacy;
pub mod opd;
pub mod patterns;
pub mod pharmacy;
pub mod schema;
pub mod shared;
pub mod theatre;
pub mod validate;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

pub use schema::{Contract, DefaultValue, FieldKind, FieldSpec, Rule, RuleContext};
pub use validate::{parse_bool_like, validate, ROOT_PATH};

/// A single offending field and why it was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Field path, e.g. `to_bed_id` or `vitals[0].systolic_value`.
    pub field: String,
    /// Human-readable reason.
    pub reason: String,
}

impl Violation {
    pub fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Every violation found while checking one payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    /// Name of the contract that rejected the payload.
    pub contract: &'static str,
    pub violations: Vec<Violation>,
}

impl ValidationFailure {
    /// Whether `field` (exact path) is among the violations.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// Offending field paths, in the order they were found.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.field.as_str())
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} payload: ", self.contract)?;
        for (index, violation) in self.violations.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} {}", violation.field, violation.reason)?;
        }
        Ok(())
    }
}

/// Errors returned by the `flow-contracts` crate.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("{0}")]
    Validation(ValidationFailure),

    /// The normalised payload did not fit the typed payload; indicates drift between a contract
    /// and its payload struct.
    #[error("translation error: {0}")]
    Translation(String),
}

impl ContractError {
    /// The validation failure, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationFailure> {
        match self {
            ContractError::Validation(failure) => Some(failure),
            ContractError::Translation(_) => None,
        }
    }
}

/// Type alias for Results that can fail with a [`ContractError`].
pub type ContractResult<T> = Result<T, ContractError>;

/// A typed payload guarded by a contract.
pub trait Contracted: DeserializeOwned + Serialize {
    /// The contract raw input must satisfy.
    fn contract() -> &'static Contract;

    /// Validates `raw` and builds the typed payload.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Validation`] listing every violation, or
    /// [`ContractError::Translation`] if the normalised payload does not match the payload type.
    fn parse(raw: &Value) -> ContractResult<Self> {
        let contract = Self::contract();
        let normalised = validate(contract, raw)?;
        from_normalised(contract.name, normalised)
    }
}

/// Deserialises a normalised payload into its typed form.
///
/// This uses `serde_path_to_error` to surface the path (e.g. `vitals.0.vital_type`) of the field
/// that failed to translate.
fn from_normalised<T: DeserializeOwned>(
    contract: &'static str,
    normalised: Map<String, Value>,
) -> ContractResult<T> {
    serde_path_to_error::deserialize::<_, T>(Value::Object(normalised)).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            ROOT_PATH
        } else {
            path.as_str()
        };
        ContractError::Translation(format!("{contract} schema mismatch at {path}: {source}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failure_display_lists_every_field() {
        let failure = ValidationFailure {
            contract: "UpdateTransfer",
            violations: vec![
                Violation::new("action", "is required"),
                Violation::new("reason", "must be text"),
            ],
        };
        assert_eq!(
            failure.to_string(),
            "invalid UpdateTransfer payload: action is required; reason must be text"
        );
        assert!(failure.has_field("reason"));
        assert!(!failure.has_field("to_bed_id"));
        assert_eq!(failure.fields().collect::<Vec<_>>(), vec!["action", "reason"]);
    }

    #[test]
    fn translation_errors_name_the_failing_path() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Narrow {
            count: u8,
        }

        let mut map = Map::new();
        map.insert("count".into(), Value::from(1000));
        let err = from_normalised::<Narrow>("Narrow", map).expect_err("out of range");
        match err {
            ContractError::Translation(msg) => {
                assert!(msg.contains("Narrow schema mismatch at count"));
            }
            other => panic!("expected Translation error, got {other:?}"),
        }
    }
}
