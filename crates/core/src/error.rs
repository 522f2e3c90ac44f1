use flow_contracts::{ContractError, Violation};
use flow_ids::IdError;
use std::fmt;

/// Anything that can go wrong while orchestrating one operation, before classification.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error("invalid identifier for {field}: {source}")]
    InvalidId {
        field: &'static str,
        #[source]
        source: IdError,
    },
    #[error("transport failed: {0:#}")]
    Transport(anyhow::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type FlowResult<T> = std::result::Result<T, FlowError>;

/// A rejected path identifier, reported like any other offending field.
pub(crate) fn id_violation(field: &str, source: &IdError) -> Violation {
    let reason = match source {
        IdError::InvalidInput(reason) => reason.clone(),
    };
    Violation::new(field, reason)
}

/// Coarse error kinds callers branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The caller's input was rejected before any request was made.
    Validation,
    NotFound,
    Unauthorized,
    /// The remote service refused the change given the workflow's current state.
    Conflict,
    /// The remote service could not be reached or failed on its side.
    Unavailable,
    Configuration,
    Unexpected,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Unauthorized => "unauthorized",
            ErrorCategory::Conflict => "conflict",
            ErrorCategory::Unavailable => "unavailable",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error every orchestrated operation returns.
#[derive(Debug, thiserror::Error)]
#[error("{operation} failed ({category}): {message}")]
pub struct ClassifiedError {
    pub operation: &'static str,
    pub category: ErrorCategory,
    pub message: String,
    /// Offending fields, when the failure was a payload or path identifier validation.
    pub violations: Vec<Violation>,
    #[source]
    pub source: FlowError,
}

impl ClassifiedError {
    pub fn is_validation(&self) -> bool {
        self.category == ErrorCategory::Validation
    }

    /// Whether `field` is among the reported violations.
    pub fn has_violation(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

pub type ClassifiedResult<T> = std::result::Result<T, ClassifiedError>;
