//! Error classification.
//!
//! Every failed operation passes through exactly one [`ErrorClassifier`] before it reaches the
//! caller. Classification never swallows an error: the underlying [`FlowError`] stays attached as
//! the source of the returned [`ClassifiedError`].

use crate::error::{id_violation, ClassifiedError, ErrorCategory, FlowError};
use crate::transport::TransportFailure;
use flow_contracts::ContractError;

pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, operation: &'static str, error: FlowError) -> ClassifiedError;
}

/// Maps local failures by variant and remote failures by status code.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardClassifier;

impl StandardClassifier {
    fn category(error: &FlowError) -> ErrorCategory {
        match error {
            FlowError::Contract(ContractError::Validation(_)) => ErrorCategory::Validation,
            FlowError::Contract(ContractError::Translation(_)) => ErrorCategory::Unexpected,
            FlowError::InvalidId { .. } => ErrorCategory::Validation,
            FlowError::InvalidConfig(_) => ErrorCategory::Configuration,
            FlowError::Transport(source) => match source.downcast_ref::<TransportFailure>() {
                Some(failure) => Self::status_category(failure.status),
                None => ErrorCategory::Unavailable,
            },
        }
    }

    fn status_category(status: u16) -> ErrorCategory {
        match status {
            400 | 422 => ErrorCategory::Validation,
            401 | 403 => ErrorCategory::Unauthorized,
            404 | 410 => ErrorCategory::NotFound,
            409 | 412 => ErrorCategory::Conflict,
            408 | 429 | 500..=599 => ErrorCategory::Unavailable,
            _ => ErrorCategory::Unexpected,
        }
    }
}

impl ErrorClassifier for StandardClassifier {
    fn classify(&self, operation: &'static str, error: FlowError) -> ClassifiedError {
        let category = Self::category(&error);
        let violations = match &error {
            FlowError::Contract(contract) => contract
                .as_validation()
                .map(|failure| failure.violations.clone())
                .unwrap_or_default(),
            FlowError::InvalidId { field, source } => vec![id_violation(field, source)],
            _ => Vec::new(),
        };
        let message = error.to_string();

        tracing::warn!(operation, %category, error = %message, "operation failed");

        ClassifiedError {
            operation,
            category,
            message,
            violations,
            source: error,
        }
    }
}
