//! The shared validate, send, classify pipeline behind every service.

use crate::classify::{ErrorClassifier, StandardClassifier};
use crate::config::CoreConfig;
use crate::error::{id_violation, ClassifiedError, ClassifiedResult, FlowError};
use crate::transport::{Method, Transport, TransportRequest};
use flow_contracts::{ContractError, Contracted, ValidationFailure};
use flow_ids::FlowId;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use url::form_urlencoded;

/// Transport, classifier and configuration shared by the domain services.
///
/// Cheap to clone; all state sits behind `Arc`.
#[derive(Clone)]
pub struct Gateway {
    cfg: Arc<CoreConfig>,
    transport: Arc<dyn Transport>,
    classifier: Arc<dyn ErrorClassifier>,
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Creates a gateway that classifies failures with [`StandardClassifier`].
    pub fn new(cfg: Arc<CoreConfig>, transport: Arc<dyn Transport>) -> Self {
        Self {
            cfg,
            transport,
            classifier: Arc::new(StandardClassifier),
        }
    }

    /// Replaces the error classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    pub(crate) fn fail(&self, operation: &'static str, error: FlowError) -> ClassifiedError {
        self.classifier.classify(operation, error)
    }

    /// Validates `raw` against the payload's contract.
    pub(crate) fn parse<P: Contracted>(
        &self,
        operation: &'static str,
        raw: &Value,
    ) -> ClassifiedResult<P> {
        P::parse(raw).map_err(|e| self.fail(operation, FlowError::Contract(e)))
    }

    /// Validates a path identifier.
    pub(crate) fn flow_id(
        &self,
        operation: &'static str,
        field: &'static str,
        raw: &str,
    ) -> ClassifiedResult<FlowId> {
        FlowId::parse(raw)
            .map_err(|source| self.fail(operation, FlowError::InvalidId { field, source }))
    }

    /// Validates path identifiers and a payload together, so a single failure names every
    /// offending field, path identifiers first.
    pub(crate) fn parse_at<P: Contracted, const N: usize>(
        &self,
        operation: &'static str,
        ids: [(&'static str, &str); N],
        raw: &Value,
    ) -> ClassifiedResult<([FlowId; N], P)> {
        let mut parsed = Vec::with_capacity(N);
        let mut violations = Vec::new();
        for (field, value) in ids {
            match FlowId::parse(value) {
                Ok(id) => parsed.push(id),
                Err(source) => violations.push(id_violation(field, &source)),
            }
        }

        let payload = match P::parse(raw) {
            Ok(payload) if violations.is_empty() => payload,
            Err(ContractError::Validation(mut failure)) => {
                violations.append(&mut failure.violations);
                failure.violations = violations;
                let error = FlowError::Contract(ContractError::Validation(failure));
                return Err(self.fail(operation, error));
            }
            Err(other) if violations.is_empty() => {
                return Err(self.fail(operation, FlowError::Contract(other)));
            }
            Ok(_) | Err(_) => {
                let failure = ValidationFailure {
                    contract: P::contract().name,
                    violations,
                };
                let error = FlowError::Contract(ContractError::Validation(failure));
                return Err(self.fail(operation, error));
            }
        };

        let ids = <[FlowId; N]>::try_from(parsed).map_err(|_| {
            let error = ContractError::Translation(format!("{operation}: path identifiers lost"));
            self.fail(operation, FlowError::Contract(error))
        })?;
        Ok((ids, payload))
    }

    /// Full URL for `path`, with `params` encoded as the query string.
    pub(crate) fn list_url<P: Serialize>(
        &self,
        operation: &'static str,
        path: &str,
        params: &P,
    ) -> ClassifiedResult<String> {
        let query = encode_query(params).map_err(|e| self.fail(operation, e))?;
        let url = self.cfg.url(path);
        Ok(if query.is_empty() {
            url
        } else {
            format!("{url}?{query}")
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        self.cfg.url(path)
    }

    pub(crate) async fn get(
        &self,
        operation: &'static str,
        url: String,
    ) -> ClassifiedResult<Value> {
        self.send(operation, Method::Get, url, None).await
    }

    pub(crate) async fn post<B: Serialize>(
        &self,
        operation: &'static str,
        url: String,
        body: &B,
    ) -> ClassifiedResult<Value> {
        let body = serde_json::to_value(body).map_err(|e| {
            self.fail(
                operation,
                FlowError::Contract(ContractError::Translation(e.to_string())),
            )
        })?;
        self.send(operation, Method::Post, url, Some(body)).await
    }

    async fn send(
        &self,
        operation: &'static str,
        method: Method,
        url: String,
        body: Option<Value>,
    ) -> ClassifiedResult<Value> {
        tracing::debug!(operation, %method, %url, "sending request");

        let response = self
            .transport
            .request(TransportRequest { method, url, body })
            .await
            .map_err(|e| self.fail(operation, FlowError::Transport(e)))?;

        tracing::debug!(operation, "request completed");
        Ok(response.data)
    }
}

/// Encodes a serialisable parameter struct as `application/x-www-form-urlencoded`.
///
/// Absent (`null`) values are skipped; arrays repeat the key. Nested objects are not expected
/// and are skipped.
pub fn encode_query<P: Serialize>(params: &P) -> Result<String, FlowError> {
    let value = serde_json::to_value(params)
        .map_err(|e| FlowError::Contract(ContractError::Translation(e.to_string())))?;

    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Value::Object(map) = &value {
        for (key, value) in map {
            match value {
                Value::Array(items) => {
                    for item in items {
                        if let Some(text) = scalar(item) {
                            query.append_pair(key, &text);
                        }
                    }
                }
                other => {
                    if let Some(text) = scalar(other) {
                        query.append_pair(key, &text);
                    }
                }
            }
        }
    }
    Ok(query.finish())
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
