//! The request/response seam to the remote workflow service.
//!
//! The engine never talks HTTP itself. It hands a [`Transport`] a method, a fully built URL and
//! an optional JSON body, and gets the decoded response data back. Headers, authentication,
//! retries, deadlines and cancellation all belong to the implementation.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    /// Base, path and encoded query string.
    pub url: String,
    /// JSON body, mutations only.
    pub body: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransportResponse {
    pub data: Value,
}

impl TransportResponse {
    pub fn new(data: Value) -> Self {
        Self { data }
    }
}

/// A remote failure carrying the service's status code.
///
/// Implementations should return this (inside the `anyhow::Error`) when the service answered
/// with an error status, so the classifier can tell "not found" from "unreachable".
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("remote service responded {status}: {message}")]
pub struct TransportFailure {
    pub status: u16,
    pub message: String,
}

impl TransportFailure {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Sends one request to the remote service.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: TransportRequest) -> anyhow::Result<TransportResponse>;
}
