//! # Flow Core
//!
//! Use-case orchestration for the clinical workflow engine.
//!
//! Each domain service validates caller input with `flow-contracts`, sends one request through
//! a caller-supplied [`Transport`], and normalises the reply with `flow-snapshots`. Failures are
//! classified once by an [`ErrorClassifier`] and returned to the caller.
//!
//! **No HTTP here**: the transport owns connections, authentication, retries and deadlines.

pub mod classify;
pub mod config;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod services;
pub mod transport;

#[cfg(test)]
mod testing;

pub use classify::{ErrorClassifier, StandardClassifier};
pub use config::{api_base_from_env_value, CoreConfig};
pub use error::{ClassifiedError, ClassifiedResult, ErrorCategory, FlowError, FlowResult};
pub use gateway::{encode_query, Gateway};
pub use services::{IpdService, LegacyRouteService, OpdService, PharmacyService, TheatreService};
pub use transport::{Method, Transport, TransportFailure, TransportRequest, TransportResponse};
