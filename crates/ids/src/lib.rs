//! Identifier classification and display-id resolution.
//!
//! Workflow records coming back from the remote service usually carry two kinds of identifier:
//! an opaque internal one (typically a UUID) and, optionally, a human-friendly business one
//! (for example `ADM-2024-0042`). Only the second should ever be shown to people.
//!
//! This crate is the single home of the identifier patterns so that all four workflow domains
//! classify identifiers the same way:
//! - **UUID shape**: `8-4-4-4-12` hex, version nibble `1`–`8`, variant nibble `8`/`9`/`a`/`b`,
//!   case-insensitive.
//! - **Friendly shape**: starts with a letter, then letters, digits, `_` or `-`; 2–64 characters.
//! - **Technical**: UUID-shaped, or pure hex of at least 24 characters (database object ids).
//!
//! It provides:
//! - Pure predicates ([`is_uuid_shaped`], [`is_friendly_identifier`], [`is_technical_identifier`]).
//! - A validated identifier type ([`FlowId`]) used for path parameters and payload fields.
//! - Display resolution ([`resolve_display_id`] and friends) used by every snapshot normalizer.

mod classify;
mod resolve;

pub use classify::{
    is_accepted_identifier, is_friendly_identifier, is_technical_identifier, is_uuid_shaped,
    FlowId,
};
pub use resolve::{
    display_id_or_internal, resolve_display_id, resolve_display_id_with, visible_identifier,
    IdentifierFields, DEFAULT_FIELDS, PATIENT_FIELDS,
};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdError {
    /// Invalid input provided
    #[error("invalid identifier: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;
