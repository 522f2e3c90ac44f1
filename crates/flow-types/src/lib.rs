//! Shared primitives for the clinical workflow engine.
//!
//! This crate holds the small value types that every other crate in the workspace agrees on:
//! - [`NonEmptyText`] for free-text clinical content that must carry a value
//! - the declarative stage/transition catalogs in [`catalog`]
//! - lenient ISO-8601 parsing in [`timestamp`]
//! - [`canonical_tag`], the single place enum-like wire values are folded to their canonical form

pub mod catalog;
pub mod timestamp;

pub use catalog::{display_label, Catalog};

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,

    /// The trimmed input exceeded the permitted number of characters
    #[error("text exceeds maximum length of {max} characters")]
    TooLong { max: usize },
}

/// Errors raised when a wire value does not belong to a closed catalog.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("'{value}' is not a recognised {catalog} value")]
    Unknown {
        catalog: &'static str,
        value: String,
    },
}

/// Free-text clinical content (notes, reasons, plans) that is guaranteed to be non-blank.
///
/// Leading and trailing whitespace is removed on construction, so two notes that differ only in
/// surrounding whitespace compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Creates a `NonEmptyText` whose trimmed content is at most `max_chars` characters long.
    ///
    /// Length is counted in Unicode scalar values, not bytes, so accented names and notes are
    /// not penalised.
    pub fn bounded(input: impl AsRef<str>, max_chars: usize) -> Result<Self, TextError> {
        let text = Self::new(input)?;
        if text.0.chars().count() > max_chars {
            return Err(TextError::TooLong { max: max_chars });
        }
        Ok(text)
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Folds an enum-like wire value (stage, status, action, priority...) to its canonical form:
/// trimmed and uppercased.
///
/// Comparisons against catalog values are only ever made on canonical tags, so `" admitted_in_bed"`
/// and `"ADMITTED_IN_BED"` are the same stage.
pub fn canonical_tag(value: &str) -> String {
    value.trim().to_uppercase()
}
