//! Identifier shape predicates and the validated [`FlowId`] type.

use crate::{IdError, IdResult};
use std::{fmt, str::FromStr};
use uuid::{Uuid, Variant};

const HYPHENATED_UUID_LEN: usize = 36;
const FRIENDLY_MIN_LEN: usize = 2;
const FRIENDLY_MAX_LEN: usize = 64;
const TECHNICAL_HEX_MIN_LEN: usize = 24;

/// Returns `true` if `value` is a hyphenated RFC 4122-style UUID.
///
/// The version nibble must be `1`–`8` and the variant nibble `8`, `9`, `a` or `b`. Case is
/// ignored. Surrounding whitespace is *not* ignored; callers trim first.
pub fn is_uuid_shaped(value: &str) -> bool {
    if value.len() != HYPHENATED_UUID_LEN {
        return false;
    }

    // A 36-character input only parses in hyphenated form.
    let Ok(uuid) = Uuid::parse_str(value) else {
        return false;
    };

    (1..=8).contains(&uuid.get_version_num()) && uuid.get_variant() == Variant::RFC4122
}

/// Returns `true` if `value` looks like a human-friendly business identifier.
///
/// The first character must be an ASCII letter; the rest letters, digits, `_` or `-`.
pub fn is_friendly_identifier(value: &str) -> bool {
    let bytes = value.as_bytes();
    if !(FRIENDLY_MIN_LEN..=FRIENDLY_MAX_LEN).contains(&bytes.len()) {
        return false;
    }

    bytes[0].is_ascii_alphabetic()
        && bytes[1..]
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-'))
}

/// Returns `true` if `value` looks like an internal identifier that should not be shown to
/// callers without elevated visibility: either UUID-shaped or a long run of pure hex.
pub fn is_technical_identifier(value: &str) -> bool {
    let value = value.trim();
    if is_uuid_shaped(value) {
        return true;
    }

    value.len() >= TECHNICAL_HEX_MIN_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Returns `true` if `value` is acceptable wherever an identifier is expected: UUID-shaped or
/// friendly-shaped.
pub fn is_accepted_identifier(value: &str) -> bool {
    is_uuid_shaped(value) || is_friendly_identifier(value)
}

/// A validated workflow identifier (UUID-shaped or friendly-shaped).
///
/// Construct with [`FlowId::parse`]. Once constructed the identifier is trimmed and known to be
/// safe to interpolate into a URL path segment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FlowId(String);

impl FlowId {
    /// Validates and wraps an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] if the trimmed input is neither UUID-shaped nor
    /// friendly-shaped.
    pub fn parse(input: &str) -> IdResult<Self> {
        let trimmed = input.trim();
        if is_accepted_identifier(trimmed) {
            return Ok(Self(trimmed.to_string()));
        }
        Err(IdError::InvalidInput(format!(
            "expected a UUID or a friendly identifier (letter first, 2-64 of A-Z a-z 0-9 _ -), got: '{}'",
            input
        )))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier is an internal one rather than a business one.
    pub fn is_technical(&self) -> bool {
        is_technical_identifier(&self.0)
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FlowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for FlowId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for FlowId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for FlowId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FlowId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_shape_accepts_v4_any_case() {
        assert!(is_uuid_shaped("550e8400-e29b-41d4-a716-446655440000"));
        assert!(is_uuid_shaped("550E8400-E29B-41D4-A716-446655440000"));
        assert!(is_uuid_shaped(&Uuid::new_v4().to_string()));
    }

    #[test]
    fn test_uuid_shape_constrains_version_and_variant() {
        // version nibble 0
        assert!(!is_uuid_shaped("550e8400-e29b-01d4-a716-446655440000"));
        // version nibble 9
        assert!(!is_uuid_shaped("550e8400-e29b-91d4-a716-446655440000"));
        // variant nibble c
        assert!(!is_uuid_shaped("550e8400-e29b-41d4-c716-446655440000"));
        // v8 with variant b is fine
        assert!(is_uuid_shaped("550e8400-e29b-81d4-b716-446655440000"));
    }

    #[test]
    fn test_uuid_shape_rejects_other_forms() {
        assert!(!is_uuid_shaped("550e8400e29b41d4a716446655440000"));
        assert!(!is_uuid_shaped("{550e8400-e29b-41d4-a716-446655440000}"));
        assert!(!is_uuid_shaped(" 550e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_uuid_shaped(""));
    }

    #[test]
    fn test_friendly_identifier_shape() {
        assert!(is_friendly_identifier("PO-100"));
        assert!(is_friendly_identifier("adm_2024_0042"));
        assert!(is_friendly_identifier("Ab"));
        assert!(!is_friendly_identifier("A"));
        assert!(!is_friendly_identifier("1PO"));
        assert!(!is_friendly_identifier("PO 100"));
        assert!(!is_friendly_identifier(&format!("A{}", "b".repeat(64))));
        assert!(is_friendly_identifier(&format!("A{}", "b".repeat(63))));
    }

    #[test]
    fn test_technical_identifier_flags_uuids_and_long_hex() {
        assert!(is_technical_identifier("550e8400-e29b-41d4-a716-446655440000"));
        assert!(is_technical_identifier("65a1f0c2e4b0a1b2c3d4e5f6"));
        assert!(!is_technical_identifier("65a1f0c2e4b0a1b2c3d4e5f"));
        assert!(!is_technical_identifier("PO-100"));
    }

    #[test]
    fn test_flow_id_parse_trims_and_validates() {
        let id = FlowId::parse("  IPD-7 ").expect("friendly id");
        assert_eq!(id.as_str(), "IPD-7");
        assert!(!id.is_technical());

        let uuid = FlowId::parse("550e8400-e29b-41d4-a716-446655440000").expect("uuid id");
        assert!(uuid.is_technical());
    }

    #[test]
    fn test_flow_id_parse_rejects_unsafe_input() {
        for bad in ["", "../etc", "12345", "a b", "x"] {
            let err = FlowId::parse(bad).expect_err("should reject");
            assert!(matches!(err, IdError::InvalidInput(msg) if msg.contains("friendly identifier")));
        }
    }

    #[test]
    fn test_flow_id_from_str_matches_parse() {
        let id: FlowId = "PO-100".parse().expect("parse via FromStr");
        assert_eq!(id.to_string(), "PO-100");
    }
}
