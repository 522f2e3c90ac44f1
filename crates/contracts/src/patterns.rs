//! Regex patterns referenced by contracts.
//!
//! Identifier shapes are not here; they live in `flow-ids` so every domain classifies ids alike.

use regex::Regex;
use std::sync::LazyLock;

/// Legacy single-string blood pressure, `NN[.NN]/NN[.NN]` (systolic/diastolic).
pub static BLOOD_PRESSURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2,3}(?:\.\d{1,2})?)\s*/\s*(\d{2,3}(?:\.\d{1,2})?)$")
        .expect("blood pressure pattern is valid")
});

/// Resource kind slug used by legacy route lookups, e.g. `pharmacy-orders`.
pub static RESOURCE_SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z][a-z0-9]*(?:[-_][a-z0-9]+)*$").expect("resource slug pattern is valid")
});

/// Splits a legacy blood pressure string into `(systolic, diastolic)`.
pub fn split_blood_pressure(value: &str) -> Option<(f64, f64)> {
    let captures = BLOOD_PRESSURE_RE.captures(value.trim())?;
    let systolic = captures.get(1)?.as_str().parse().ok()?;
    let diastolic = captures.get(2)?.as_str().parse().ok()?;
    Some((systolic, diastolic))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_legacy_blood_pressure() {
        assert_eq!(split_blood_pressure("120/80"), Some((120.0, 80.0)));
        assert_eq!(split_blood_pressure(" 118.5 / 76.25 "), Some((118.5, 76.25)));
    }

    #[test]
    fn rejects_malformed_blood_pressure() {
        assert_eq!(split_blood_pressure("120"), None);
        assert_eq!(split_blood_pressure("120/"), None);
        assert_eq!(split_blood_pressure("1/80"), None);
        assert_eq!(split_blood_pressure("120/80/60"), None);
        assert_eq!(split_blood_pressure("120.123/80"), None);
    }

    #[test]
    fn resource_slug_accepts_kebab_and_snake_case() {
        assert!(RESOURCE_SLUG_RE.is_match("pharmacy-orders"));
        assert!(RESOURCE_SLUG_RE.is_match("Pharmacy-Orders"));
        assert!(RESOURCE_SLUG_RE.is_match("ipd_flows"));
        assert!(!RESOURCE_SLUG_RE.is_match("pharmacy orders"));
        assert!(!RESOURCE_SLUG_RE.is_match("-orders"));
    }
}
