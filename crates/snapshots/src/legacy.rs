//! Legacy route resolution results.
//!
//! Old deep links carry a resource kind and an identifier; the service answers with the route the
//! record now lives at and how the identifier was matched.

use crate::record::{as_record, lower_tag, text, text_or_empty};
use flow_ids::resolve_display_id;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyResolution {
    /// Display id, falling back to the identifier that was looked up.
    pub id: String,
    pub identifier: String,
    /// Lower-cased resource slug, e.g. `pharmacy-orders`.
    pub resource: String,
    pub route: String,
    /// Lower-cased match strategy, e.g. `display_id`.
    pub matched_by: String,
}

/// Normalises a legacy route resolution. `None` only when `raw` is not a JSON object.
pub fn normalize_legacy_resolution(raw: &Value) -> Option<LegacyResolution> {
    let record = as_record(raw)?;
    let identifier = text_or_empty(record, &["identifier", "matched_identifier", "id"]);

    Some(LegacyResolution {
        id: resolve_display_id(raw).unwrap_or_else(|| identifier.clone()),
        resource: lower_tag(record, &["resource", "resource_type", "resource_kind"]),
        route: text(record, &["route", "path", "target_route"]).unwrap_or_default(),
        matched_by: lower_tag(record, &["matched_by", "match_strategy", "strategy"]),
        identifier,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lower_cases_resource_and_strategy() {
        let resolved = normalize_legacy_resolution(&json!({
            "resource": "Pharmacy-Orders",
            "identifier": "PO-100",
            "route": "/pharmacy/orders/PO-100",
            "matched_by": "DISPLAY_ID"
        }))
        .expect("object");
        assert_eq!(resolved.resource, "pharmacy-orders");
        assert_eq!(resolved.id, "PO-100");
        assert_eq!(resolved.identifier, "PO-100");
        assert_eq!(resolved.matched_by, "display_id");
        assert_eq!(resolved.route, "/pharmacy/orders/PO-100");
    }

    #[test]
    fn uuid_identifier_is_kept_but_not_displayed_when_a_friendly_id_exists() {
        let resolved = normalize_legacy_resolution(&json!({
            "id": "5f0c2b1a-3d4e-4f5a-8b6c-7d8e9f0a1b2c",
            "display_id": "IPD-88",
            "identifier": "5f0c2b1a-3d4e-4f5a-8b6c-7d8e9f0a1b2c",
            "resource_type": "ipd-flows"
        }))
        .expect("object");
        assert_eq!(resolved.id, "IPD-88");
        assert_eq!(resolved.identifier, "5f0c2b1a-3d4e-4f5a-8b6c-7d8e9f0a1b2c");
        assert_eq!(resolved.route, "");
    }

    #[test]
    fn renormalising_is_stable() {
        let once = normalize_legacy_resolution(&json!({
            "resource": "OPD-Flows",
            "matched_identifier": "OPD-7",
            "path": "/opd/OPD-7",
            "strategy": "Legacy_Number"
        }))
        .expect("object");
        let serialised = serde_json::to_value(&once).expect("serialise");
        assert_eq!(normalize_legacy_resolution(&serialised), Some(once));
    }

    #[test]
    fn non_objects_are_rejected() {
        assert!(normalize_legacy_resolution(&json!("PO-100")).is_none());
    }
}
