//! Contracts shared across domains: vitals, navigation state and list paging.

use crate::patterns::split_blood_pressure;
use crate::schema::{tag, Contract, FieldKind, FieldSpec, Rule, RuleContext};
use crate::Contracted;
use flow_ids::FlowId;
use flow_types::catalog::{VitalType, WorkflowDomain};
use flow_types::{Catalog, NonEmptyText};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Upper bound for short labels (units, doses, search terms).
pub const SHORT_TEXT: usize = 120;
/// Upper bound for clinical narrative (notes, summaries, plans).
pub const LONG_TEXT: usize = 4000;

pub(crate) const SHORT: FieldKind = FieldKind::Text {
    max_len: SHORT_TEXT,
};
pub(crate) const LONG: FieldKind = FieldKind::Text {
    max_len: LONG_TEXT,
};

/// Largest page size a list request may ask for.
pub const MAX_PAGE_SIZE: i64 = 100;
/// Largest whole-number count (page, quantity) a payload may carry; counts are `u32` once typed.
pub const MAX_COUNT: i64 = u32::MAX as i64;

pub(crate) const PAGE: FieldSpec = FieldSpec::optional(
    "page",
    FieldKind::Integer {
        min: Some(1),
        max: Some(MAX_COUNT),
    },
);

pub(crate) const LIMIT: FieldSpec = FieldSpec::optional(
    "limit",
    FieldKind::Integer {
        min: Some(1),
        max: Some(MAX_PAGE_SIZE),
    },
);

pub(crate) const SEARCH: FieldSpec = FieldSpec::optional("search", SHORT);

/// Paging shared by every list request. Flattened into each domain's list parameters.
///
/// Absent values are left to the service's own defaults and never sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

// ============================================================================
// Vitals
// ============================================================================

pub static VITAL_ROW: Contract = Contract {
    name: "VitalRow",
    fields: &[
        FieldSpec::required(
            "vital_type",
            FieldKind::Enum {
                values: <VitalType as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::optional("value", SHORT),
        FieldSpec::optional(
            "systolic_value",
            FieldKind::Number {
                min: Some(0.0),
                max: None,
            },
        ),
        FieldSpec::optional(
            "diastolic_value",
            FieldKind::Number {
                min: Some(0.0),
                max: None,
            },
        ),
        FieldSpec::optional("unit", SHORT),
        FieldSpec::optional("recorded_at", FieldKind::Timestamp),
    ],
    rules: &[Rule {
        name: "vital_value_shape",
        check: vital_value_shape,
    }],
};

/// Blood pressure rows need both readings, either explicitly or as a legacy `"120/80"` value
/// (split into both fields here). Every other vital needs a numeric `value`.
fn vital_value_shape(row: &mut Map<String, Value>, ctx: &mut RuleContext<'_>) {
    let Some(vital_type) = tag(row, "vital_type").map(str::to_owned) else {
        return;
    };
    let value = row.remove("value");

    if vital_type == VitalType::BloodPressure.as_str() {
        let has_systolic = row.contains_key("systolic_value");
        let has_diastolic = row.contains_key("diastolic_value");
        if has_systolic && has_diastolic {
            return;
        }

        if !has_systolic && !has_diastolic {
            if let Some((systolic, diastolic)) =
                value.as_ref().and_then(Value::as_str).and_then(split_blood_pressure)
            {
                row.insert("systolic_value".into(), Value::from(systolic));
                row.insert("diastolic_value".into(), Value::from(diastolic));
                return;
            }
        }

        for (present, field) in [
            (has_systolic, "systolic_value"),
            (has_diastolic, "diastolic_value"),
        ] {
            if !present {
                ctx.violation(
                    field,
                    "is required for BLOOD_PRESSURE (or send value as systolic/diastolic)",
                );
            }
        }
        return;
    }

    match value.as_ref().and_then(Value::as_str) {
        None => ctx.violation("value", format!("is required for {vital_type}")),
        Some(text) => match text.parse::<f64>() {
            Ok(n) if n.is_finite() => {
                row.insert("value".into(), Value::from(n));
            }
            _ => ctx.violation("value", "must be a number"),
        },
    }
}

/// One vital sign reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VitalRow {
    pub vital_type: VitalType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systolic_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diastolic_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<String>,
}

impl Contracted for VitalRow {
    fn contract() -> &'static Contract {
        &VITAL_ROW
    }
}

pub static RECORD_VITALS: Contract = Contract {
    name: "RecordVitals",
    fields: &[
        FieldSpec::required(
            "vitals",
            FieldKind::Rows {
                contract: &VITAL_ROW,
                min_items: 1,
            },
        ),
        FieldSpec::optional("recorded_at", FieldKind::Timestamp),
    ],
    rules: &[],
};

/// A batch of vitals recorded against a flow (OPD or IPD).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordVitals {
    pub vitals: Vec<VitalRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<String>,
}

impl Contracted for RecordVitals {
    fn contract() -> &'static Contract {
        &RECORD_VITALS
    }
}

// ============================================================================
// Navigation state
// ============================================================================

pub static WORKFLOW_ROUTE_STATE: Contract = Contract {
    name: "WorkflowRouteState",
    fields: &[
        FieldSpec::optional(
            "domain",
            FieldKind::RouteState(&FieldKind::Enum {
                values: <WorkflowDomain as Catalog>::WIRE_VALUES,
            }),
        ),
        FieldSpec::optional("flow_id", FieldKind::RouteState(&FieldKind::Identifier)),
        FieldSpec::optional("tab", FieldKind::RouteState(&SHORT)),
        FieldSpec::optional("panel", FieldKind::RouteState(&SHORT)),
        FieldSpec::optional("stage", FieldKind::RouteState(&SHORT)),
    ],
    rules: &[],
};

/// Which workflow, tab and panel a screen is showing.
///
/// Arrives as query parameters, so any field may be repeated; the first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowRouteState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<WorkflowDomain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<FlowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<NonEmptyText>,
}

impl Contracted for WorkflowRouteState {
    fn contract() -> &'static Contract {
        &WORKFLOW_ROUTE_STATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContractError;
    use serde_json::json;

    fn violation_fields(err: ContractError) -> Vec<String> {
        match err {
            ContractError::Validation(failure) => {
                failure.violations.into_iter().map(|v| v.field).collect()
            }
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn blood_pressure_without_readings_flags_both_fields() {
        let err = VitalRow::parse(&json!({ "vital_type": "BLOOD_PRESSURE" }))
            .expect_err("missing readings");
        assert_eq!(
            violation_fields(err),
            vec!["systolic_value", "diastolic_value"]
        );
    }

    #[test]
    fn blood_pressure_with_one_reading_flags_the_other() {
        let err = VitalRow::parse(&json!({
            "vital_type": "blood_pressure",
            "systolic_value": 120
        }))
        .expect_err("missing diastolic");
        assert_eq!(violation_fields(err), vec!["diastolic_value"]);
    }

    #[test]
    fn legacy_blood_pressure_value_is_split() {
        let row = VitalRow::parse(&json!({
            "vital_type": "BLOOD_PRESSURE",
            "value": "120/80",
            "unit": "mmHg"
        }))
        .expect("legacy value");

        assert_eq!(row.vital_type, VitalType::BloodPressure);
        assert_eq!(row.systolic_value, Some(120.0));
        assert_eq!(row.diastolic_value, Some(80.0));
        assert_eq!(row.value, None);
    }

    #[test]
    fn malformed_blood_pressure_value_flags_both_fields() {
        let err = VitalRow::parse(&json!({
            "vital_type": "BLOOD_PRESSURE",
            "value": "high"
        }))
        .expect_err("not systolic/diastolic");
        assert_eq!(
            violation_fields(err),
            vec!["systolic_value", "diastolic_value"]
        );
    }

    #[test]
    fn other_vitals_need_a_numeric_value() {
        let row = VitalRow::parse(&json!({ "vital_type": "pulse", "value": "72" })).expect("pulse");
        assert_eq!(row.value, Some(72.0));

        let err = VitalRow::parse(&json!({ "vital_type": "PULSE" })).expect_err("no value");
        assert_eq!(violation_fields(err), vec!["value"]);

        let err = VitalRow::parse(&json!({ "vital_type": "PULSE", "value": "fast" }))
            .expect_err("not a number");
        assert_eq!(violation_fields(err), vec!["value"]);
    }

    #[test]
    fn record_vitals_reports_row_paths() {
        let err = RecordVitals::parse(&json!({
            "vitals": [
                { "vital_type": "TEMPERATURE", "value": 37.2 },
                { "vital_type": "BLOOD_PRESSURE" }
            ]
        }))
        .expect_err("second row invalid");
        assert_eq!(
            violation_fields(err),
            vec!["vitals[1].systolic_value", "vitals[1].diastolic_value"]
        );
    }

    #[test]
    fn record_vitals_needs_at_least_one_row() {
        let err = RecordVitals::parse(&json!({ "vitals": [] })).expect_err("empty");
        assert_eq!(violation_fields(err), vec!["vitals"]);
    }

    #[test]
    fn route_state_takes_first_repeated_value() {
        let state = WorkflowRouteState::parse(&json!({
            "domain": ["ipd", "opd"],
            "flow_id": ["IPD-0042"],
            "tab": "rounds",
            "utm_source": "email"
        }))
        .expect("route state");

        assert_eq!(state.domain, Some(WorkflowDomain::Ipd));
        assert_eq!(state.flow_id.as_ref().map(FlowId::as_str), Some("IPD-0042"));
        assert_eq!(state.tab.as_ref().map(NonEmptyText::as_str), Some("rounds"));
        assert_eq!(state.panel, None);
    }

    #[test]
    fn absent_paging_is_not_serialised() {
        let paging: Paging = serde_json::from_value(json!({})).expect("empty paging");
        assert_eq!(paging, Paging::default());
        assert_eq!(serde_json::to_value(&paging).expect("serialisable"), json!({}));
    }
}
