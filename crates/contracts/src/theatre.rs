//! Theatre case contracts: scheduling, stage transitions and the intra-operative record.

use crate::schema::{has, require_when, Contract, FieldKind, FieldSpec, Rule, RuleContext};
use crate::shared::{Paging, VitalRow, LIMIT, LONG, PAGE, SEARCH, SHORT, VITAL_ROW};
use crate::Contracted;
use flow_ids::FlowId;
use flow_types::catalog::{ChecklistPhase, TheatreAction, TheatrePriority, TheatreStage};
use flow_types::{Catalog, NonEmptyText};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub static THEATRE_FLOW_LIST_PARAMS: Contract = Contract {
    name: "TheatreFlowListParams",
    fields: &[
        PAGE,
        LIMIT,
        SEARCH,
        FieldSpec::optional(
            "stage",
            FieldKind::Enum {
                values: <TheatreStage as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::optional(
            "priority",
            FieldKind::Enum {
                values: <TheatrePriority as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::optional("theatre_room_id", FieldKind::Identifier),
    ],
    rules: &[],
};

/// Filters for the theatre board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TheatreFlowListParams {
    #[serde(flatten)]
    pub paging: Paging,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<TheatreStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TheatrePriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theatre_room_id: Option<FlowId>,
}

impl Contracted for TheatreFlowListParams {
    fn contract() -> &'static Contract {
        &THEATRE_FLOW_LIST_PARAMS
    }
}

pub static SCHEDULE_THEATRE_CASE: Contract = Contract {
    name: "ScheduleTheatreCase",
    fields: &[
        FieldSpec::required("patient_id", FieldKind::Identifier),
        FieldSpec::required("procedure_name", SHORT),
        FieldSpec::required(
            "priority",
            FieldKind::Enum {
                values: <TheatrePriority as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::optional("scheduled_at", FieldKind::Timestamp),
        FieldSpec::optional("theatre_room_id", FieldKind::Identifier),
        FieldSpec::optional("surgeon_id", FieldKind::Identifier),
        FieldSpec::optional("encounter_id", FieldKind::Identifier),
        FieldSpec::optional("admission_id", FieldKind::Identifier),
    ],
    rules: &[],
};

/// Books a procedure on the theatre board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleTheatreCase {
    pub patient_id: FlowId,
    pub procedure_name: NonEmptyText,
    pub priority: TheatrePriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theatre_room_id: Option<FlowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surgeon_id: Option<FlowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter_id: Option<FlowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_id: Option<FlowId>,
}

impl Contracted for ScheduleTheatreCase {
    fn contract() -> &'static Contract {
        &SCHEDULE_THEATRE_CASE
    }
}

pub static THEATRE_TRANSITION: Contract = Contract {
    name: "TheatreTransition",
    fields: &[
        FieldSpec::required(
            "action",
            FieldKind::Enum {
                values: <TheatreAction as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::optional("reason", LONG),
    ],
    rules: &[Rule {
        name: "cancel_needs_reason",
        check: cancel_needs_reason,
    }],
};

fn cancel_needs_reason(payload: &mut Map<String, Value>, ctx: &mut RuleContext<'_>) {
    require_when(
        payload,
        ctx,
        "action",
        &[TheatreAction::Cancel.as_str()],
        "reason",
    );
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TheatreTransition {
    pub action: TheatreAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<NonEmptyText>,
}

impl Contracted for TheatreTransition {
    fn contract() -> &'static Contract {
        &THEATRE_TRANSITION
    }
}

// ============================================================================
// Intra-operative record
// ============================================================================

pub static RECORD_ANESTHESIA_OBSERVATION: Contract = Contract {
    name: "RecordAnesthesiaObservation",
    fields: &[
        FieldSpec::required("observed_at", FieldKind::Timestamp),
        FieldSpec::optional(
            "vitals",
            FieldKind::Rows {
                contract: &VITAL_ROW,
                min_items: 0,
            },
        ),
        FieldSpec::optional("agent", SHORT),
        FieldSpec::optional("notes", LONG),
    ],
    rules: &[Rule {
        name: "observation_not_empty",
        check: observation_not_empty,
    }],
};

fn observation_not_empty(payload: &mut Map<String, Value>, ctx: &mut RuleContext<'_>) {
    let has_vitals = payload
        .get("vitals")
        .and_then(Value::as_array)
        .is_some_and(|rows| !rows.is_empty());
    if !has_vitals && !has(payload, "agent") && !has(payload, "notes") {
        ctx.violation("vitals", "at least one of vitals, agent or notes is required");
    }
}

/// A timed entry on the anesthesia chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordAnesthesiaObservation {
    pub observed_at: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vitals: Vec<VitalRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<NonEmptyText>,
}

impl Contracted for RecordAnesthesiaObservation {
    fn contract() -> &'static Contract {
        &RECORD_ANESTHESIA_OBSERVATION
    }
}

pub static ADD_POST_OP_NOTE: Contract = Contract {
    name: "AddPostOpNote",
    fields: &[
        FieldSpec::required("note", LONG),
        FieldSpec::optional("complications", LONG),
        FieldSpec::optional("written_at", FieldKind::Timestamp),
    ],
    rules: &[],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddPostOpNote {
    pub note: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complications: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub written_at: Option<String>,
}

impl Contracted for AddPostOpNote {
    fn contract() -> &'static Contract {
        &ADD_POST_OP_NOTE
    }
}

pub static RECORD_CHECKLIST_ATTESTATION: Contract = Contract {
    name: "RecordChecklistAttestation",
    fields: &[
        FieldSpec::required(
            "phase",
            FieldKind::Enum {
                values: <ChecklistPhase as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::required("confirmed", FieldKind::Boolean),
        FieldSpec::optional("notes", LONG),
        FieldSpec::optional("attested_at", FieldKind::Timestamp),
    ],
    rules: &[Rule {
        name: "unconfirmed_needs_notes",
        check: unconfirmed_needs_notes,
    }],
};

fn unconfirmed_needs_notes(payload: &mut Map<String, Value>, ctx: &mut RuleContext<'_>) {
    if payload.get("confirmed") == Some(&Value::Bool(false)) && !has(payload, "notes") {
        ctx.violation("notes", "is required when confirmed is false");
    }
}

/// Sign-off of one surgical safety checklist phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordChecklistAttestation {
    pub phase: ChecklistPhase,
    pub confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attested_at: Option<String>,
}

impl Contracted for RecordChecklistAttestation {
    fn contract() -> &'static Contract {
        &RECORD_CHECKLIST_ATTESTATION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schedule_collects_every_missing_field() {
        let err = ScheduleTheatreCase::parse(&json!({ "priority": "whenever" }))
            .expect_err("invalid schedule");
        let failure = err.as_validation().expect("validation failure");
        assert_eq!(
            failure.fields().collect::<Vec<_>>(),
            vec!["patient_id", "procedure_name", "priority"]
        );
    }

    #[test]
    fn schedule_normalises_priority() {
        let case = ScheduleTheatreCase::parse(&json!({
            "patient_id": "PT-9",
            "procedure_name": "Appendicectomy",
            "priority": " emergency ",
            "scheduled_at": "2024-06-01T07:30:00Z"
        }))
        .expect("valid schedule");
        assert_eq!(case.priority, TheatrePriority::Emergency);
    }

    #[test]
    fn cancelling_a_case_needs_a_reason() {
        let err = TheatreTransition::parse(&json!({ "action": "CANCEL" })).expect_err("reason");
        assert!(err.as_validation().is_some_and(|f| f.has_field("reason")));
    }

    #[test]
    fn empty_anesthesia_observation_is_rejected() {
        let err = RecordAnesthesiaObservation::parse(&json!({
            "observed_at": "2024-06-01T08:05:00Z",
            "vitals": []
        }))
        .expect_err("empty observation");
        assert!(err.as_validation().is_some_and(|f| f.has_field("vitals")));

        let ok = RecordAnesthesiaObservation::parse(&json!({
            "observed_at": "2024-06-01T08:05:00Z",
            "vitals": [{ "vital_type": "BLOOD_PRESSURE", "value": "110/70" }]
        }))
        .expect("observation with vitals");
        assert_eq!(ok.vitals[0].systolic_value, Some(110.0));
    }

    #[test]
    fn unconfirmed_checklist_needs_notes() {
        let err = RecordChecklistAttestation::parse(&json!({
            "phase": "time_out",
            "confirmed": "no"
        }))
        .expect_err("notes");
        assert!(err.as_validation().is_some_and(|f| f.has_field("notes")));

        let ok = RecordChecklistAttestation::parse(&json!({
            "phase": "SIGN_IN",
            "confirmed": true
        }))
        .expect("confirmed");
        assert_eq!(ok.phase, ChecklistPhase::SignIn);
        assert!(ok.confirmed);
    }

    #[test]
    fn unrecognised_confirmation_counts_as_missing() {
        let err = RecordChecklistAttestation::parse(&json!({
            "phase": "SIGN_OUT",
            "confirmed": "perhaps"
        }))
        .expect_err("confirmed absent");
        assert!(err.as_validation().is_some_and(|f| f.has_field("confirmed")));
    }
}
