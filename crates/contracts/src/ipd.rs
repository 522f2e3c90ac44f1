//! Inpatient (IPD) flow contracts: admission, beds, transfers, rounds, nursing and medication.

use crate::schema::{
    has, require_when, tag, Contract, DefaultValue, FieldKind, FieldSpec, Rule, RuleContext,
};
use crate::shared::{Paging, LIMIT, LONG, PAGE, SEARCH, SHORT};
use crate::Contracted;
use flow_ids::FlowId;
use flow_types::catalog::{
    AdministrationStatus, IpdAction, IpdStage, MedicationRoute, NursingNoteType, QueueScope,
    TransferAction,
};
use flow_types::{Catalog, NonEmptyText};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub static IPD_FLOW_LIST_PARAMS: Contract = Contract {
    name: "IpdFlowListParams",
    fields: &[
        PAGE,
        LIMIT,
        SEARCH,
        FieldSpec::optional(
            "stage",
            FieldKind::Enum {
                values: <IpdStage as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::optional("ward_id", FieldKind::Identifier),
        FieldSpec::optional("has_active_bed", FieldKind::Boolean),
        FieldSpec::optional(
            "queue_scope",
            FieldKind::Enum {
                values: <QueueScope as Catalog>::WIRE_VALUES,
            },
        )
        .or_default(DefaultValue::Text("ACTIVE")),
    ],
    rules: &[],
};

fn default_queue_scope() -> QueueScope {
    QueueScope::Active
}

/// Filters for the inpatient queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpdFlowListParams {
    #[serde(flatten)]
    pub paging: Paging,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<IpdStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ward_id: Option<FlowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_active_bed: Option<bool>,
    #[serde(default = "default_queue_scope")]
    pub queue_scope: QueueScope,
}

impl Contracted for IpdFlowListParams {
    fn contract() -> &'static Contract {
        &IPD_FLOW_LIST_PARAMS
    }
}

pub static START_IPD_FLOW: Contract = Contract {
    name: "StartIpdFlow",
    fields: &[
        FieldSpec::required("patient_id", FieldKind::Identifier),
        FieldSpec::optional("encounter_id", FieldKind::Identifier),
        FieldSpec::optional("ward_id", FieldKind::Identifier),
        FieldSpec::optional("admitting_doctor_id", FieldKind::Identifier),
        FieldSpec::optional("admission_reason", LONG),
        FieldSpec::optional("admitted_at", FieldKind::Timestamp),
    ],
    rules: &[],
};

/// Admits a patient, opening an inpatient flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StartIpdFlow {
    pub patient_id: FlowId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter_id: Option<FlowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ward_id: Option<FlowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admitting_doctor_id: Option<FlowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_reason: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admitted_at: Option<String>,
}

impl Contracted for StartIpdFlow {
    fn contract() -> &'static Contract {
        &START_IPD_FLOW
    }
}

// ============================================================================
// Beds and transfers
// ============================================================================

pub static ASSIGN_BED: Contract = Contract {
    name: "AssignBed",
    fields: &[
        FieldSpec::required("bed_id", FieldKind::Identifier),
        FieldSpec::optional("ward_id", FieldKind::Identifier),
        FieldSpec::optional("assigned_at", FieldKind::Timestamp),
    ],
    rules: &[],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignBed {
    pub bed_id: FlowId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ward_id: Option<FlowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<String>,
}

impl Contracted for AssignBed {
    fn contract() -> &'static Contract {
        &ASSIGN_BED
    }
}

pub static REQUEST_TRANSFER: Contract = Contract {
    name: "RequestTransfer",
    fields: &[
        FieldSpec::required("to_ward_id", FieldKind::Identifier),
        FieldSpec::optional("to_bed_id", FieldKind::Identifier),
        FieldSpec::required("reason", LONG),
    ],
    rules: &[],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestTransfer {
    pub to_ward_id: FlowId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_bed_id: Option<FlowId>,
    pub reason: NonEmptyText,
}

impl Contracted for RequestTransfer {
    fn contract() -> &'static Contract {
        &REQUEST_TRANSFER
    }
}

pub static UPDATE_TRANSFER: Contract = Contract {
    name: "UpdateTransfer",
    fields: &[
        FieldSpec::required(
            "action",
            FieldKind::Enum {
                values: <TransferAction as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::optional("to_bed_id", FieldKind::Identifier),
        FieldSpec::optional("reason", LONG),
    ],
    rules: &[
        Rule {
            name: "complete_needs_bed",
            check: complete_needs_bed,
        },
        Rule {
            name: "reject_needs_reason",
            check: reject_needs_reason,
        },
    ],
};

fn complete_needs_bed(payload: &mut Map<String, Value>, ctx: &mut RuleContext<'_>) {
    require_when(
        payload,
        ctx,
        "action",
        &[TransferAction::Complete.as_str()],
        "to_bed_id",
    );
}

fn reject_needs_reason(payload: &mut Map<String, Value>, ctx: &mut RuleContext<'_>) {
    require_when(
        payload,
        ctx,
        "action",
        &[TransferAction::Reject.as_str()],
        "reason",
    );
}

/// Approves, rejects, completes or cancels a pending ward transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTransfer {
    pub action: TransferAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_bed_id: Option<FlowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<NonEmptyText>,
}

impl Contracted for UpdateTransfer {
    fn contract() -> &'static Contract {
        &UPDATE_TRANSFER
    }
}

// ============================================================================
// Clinical entries
// ============================================================================

pub static ADD_WARD_ROUND: Contract = Contract {
    name: "AddWardRound",
    fields: &[
        FieldSpec::required("notes", LONG),
        FieldSpec::optional("plan", LONG),
        FieldSpec::optional("doctor_id", FieldKind::Identifier),
        FieldSpec::optional("round_at", FieldKind::Timestamp),
    ],
    rules: &[],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddWardRound {
    pub notes: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<FlowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_at: Option<String>,
}

impl Contracted for AddWardRound {
    fn contract() -> &'static Contract {
        &ADD_WARD_ROUND
    }
}

pub static ADD_NURSING_NOTE: Contract = Contract {
    name: "AddNursingNote",
    fields: &[
        FieldSpec::required("note", LONG),
        FieldSpec::optional(
            "note_type",
            FieldKind::Enum {
                values: <NursingNoteType as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::optional("noted_at", FieldKind::Timestamp),
    ],
    rules: &[],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddNursingNote {
    pub note: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_type: Option<NursingNoteType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noted_at: Option<String>,
}

impl Contracted for AddNursingNote {
    fn contract() -> &'static Contract {
        &ADD_NURSING_NOTE
    }
}

pub static RECORD_MEDICATION_ADMINISTRATION: Contract = Contract {
    name: "RecordMedicationAdministration",
    fields: &[
        FieldSpec::required("medication_name", SHORT),
        FieldSpec::required("dose", SHORT),
        FieldSpec::optional(
            "route",
            FieldKind::Enum {
                values: <MedicationRoute as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::required(
            "status",
            FieldKind::Enum {
                values: <AdministrationStatus as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::required("administered_at", FieldKind::Timestamp),
        FieldSpec::optional("prescription_id", FieldKind::Identifier),
        FieldSpec::optional("reason", LONG),
    ],
    rules: &[Rule {
        name: "withheld_dose_needs_reason",
        check: withheld_dose_needs_reason,
    }],
};

fn withheld_dose_needs_reason(payload: &mut Map<String, Value>, ctx: &mut RuleContext<'_>) {
    if let Some(status) = tag(payload, "status") {
        if status != AdministrationStatus::Given.as_str() && !has(payload, "reason") {
            let reason = format!("is required when status is {status}");
            ctx.violation("reason", reason);
        }
    }
}

/// Records a medication round outcome (given, held, refused or missed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordMedicationAdministration {
    pub medication_name: NonEmptyText,
    pub dose: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<MedicationRoute>,
    pub status: AdministrationStatus,
    pub administered_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prescription_id: Option<FlowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<NonEmptyText>,
}

impl Contracted for RecordMedicationAdministration {
    fn contract() -> &'static Contract {
        &RECORD_MEDICATION_ADMINISTRATION
    }
}

// ============================================================================
// Transitions
// ============================================================================

pub static IPD_TRANSITION: Contract = Contract {
    name: "IpdTransition",
    fields: &[
        FieldSpec::required(
            "action",
            FieldKind::Enum {
                values: <IpdAction as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::optional("expected_discharge_at", FieldKind::Timestamp),
        FieldSpec::optional("discharge_summary", LONG),
        FieldSpec::optional("reason", LONG),
    ],
    rules: &[
        Rule {
            name: "plan_discharge_needs_date",
            check: plan_discharge_needs_date,
        },
        Rule {
            name: "finalize_discharge_needs_summary",
            check: finalize_discharge_needs_summary,
        },
    ],
};

fn plan_discharge_needs_date(payload: &mut Map<String, Value>, ctx: &mut RuleContext<'_>) {
    require_when(
        payload,
        ctx,
        "action",
        &[IpdAction::PlanDischarge.as_str()],
        "expected_discharge_at",
    );
}

fn finalize_discharge_needs_summary(payload: &mut Map<String, Value>, ctx: &mut RuleContext<'_>) {
    require_when(
        payload,
        ctx,
        "action",
        &[IpdAction::FinalizeDischarge.as_str()],
        "discharge_summary",
    );
}

/// Discharge planning and admission cancellation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IpdTransition {
    pub action: IpdAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_discharge_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discharge_summary: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<NonEmptyText>,
}

impl Contracted for IpdTransition {
    fn contract() -> &'static Contract {
        &IPD_TRANSITION
    }
}
