//! Outpatient (OPD) flow contracts.

use crate::schema::{require_when, Contract, FieldKind, FieldSpec, Rule, RuleContext};
use crate::shared::{Paging, LIMIT, LONG, PAGE, SEARCH};
use crate::Contracted;
use flow_ids::FlowId;
use flow_types::catalog::{ArrivalMode, OpdAction, OpdStage, PaymentMethod, TriageLevel};
use flow_types::{Catalog, NonEmptyText};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub static OPD_FLOW_LIST_PARAMS: Contract = Contract {
    name: "OpdFlowListParams",
    fields: &[
        PAGE,
        LIMIT,
        SEARCH,
        FieldSpec::optional(
            "stage",
            FieldKind::Enum {
                values: <OpdStage as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::optional("doctor_id", FieldKind::Identifier),
    ],
    rules: &[],
};

/// Filters for the outpatient queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpdFlowListParams {
    #[serde(flatten)]
    pub paging: Paging,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<OpdStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<FlowId>,
}

impl Contracted for OpdFlowListParams {
    fn contract() -> &'static Contract {
        &OPD_FLOW_LIST_PARAMS
    }
}

pub static START_OPD_FLOW: Contract = Contract {
    name: "StartOpdFlow",
    fields: &[
        FieldSpec::required("patient_id", FieldKind::Identifier),
        FieldSpec::required(
            "arrival_mode",
            FieldKind::Enum {
                values: <ArrivalMode as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::optional(
            "payment_method",
            FieldKind::Enum {
                values: <PaymentMethod as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::optional("insurance_scheme_id", FieldKind::Identifier),
        FieldSpec::optional(
            "triage_level",
            FieldKind::Enum {
                values: <TriageLevel as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::optional("appointment_id", FieldKind::Identifier),
        FieldSpec::optional("notes", LONG),
    ],
    rules: &[
        Rule {
            name: "insurance_needs_scheme",
            check: insurance_needs_scheme,
        },
        Rule {
            name: "appointment_needs_reference",
            check: appointment_needs_reference,
        },
    ],
};

fn insurance_needs_scheme(payload: &mut Map<String, Value>, ctx: &mut RuleContext<'_>) {
    require_when(
        payload,
        ctx,
        "payment_method",
        &[PaymentMethod::Insurance.as_str()],
        "insurance_scheme_id",
    );
}

fn appointment_needs_reference(payload: &mut Map<String, Value>, ctx: &mut RuleContext<'_>) {
    require_when(
        payload,
        ctx,
        "arrival_mode",
        &[ArrivalMode::Appointment.as_str()],
        "appointment_id",
    );
}

/// Registers a patient's arrival and opens an outpatient flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StartOpdFlow {
    pub patient_id: FlowId,
    pub arrival_mode: ArrivalMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_scheme_id: Option<FlowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triage_level: Option<TriageLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<FlowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<NonEmptyText>,
}

impl Contracted for StartOpdFlow {
    fn contract() -> &'static Contract {
        &START_OPD_FLOW
    }
}

pub static OPD_TRANSITION: Contract = Contract {
    name: "OpdTransition",
    fields: &[
        FieldSpec::required(
            "action",
            FieldKind::Enum {
                values: <OpdAction as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::optional("doctor_id", FieldKind::Identifier),
        FieldSpec::optional("reason", LONG),
        FieldSpec::optional("notes", LONG),
    ],
    rules: &[
        Rule {
            name: "assign_doctor_needs_doctor",
            check: assign_doctor_needs_doctor,
        },
        Rule {
            name: "cancel_needs_reason",
            check: cancel_needs_reason,
        },
    ],
};

fn assign_doctor_needs_doctor(payload: &mut Map<String, Value>, ctx: &mut RuleContext<'_>) {
    require_when(
        payload,
        ctx,
        "action",
        &[OpdAction::AssignDoctor.as_str()],
        "doctor_id",
    );
}

fn cancel_needs_reason(payload: &mut Map<String, Value>, ctx: &mut RuleContext<'_>) {
    require_when(
        payload,
        ctx,
        "action",
        &[OpdAction::Cancel.as_str()],
        "reason",
    );
}

/// Moves an outpatient flow along its stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpdTransition {
    pub action: OpdAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<FlowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<NonEmptyText>,
}

impl Contracted for OpdTransition {
    fn contract() -> &'static Contract {
        &OPD_TRANSITION
    }
}
