//! Declarative stage and transition catalogs for the four workflow domains.
//!
//! Each catalog is a closed set of uppercase wire values with a human label. The same catalogs
//! drive payload validation (enumerations are closed, unknown values are violations) and
//! snapshot display (`stage_label`, `status_label`).
//!
//! Action catalogs map every action to the stage the remote service is expected to move the
//! workflow into. That mapping is informational only: transition legality is decided by the
//! service, never here.

use crate::{canonical_tag, CatalogError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Common behaviour of every closed catalog.
pub trait Catalog: Copy + Sized + 'static {
    /// Catalog name used in error messages.
    const NAME: &'static str;

    /// Every wire value, in declaration order.
    const WIRE_VALUES: &'static [&'static str];

    /// Looks up a catalog value by its exact canonical wire value.
    fn from_wire(value: &str) -> Option<Self>;

    /// The canonical wire value.
    fn as_str(self) -> &'static str;

    /// Human-readable label.
    fn label(self) -> &'static str;
}

/// Produces a display label for an enum-like tag.
///
/// Known catalog values use their declared label. Unknown values are humanised
/// (`"AWAITING_THEATRE_SLOT"` becomes `"Awaiting theatre slot"`) so a stage introduced
/// server-side still renders. An empty tag yields an empty label.
pub fn display_label<C: Catalog>(tag: &str) -> String {
    let tag = canonical_tag(tag);
    if tag.is_empty() {
        return String::new();
    }
    if let Some(known) = C::from_wire(&tag) {
        return known.label().to_string();
    }
    humanise(&tag)
}

fn humanise(tag: &str) -> String {
    let words = tag
        .split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ");

    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

macro_rules! catalog {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $variant:ident => ($wire:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[doc = $label]
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl Catalog for $name {
            const NAME: &'static str = stringify!($name);
            const WIRE_VALUES: &'static [&'static str] = &[$($wire),+];

            fn from_wire(value: &str) -> Option<Self> {
                match value {
                    $($wire => Some(Self::$variant),)+
                    _ => None,
                }
            }

            fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(Catalog::as_str(*self))
            }
        }

        impl FromStr for $name {
            type Err = CatalogError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as Catalog>::from_wire(&canonical_tag(s)).ok_or_else(|| {
                    CatalogError::Unknown {
                        catalog: <Self as Catalog>::NAME,
                        value: s.to_string(),
                    }
                })
            }
        }
    };
}

// ============================================================================
// Shared catalogs
// ============================================================================

catalog! {
    /// The four workflow domains handled by the engine.
    WorkflowDomain {
        Opd => ("OPD", "Outpatient"),
        Ipd => ("IPD", "Inpatient"),
        Theatre => ("THEATRE", "Theatre"),
        Pharmacy => ("PHARMACY", "Pharmacy"),
    }
}

catalog! {
    /// How a bill is settled.
    PaymentMethod {
        Cash => ("CASH", "Cash"),
        Insurance => ("INSURANCE", "Insurance"),
        MobileMoney => ("MOBILE_MONEY", "Mobile money"),
        Card => ("CARD", "Card"),
        Corporate => ("CORPORATE", "Corporate account"),
        Waiver => ("WAIVER", "Waiver"),
    }
}

impl PaymentMethod {
    /// Electronic methods that always leave a transaction reference behind.
    pub fn needs_reference(self) -> bool {
        matches!(self, PaymentMethod::MobileMoney | PaymentMethod::Card)
    }
}

catalog! {
    /// Triage acuity, most urgent first.
    TriageLevel {
        Immediate => ("IMMEDIATE", "Immediate"),
        Emergency => ("EMERGENCY", "Emergency"),
        Urgent => ("URGENT", "Urgent"),
        Standard => ("STANDARD", "Standard"),
        NonUrgent => ("NON_URGENT", "Non-urgent"),
    }
}

catalog! {
    /// Vital sign kinds accepted on vitals rows.
    VitalType {
        Temperature => ("TEMPERATURE", "Temperature"),
        Pulse => ("PULSE", "Pulse"),
        RespiratoryRate => ("RESPIRATORY_RATE", "Respiratory rate"),
        BloodPressure => ("BLOOD_PRESSURE", "Blood pressure"),
        OxygenSaturation => ("OXYGEN_SATURATION", "Oxygen saturation"),
        Weight => ("WEIGHT", "Weight"),
        Height => ("HEIGHT", "Height"),
        BloodGlucose => ("BLOOD_GLUCOSE", "Blood glucose"),
        PainScore => ("PAIN_SCORE", "Pain score"),
    }
}

// ============================================================================
// OPD
// ============================================================================

catalog! {
    /// How the patient arrived at the outpatient department.
    ArrivalMode {
        WalkIn => ("WALK_IN", "Walk-in"),
        Appointment => ("APPOINTMENT", "Appointment"),
        Referral => ("REFERRAL", "Referral"),
        Emergency => ("EMERGENCY", "Emergency"),
    }
}

catalog! {
    /// Outpatient flow stages.
    OpdStage {
        Registered => ("REGISTERED", "Registered"),
        WaitingTriage => ("WAITING_TRIAGE", "Waiting for triage"),
        WaitingConsultation => ("WAITING_CONSULTATION", "Waiting for consultation"),
        InConsultation => ("IN_CONSULTATION", "In consultation"),
        WaitingLab => ("WAITING_LAB", "Waiting for lab results"),
        WaitingPharmacy => ("WAITING_PHARMACY", "Waiting at pharmacy"),
        WaitingBilling => ("WAITING_BILLING", "Waiting for billing"),
        AdmissionRequested => ("ADMISSION_REQUESTED", "Admission requested"),
        Completed => ("COMPLETED", "Completed"),
        Cancelled => ("CANCELLED", "Cancelled"),
    }
}

catalog! {
    /// Outpatient flow actions.
    OpdAction {
        SendToTriage => ("SEND_TO_TRIAGE", "Send to triage"),
        QueueForConsultation => ("QUEUE_FOR_CONSULTATION", "Queue for consultation"),
        AssignDoctor => ("ASSIGN_DOCTOR", "Assign doctor"),
        StartConsultation => ("START_CONSULTATION", "Start consultation"),
        RequestLab => ("REQUEST_LAB", "Request lab work"),
        SendToPharmacy => ("SEND_TO_PHARMACY", "Send to pharmacy"),
        SendToBilling => ("SEND_TO_BILLING", "Send to billing"),
        RequestAdmission => ("REQUEST_ADMISSION", "Request admission"),
        Complete => ("COMPLETE", "Complete visit"),
        Cancel => ("CANCEL", "Cancel visit"),
    }
}

// ============================================================================
// IPD
// ============================================================================

catalog! {
    /// Inpatient flow stages.
    IpdStage {
        AwaitingBed => ("AWAITING_BED", "Awaiting bed"),
        AdmittedInBed => ("ADMITTED_IN_BED", "Admitted in bed"),
        TransferPending => ("TRANSFER_PENDING", "Transfer pending"),
        DischargePlanned => ("DISCHARGE_PLANNED", "Discharge planned"),
        Discharged => ("DISCHARGED", "Discharged"),
        Cancelled => ("CANCELLED", "Cancelled"),
    }
}

catalog! {
    /// Inpatient flow actions.
    IpdAction {
        PlanDischarge => ("PLAN_DISCHARGE", "Plan discharge"),
        CancelDischargePlan => ("CANCEL_DISCHARGE_PLAN", "Cancel discharge plan"),
        FinalizeDischarge => ("FINALIZE_DISCHARGE", "Finalize discharge"),
        CancelAdmission => ("CANCEL_ADMISSION", "Cancel admission"),
    }
}

catalog! {
    /// Which part of the inpatient queue a list request targets.
    QueueScope {
        Active => ("ACTIVE", "Active admissions"),
        Discharged => ("DISCHARGED", "Discharged"),
        All => ("ALL", "All admissions"),
    }
}

catalog! {
    /// Actions available on a ward transfer request.
    TransferAction {
        Approve => ("APPROVE", "Approve transfer"),
        Reject => ("REJECT", "Reject transfer"),
        Complete => ("COMPLETE", "Complete transfer"),
        Cancel => ("CANCEL", "Cancel transfer"),
    }
}

catalog! {
    /// Lifecycle of a ward transfer request.
    TransferStatus {
        Pending => ("PENDING", "Pending"),
        Approved => ("APPROVED", "Approved"),
        Rejected => ("REJECTED", "Rejected"),
        Completed => ("COMPLETED", "Completed"),
        Cancelled => ("CANCELLED", "Cancelled"),
    }
}

impl TransferStatus {
    /// Whether the transfer still awaits completion.
    pub fn is_open(self) -> bool {
        matches!(self, TransferStatus::Pending | TransferStatus::Approved)
    }
}

catalog! {
    /// Nursing note categories.
    NursingNoteType {
        General => ("GENERAL", "General"),
        Handover => ("HANDOVER", "Handover"),
        Incident => ("INCIDENT", "Incident"),
        CarePlan => ("CARE_PLAN", "Care plan"),
    }
}

catalog! {
    /// Medication administration routes.
    MedicationRoute {
        Oral => ("ORAL", "Oral"),
        Intravenous => ("IV", "Intravenous"),
        Intramuscular => ("IM", "Intramuscular"),
        Subcutaneous => ("SC", "Subcutaneous"),
        Topical => ("TOPICAL", "Topical"),
        Inhaled => ("INHALED", "Inhaled"),
        Rectal => ("RECTAL", "Rectal"),
        Other => ("OTHER", "Other"),
    }
}

catalog! {
    /// Outcome of a scheduled medication administration.
    AdministrationStatus {
        Given => ("GIVEN", "Given"),
        Held => ("HELD", "Held"),
        Refused => ("REFUSED", "Refused"),
        Missed => ("MISSED", "Missed"),
    }
}

// ============================================================================
// Theatre
// ============================================================================

catalog! {
    /// Theatre case stages.
    TheatreStage {
        Scheduled => ("SCHEDULED", "Scheduled"),
        PreOp => ("PRE_OP", "Pre-operative"),
        InAnesthesia => ("IN_ANESTHESIA", "In anesthesia"),
        InSurgery => ("IN_SURGERY", "In surgery"),
        InRecovery => ("IN_RECOVERY", "In recovery"),
        Completed => ("COMPLETED", "Completed"),
        Cancelled => ("CANCELLED", "Cancelled"),
    }
}

catalog! {
    /// Theatre case actions.
    TheatreAction {
        SendToPreOp => ("SEND_TO_PRE_OP", "Send to pre-op"),
        StartAnesthesia => ("START_ANESTHESIA", "Start anesthesia"),
        StartSurgery => ("START_SURGERY", "Start surgery"),
        EndSurgery => ("END_SURGERY", "End surgery"),
        Complete => ("COMPLETE", "Discharge from recovery"),
        Cancel => ("CANCEL", "Cancel case"),
    }
}

catalog! {
    /// Surgical priority.
    TheatrePriority {
        Elective => ("ELECTIVE", "Elective"),
        Urgent => ("URGENT", "Urgent"),
        Emergency => ("EMERGENCY", "Emergency"),
    }
}

catalog! {
    /// Surgical safety checklist phases.
    ChecklistPhase {
        SignIn => ("SIGN_IN", "Sign in"),
        TimeOut => ("TIME_OUT", "Time out"),
        SignOut => ("SIGN_OUT", "Sign out"),
    }
}

// ============================================================================
// Pharmacy
// ============================================================================

catalog! {
    /// Pharmacy order statuses.
    PharmacyStatus {
        Pending => ("PENDING", "Pending"),
        Verified => ("VERIFIED", "Verified"),
        Prepared => ("PREPARED", "Prepared"),
        PartiallyDispensed => ("PARTIALLY_DISPENSED", "Partially dispensed"),
        Dispensed => ("DISPENSED", "Dispensed"),
        Cancelled => ("CANCELLED", "Cancelled"),
        Returned => ("RETURNED", "Returned"),
    }
}

catalog! {
    /// Pharmacy order actions other than dispensing.
    PharmacyAction {
        Verify => ("VERIFY", "Verify order"),
        Prepare => ("PREPARE", "Prepare order"),
        Cancel => ("CANCEL", "Cancel order"),
        Return => ("RETURN", "Return to stock"),
    }
}

catalog! {
    /// Where a pharmacy order originated.
    OrderSource {
        Opd => ("OPD", "Outpatient"),
        Ipd => ("IPD", "Inpatient"),
        Theatre => ("THEATRE", "Theatre"),
        WalkIn => ("WALK_IN", "Walk-in"),
    }
}
