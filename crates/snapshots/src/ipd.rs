//! Inpatient flow snapshots: admission, bed, transfers and the ward record.

use crate::common::{vitals, workflow_display_id, PatientSummary, PatientView, VitalReading};
use crate::envelope::{normalize_list, ListEnvelope};
use crate::record::{
    as_record, list, nested, normalize_each, related_name, tag, text, text_or_empty, Record,
};
use crate::timeline::{entries, merge_timeline, Timeline, TimelineEntry, TimelineEvent};
use flow_ids::{display_id_or_internal, DEFAULT_FIELDS};
use flow_types::catalog::{AdministrationStatus, IpdStage, NursingNoteType, TransferStatus};
use flow_types::{display_label, Catalog};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn bed_label(record: &Record) -> Option<String> {
    text(record, &["bed_label", "bed_number"]).or_else(|| {
        nested(record, &["bed"]).and_then(|bed| text(bed, &["label", "bed_number", "name"]))
    })
}

// ============================================================================
// Admission and bed
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionSummary {
    pub id: String,
    pub display_id: String,
    pub status: String,
    pub admission_reason: String,
    pub admitted_at: String,
    pub discharged_at: String,
}

impl AdmissionSummary {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let record = as_record(raw)?;
        Some(Self {
            id: text_or_empty(record, &["id", "admission_id"]),
            display_id: display_id_or_internal(raw, &DEFAULT_FIELDS),
            status: tag(record, &["status"]),
            admission_reason: text_or_empty(record, &["admission_reason", "reason"]),
            admitted_at: text_or_empty(record, &["admitted_at", "created_at"]),
            discharged_at: text_or_empty(record, &["discharged_at"]),
        })
    }
}

/// The bed a patient currently occupies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedAssignment {
    pub id: String,
    pub ward_id: String,
    pub ward_name: String,
    pub bed_id: String,
    pub bed_label: String,
    pub assigned_at: String,
}

impl BedAssignment {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let record = as_record(raw)?;
        Some(Self {
            id: text_or_empty(record, &["id"]),
            ward_id: text(record, &["ward_id"])
                .or_else(|| nested(record, &["ward"]).and_then(|w| text(w, &["id"])))
                .unwrap_or_default(),
            ward_name: related_name(record, &["ward"], &["ward_name"]),
            bed_id: text(record, &["bed_id"])
                .or_else(|| nested(record, &["bed"]).and_then(|b| text(b, &["id"])))
                .unwrap_or_default(),
            bed_label: bed_label(record).unwrap_or_default(),
            assigned_at: text_or_empty(record, &["assigned_at", "start_at", "created_at"]),
        })
    }
}

/// A ward transfer request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: String,
    pub transfer_status: String,
    pub from_ward_name: String,
    pub to_ward_name: String,
    pub to_bed_label: String,
    pub reason: String,
    pub requested_at: String,
    pub completed_at: String,
}

impl Transfer {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let record = as_record(raw)?;
        Some(Self {
            id: text_or_empty(record, &["id"]),
            transfer_status: tag(record, &["transfer_status", "status"]),
            from_ward_name: related_name(record, &["from_ward"], &["from_ward_name"]),
            to_ward_name: related_name(record, &["to_ward"], &["to_ward_name"]),
            to_bed_label: text(record, &["to_bed_label"])
                .or_else(|| {
                    nested(record, &["to_bed"]).and_then(|b| text(b, &["label", "bed_number"]))
                })
                .unwrap_or_default(),
            reason: text_or_empty(record, &["reason"]),
            requested_at: text_or_empty(record, &["requested_at", "created_at"]),
            completed_at: text_or_empty(record, &["completed_at"]),
        })
    }

    /// Whether the transfer still awaits completion. Unknown statuses count as closed.
    pub fn is_open(&self) -> bool {
        TransferStatus::from_wire(&self.transfer_status).is_some_and(TransferStatus::is_open)
    }
}

// ============================================================================
// Ward record
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardRound {
    pub id: String,
    pub round_at: String,
    pub notes: String,
    pub plan: String,
    pub doctor_name: String,
}

impl WardRound {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let record = as_record(raw)?;
        Some(Self {
            id: text_or_empty(record, &["id"]),
            round_at: text_or_empty(record, &["round_at", "recorded_at", "created_at"]),
            notes: text_or_empty(record, &["notes", "note", "findings"]),
            plan: text_or_empty(record, &["plan"]),
            doctor_name: related_name(record, &["doctor", "author"], &["doctor_name"]),
        })
    }
}

impl TimelineEvent for WardRound {
    fn timeline_entry(&self) -> TimelineEntry {
        let label = match (self.notes.is_empty(), self.doctor_name.is_empty()) {
            (true, true) => "Ward round".to_string(),
            (true, false) => format!("Ward round by {}", self.doctor_name),
            (false, _) => format!("Ward round: {}", self.notes),
        };
        TimelineEntry::new("WARD_ROUND", self.round_at.clone(), label)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NursingNote {
    pub id: String,
    pub noted_at: String,
    pub note: String,
    pub note_type: String,
    pub nurse_name: String,
}

impl NursingNote {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let record = as_record(raw)?;
        Some(Self {
            id: text_or_empty(record, &["id"]),
            noted_at: text_or_empty(record, &["noted_at", "recorded_at", "created_at"]),
            note: text_or_empty(record, &["note", "notes", "content"]),
            note_type: tag(record, &["note_type", "type"]),
            nurse_name: related_name(record, &["nurse", "author"], &["nurse_name"]),
        })
    }
}

impl TimelineEvent for NursingNote {
    fn timeline_entry(&self) -> TimelineEntry {
        let heading = match display_label::<NursingNoteType>(&self.note_type) {
            kind if kind.is_empty() => "Nursing note".to_string(),
            kind => format!("Nursing note ({})", kind.to_lowercase()),
        };
        let label = if self.note.is_empty() {
            heading
        } else {
            format!("{heading}: {}", self.note)
        };
        TimelineEntry::new("NURSING_NOTE", self.noted_at.clone(), label)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationAdministration {
    pub id: String,
    pub administered_at: String,
    pub medication_name: String,
    pub dose: String,
    pub route: String,
    pub status: String,
    pub reason: String,
    pub administered_by: String,
}

impl MedicationAdministration {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let record = as_record(raw)?;
        Some(Self {
            id: text_or_empty(record, &["id"]),
            administered_at: text_or_empty(
                record,
                &["administered_at", "given_at", "recorded_at", "created_at"],
            ),
            medication_name: text(record, &["medication_name", "drug_name"])
                .or_else(|| nested(record, &["medication"]).and_then(|m| text(m, &["name"])))
                .unwrap_or_default(),
            dose: text_or_empty(record, &["dose", "dosage"]),
            route: tag(record, &["route"]),
            status: tag(record, &["status"]),
            reason: text_or_empty(record, &["reason"]),
            administered_by: related_name(
                record,
                &["administered_by", "nurse"],
                &["administered_by_name", "administered_by"],
            ),
        })
    }
}

impl TimelineEvent for MedicationAdministration {
    fn timeline_entry(&self) -> TimelineEntry {
        let medication = [self.medication_name.as_str(), self.dose.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let medication = if medication.is_empty() {
            "Medication".to_string()
        } else {
            medication
        };
        let label = match display_label::<AdministrationStatus>(&self.status) {
            status if status.is_empty() => medication,
            status => format!("{medication}: {}", status.to_lowercase()),
        };
        TimelineEntry::new("MEDICATION_ADMINISTRATION", self.administered_at.clone(), label)
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Canonical view of one inpatient flow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IpdFlowSnapshot {
    pub id: String,
    pub display_id: String,
    pub stage: String,
    pub stage_label: String,
    pub patient: Option<PatientSummary>,
    pub patient_name: String,
    pub patient_display_id: String,
    pub admission: Option<AdmissionSummary>,
    pub active_bed_assignment: Option<BedAssignment>,
    pub has_active_bed: bool,
    pub ward_name: String,
    pub bed_label: String,
    pub transfers: Vec<Transfer>,
    pub pending_transfer: Option<Transfer>,
    pub has_pending_transfer: bool,
    pub ward_rounds: Vec<WardRound>,
    pub nursing_notes: Vec<NursingNote>,
    pub medication_administrations: Vec<MedicationAdministration>,
    pub vitals: Vec<VitalReading>,
    pub admitted_at: String,
    pub discharged_at: String,
    pub timeline: Vec<TimelineEntry>,
}

impl Timeline for IpdFlowSnapshot {
    fn to_timeline(&self) -> Vec<TimelineEntry> {
        merge_timeline([
            entries(&self.ward_rounds),
            entries(&self.nursing_notes),
            entries(&self.medication_administrations),
            entries(&self.vitals),
        ])
    }
}

/// Normalises one inpatient flow. `None` only when `raw` is not a JSON object.
pub fn normalize_ipd_flow_snapshot(raw: &Value) -> Option<IpdFlowSnapshot> {
    let record = as_record(raw)?;
    let admission = record.get("admission").and_then(AdmissionSummary::from_raw);
    let bed = ["active_bed_assignment", "current_bed_assignment", "bed_assignment"]
        .iter()
        .find_map(|key| record.get(*key).and_then(BedAssignment::from_raw));

    let id = text(record, &["id", "flow_id"])
        .or_else(|| admission.as_ref().map(|a| a.id.clone()))
        .unwrap_or_default();
    let display_id = workflow_display_id(raw, record.get("admission"), &id);

    let stage = tag(record, &["stage", "current_stage", "status"]);
    let patient = PatientView::from_record(record);

    let ward_name = bed
        .as_ref()
        .and_then(|b| non_empty(b.ward_name.clone()))
        .or_else(|| text(record, &["ward_name"]))
        .or_else(|| non_empty(related_name(record, &["ward"], &[])))
        .unwrap_or_default();
    let bed_label = bed
        .as_ref()
        .and_then(|b| non_empty(b.bed_label.clone()))
        .or_else(|| bed_label(record))
        .unwrap_or_default();

    let transfers = normalize_each(list(record, &["transfers"]), Transfer::from_raw);
    let pending_transfer = record
        .get("pending_transfer")
        .and_then(Transfer::from_raw)
        .or_else(|| transfers.iter().find(|t| t.is_open()).cloned());

    let admitted_at = text(record, &["admitted_at"])
        .or_else(|| admission.as_ref().and_then(|a| non_empty(a.admitted_at.clone())))
        .unwrap_or_default();
    let discharged_at = text(record, &["discharged_at"])
        .or_else(|| admission.as_ref().and_then(|a| non_empty(a.discharged_at.clone())))
        .unwrap_or_default();

    let mut snapshot = IpdFlowSnapshot {
        id,
        display_id,
        stage_label: display_label::<IpdStage>(&stage),
        stage,
        patient: patient.patient,
        patient_name: patient.name,
        patient_display_id: patient.display_id,
        admission,
        has_active_bed: bed.is_some(),
        active_bed_assignment: bed,
        ward_name,
        bed_label,
        transfers,
        has_pending_transfer: pending_transfer.is_some(),
        pending_transfer,
        ward_rounds: normalize_each(list(record, &["ward_rounds", "rounds"]), WardRound::from_raw),
        nursing_notes: normalize_each(list(record, &["nursing_notes"]), NursingNote::from_raw),
        medication_administrations: normalize_each(
            list(
                record,
                &["medication_administrations", "administrations", "mar"],
            ),
            MedicationAdministration::from_raw,
        ),
        vitals: vitals(record, &["admission"]),
        admitted_at,
        discharged_at,
        timeline: Vec::new(),
    };
    snapshot.timeline = snapshot.to_timeline();
    Some(snapshot)
}

/// Normalises an inpatient list response (bare array or wrapped).
pub fn normalize_ipd_flow_list(raw: &Value) -> ListEnvelope<IpdFlowSnapshot> {
    normalize_list(raw, normalize_ipd_flow_snapshot)
}
