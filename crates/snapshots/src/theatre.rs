//! Theatre case snapshots: the perioperative record and the safety checklist.

use crate::common::{workflow_display_id, PatientSummary, PatientView, VitalReading};
use crate::envelope::{normalize_list, ListEnvelope};
use crate::record::{
    as_record, flag, list, nested, nested_value, normalize_each, related_name, tag, text,
    text_or_empty,
};
use crate::timeline::{entries, merge_timeline, Timeline, TimelineEntry, TimelineEvent};
use flow_types::catalog::{ChecklistPhase, TheatreStage};
use flow_types::{display_label, Catalog};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn labelled(heading: &str, detail: &[&str]) -> String {
    let detail = detail
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    if detail.is_empty() {
        heading.to_string()
    } else {
        format!("{heading}: {detail}")
    }
}

/// Intra-operative observation taken by the anesthetist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnesthesiaObservation {
    pub id: String,
    pub observed_at: String,
    pub agent: String,
    pub notes: String,
    pub vitals: Vec<VitalReading>,
}

impl AnesthesiaObservation {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let record = as_record(raw)?;
        Some(Self {
            id: text_or_empty(record, &["id"]),
            observed_at: text_or_empty(record, &["observed_at", "recorded_at", "created_at"]),
            agent: text_or_empty(record, &["agent", "anesthetic_agent"]),
            notes: text_or_empty(record, &["notes", "note"]),
            vitals: normalize_each(
                list(record, &["vitals", "vital_signs"]),
                VitalReading::from_raw,
            ),
        })
    }
}

impl TimelineEvent for AnesthesiaObservation {
    fn timeline_entry(&self) -> TimelineEntry {
        let readings = self.vitals.iter().map(VitalReading::label).collect::<Vec<_>>();
        let mut detail = vec![self.agent.as_str(), self.notes.as_str()];
        detail.extend(readings.iter().map(String::as_str));
        TimelineEntry::new(
            "ANESTHESIA_OBSERVATION",
            self.observed_at.clone(),
            labelled("Anesthesia observation", &detail),
        )
    }
}

/// The anesthesia record for the case (technique and agent).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnesthesiaRecord {
    pub id: String,
    pub recorded_at: String,
    pub technique: String,
    pub agent: String,
    pub notes: String,
    pub anesthetist_name: String,
}

impl AnesthesiaRecord {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let record = as_record(raw)?;
        Some(Self {
            id: text_or_empty(record, &["id"]),
            recorded_at: text_or_empty(record, &["recorded_at", "created_at"]),
            technique: text_or_empty(record, &["technique", "anesthesia_type"]),
            agent: text_or_empty(record, &["agent", "anesthetic_agent"]),
            notes: text_or_empty(record, &["notes", "note"]),
            anesthetist_name: related_name(
                record,
                &["anesthetist", "recorded_by"],
                &["anesthetist_name"],
            ),
        })
    }
}

impl TimelineEvent for AnesthesiaRecord {
    fn timeline_entry(&self) -> TimelineEntry {
        TimelineEntry::new(
            "ANESTHESIA_RECORD",
            self.recorded_at.clone(),
            labelled(
                "Anesthesia",
                &[self.technique.as_str(), self.agent.as_str(), self.notes.as_str()],
            ),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostOpNote {
    pub id: String,
    pub written_at: String,
    pub note: String,
    pub complications: String,
    pub author_name: String,
}

impl PostOpNote {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let record = as_record(raw)?;
        Some(Self {
            id: text_or_empty(record, &["id"]),
            written_at: text_or_empty(record, &["written_at", "recorded_at", "created_at"]),
            note: text_or_empty(record, &["note", "notes", "content"]),
            complications: text_or_empty(record, &["complications"]),
            author_name: related_name(record, &["author", "surgeon"], &["author_name"]),
        })
    }
}

impl TimelineEvent for PostOpNote {
    fn timeline_entry(&self) -> TimelineEntry {
        let complications = if self.complications.is_empty() {
            String::new()
        } else {
            format!("complications: {}", self.complications)
        };
        TimelineEntry::new(
            "POST_OP_NOTE",
            self.written_at.clone(),
            labelled("Post-op note", &[self.note.as_str(), complications.as_str()]),
        )
    }
}

/// One surgical safety checklist sign-off.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistAttestation {
    pub id: String,
    pub phase: String,
    pub confirmed: bool,
    pub notes: String,
    pub attested_at: String,
    pub attested_by: String,
}

impl ChecklistAttestation {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let record = as_record(raw)?;
        Some(Self {
            id: text_or_empty(record, &["id"]),
            phase: tag(record, &["phase", "checklist_phase"]),
            confirmed: flag(record, &["confirmed", "is_confirmed"]).unwrap_or(false),
            notes: text_or_empty(record, &["notes", "note"]),
            attested_at: text_or_empty(record, &["attested_at", "recorded_at", "created_at"]),
            attested_by: related_name(
                record,
                &["attested_by", "user"],
                &["attested_by_name", "attested_by"],
            ),
        })
    }
}

impl TimelineEvent for ChecklistAttestation {
    fn timeline_entry(&self) -> TimelineEntry {
        let phase = match display_label::<ChecklistPhase>(&self.phase) {
            phase if phase.is_empty() => "Checklist".to_string(),
            phase => format!("Checklist {}", phase.to_lowercase()),
        };
        let outcome = if self.confirmed {
            "confirmed"
        } else {
            "not confirmed"
        };
        TimelineEntry::new(
            "CHECKLIST_ATTESTATION",
            self.attested_at.clone(),
            labelled(&phase, &[outcome, self.notes.as_str()]),
        )
    }
}

/// Canonical view of one theatre case.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TheatreFlowSnapshot {
    pub id: String,
    pub display_id: String,
    pub stage: String,
    pub stage_label: String,
    pub patient: Option<PatientSummary>,
    pub patient_name: String,
    pub patient_display_id: String,
    pub procedure_name: String,
    pub priority: String,
    pub theatre_room: String,
    pub surgeon_name: String,
    pub scheduled_at: String,
    pub started_at: String,
    pub ended_at: String,
    pub anesthesia_observations: Vec<AnesthesiaObservation>,
    pub anesthesia_records: Vec<AnesthesiaRecord>,
    pub post_op_notes: Vec<PostOpNote>,
    pub checklist_attestations: Vec<ChecklistAttestation>,
    /// Every checklist phase has a confirmed attestation.
    pub checklist_complete: bool,
    pub has_post_op_note: bool,
    pub timeline: Vec<TimelineEntry>,
}

impl Timeline for TheatreFlowSnapshot {
    fn to_timeline(&self) -> Vec<TimelineEntry> {
        merge_timeline([
            entries(&self.anesthesia_observations),
            entries(&self.anesthesia_records),
            entries(&self.post_op_notes),
            entries(&self.checklist_attestations),
        ])
    }
}

fn checklist_complete(attestations: &[ChecklistAttestation]) -> bool {
    ChecklistPhase::WIRE_VALUES
        .iter()
        .all(|phase| attestations.iter().any(|a| a.confirmed && a.phase == *phase))
}

/// Normalises one theatre case. `None` only when `raw` is not a JSON object.
pub fn normalize_theatre_flow_snapshot(raw: &Value) -> Option<TheatreFlowSnapshot> {
    let record = as_record(raw)?;
    let case = nested_value(record, &["case", "theatre_case"]);

    let id = text(record, &["id", "flow_id", "case_id"])
        .or_else(|| case.and_then(as_record).and_then(|c| text(c, &["id"])))
        .unwrap_or_default();
    let display_id = workflow_display_id(raw, case, &id);

    let stage = tag(record, &["stage", "current_stage", "status"]);
    let patient = PatientView::from_record(record);

    let theatre_room = nested(record, &["theatre_room", "room"])
        .and_then(|room| text(room, &["name", "label", "code"]))
        .or_else(|| text(record, &["theatre_room_name", "theatre_room"]))
        .unwrap_or_default();

    let checklist_attestations = normalize_each(
        list(record, &["checklist_attestations", "checklist"]),
        ChecklistAttestation::from_raw,
    );
    let post_op_notes = normalize_each(list(record, &["post_op_notes"]), PostOpNote::from_raw);

    let mut snapshot = TheatreFlowSnapshot {
        id,
        display_id,
        stage_label: display_label::<TheatreStage>(&stage),
        stage,
        patient: patient.patient,
        patient_name: patient.name,
        patient_display_id: patient.display_id,
        procedure_name: text_or_empty(record, &["procedure_name", "procedure"]),
        priority: tag(record, &["priority"]),
        theatre_room,
        surgeon_name: related_name(record, &["surgeon"], &["surgeon_name"]),
        scheduled_at: text_or_empty(record, &["scheduled_at", "scheduled_for"]),
        started_at: text_or_empty(record, &["started_at", "surgery_started_at"]),
        ended_at: text_or_empty(record, &["ended_at", "surgery_ended_at"]),
        anesthesia_observations: normalize_each(
            list(record, &["anesthesia_observations", "observations"]),
            AnesthesiaObservation::from_raw,
        ),
        anesthesia_records: normalize_each(
            list(record, &["anesthesia_records"]),
            AnesthesiaRecord::from_raw,
        ),
        checklist_complete: checklist_complete(&checklist_attestations),
        has_post_op_note: !post_op_notes.is_empty(),
        post_op_notes,
        checklist_attestations,
        timeline: Vec::new(),
    };
    snapshot.timeline = snapshot.to_timeline();
    Some(snapshot)
}

/// Normalises a theatre case list response (bare array or wrapped).
pub fn normalize_theatre_flow_list(raw: &Value) -> ListEnvelope<TheatreFlowSnapshot> {
    normalize_list(raw, normalize_theatre_flow_snapshot)
}
