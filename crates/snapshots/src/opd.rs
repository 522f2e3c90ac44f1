//! Outpatient flow snapshots.

use crate::common::{
    vitals, workflow_display_id, PatientSummary, PatientView, StageChange, VitalReading,
};
use crate::envelope::{normalize_list, ListEnvelope};
use crate::record::{
    as_record, list, nested, normalize_each, related_name, tag, text, text_or_empty, Record,
};
use crate::timeline::{entries, merge_timeline, Timeline, TimelineEntry};
use flow_ids::{display_id_or_internal, DEFAULT_FIELDS};
use flow_types::catalog::OpdStage;
use flow_types::display_label;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The clinical encounter an outpatient flow is attached to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterSummary {
    pub id: String,
    pub display_id: String,
    pub status: String,
    pub started_at: String,
    pub ended_at: String,
}

impl EncounterSummary {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let record = as_record(raw)?;
        Some(Self {
            id: text_or_empty(record, &["id", "encounter_id"]),
            display_id: display_id_or_internal(raw, &DEFAULT_FIELDS),
            status: tag(record, &["status", "stage"]),
            started_at: text_or_empty(record, &["started_at", "start_time", "created_at"]),
            ended_at: text_or_empty(record, &["ended_at", "end_time"]),
        })
    }
}

/// Canonical view of one outpatient flow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpdFlowSnapshot {
    pub id: String,
    pub display_id: String,
    pub stage: String,
    pub stage_label: String,
    pub patient: Option<PatientSummary>,
    pub patient_name: String,
    pub patient_display_id: String,
    pub encounter: Option<EncounterSummary>,
    pub doctor_name: String,
    pub arrival_mode: String,
    pub triage_level: String,
    pub payment_method: String,
    pub vitals: Vec<VitalReading>,
    pub stage_history: Vec<StageChange>,
    pub has_encounter: bool,
    pub has_vitals: bool,
    pub started_at: String,
    pub updated_at: String,
    pub timeline: Vec<TimelineEntry>,
}

impl Timeline for OpdFlowSnapshot {
    fn to_timeline(&self) -> Vec<TimelineEntry> {
        let stages = self
            .stage_history
            .iter()
            .map(|change| change.entry_with("STAGE_CHANGE", display_label::<OpdStage>))
            .collect::<Vec<_>>();
        merge_timeline([stages, entries(&self.vitals)])
    }
}

/// Normalises one outpatient flow. `None` only when `raw` is not a JSON object.
pub fn normalize_opd_flow_snapshot(raw: &Value) -> Option<OpdFlowSnapshot> {
    let record = as_record(raw)?;
    let encounter_record = nested(record, &["encounter"]);
    let encounter = record.get("encounter").and_then(EncounterSummary::from_raw);

    let id = text(record, &["id", "flow_id"])
        .or_else(|| encounter.as_ref().map(|e| e.id.clone()))
        .unwrap_or_default();

    let display_id = workflow_display_id(raw, record.get("encounter"), &id);

    let stage = tag(record, &["stage", "current_stage", "status"]);
    let patient = PatientView::from_record(record);

    let field = |keys: &[&str]| {
        text(record, keys)
            .or_else(|| encounter_record.and_then(|e| text(e, keys)))
            .unwrap_or_default()
    };
    let enum_field = |keys: &[&str]| flow_types::canonical_tag(&field(keys));

    let doctor_of = |r: &Record| {
        Some(related_name(r, &["doctor", "assigned_doctor"], &["doctor_name"]))
            .filter(|name| !name.is_empty())
    };
    let doctor_name = doctor_of(record)
        .or_else(|| encounter_record.and_then(doctor_of))
        .unwrap_or_default();

    let vitals = vitals(record, &["encounter"]);
    let stage_history = normalize_each(
        list(record, &["stage_history", "history", "transitions"]),
        StageChange::from_raw,
    );

    let mut snapshot = OpdFlowSnapshot {
        id,
        display_id,
        stage_label: display_label::<OpdStage>(&stage),
        stage,
        patient: patient.patient,
        patient_name: patient.name,
        patient_display_id: patient.display_id,
        has_encounter: encounter.is_some(),
        encounter,
        doctor_name,
        arrival_mode: enum_field(&["arrival_mode"]),
        triage_level: enum_field(&["triage_level"]),
        payment_method: enum_field(&["payment_method"]),
        has_vitals: !vitals.is_empty(),
        vitals,
        stage_history,
        started_at: field(&["started_at", "created_at", "arrived_at"]),
        updated_at: text_or_empty(record, &["updated_at"]),
        timeline: Vec::new(),
    };
    snapshot.timeline = snapshot.to_timeline();
    Some(snapshot)
}

/// Normalises an outpatient list response (bare array or wrapped).
pub fn normalize_opd_flow_list(raw: &Value) -> ListEnvelope<OpdFlowSnapshot> {
    normalize_list(raw, normalize_opd_flow_snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "id": "0b8f3a52-6c1d-4e2f-9a3b-1c2d3e4f5a6b",
            "display_id": "OPD-2024-0007",
            "stage": " in_consultation ",
            "arrival_mode": "walk_in",
            "payment_method": "Insurance",
            "patient": { "id": "p1", "mrn": "MRN-881", "full_name": "Grace Atieno" },
            "encounter": {
                "id": "e1",
                "status": "open",
                "triage_level": "urgent",
                "doctor": { "first_name": "Peter", "last_name": "Mwangi" },
                "vitals": [
                    {
                        "vital_type": "PULSE",
                        "value": 88,
                        "unit": "bpm",
                        "recorded_at": "2024-03-01T09:10:00Z"
                    }
                ]
            },
            "stage_history": [
                { "stage": "WAITING_TRIAGE", "at": "2024-03-01T09:00:00Z" },
                { "stage": "IN_CONSULTATION", "at": "2024-03-01T09:30:00Z" },
                "garbage"
            ]
        })
    }

    #[test]
    fn list_of_bare_encounters() {
        let list = normalize_opd_flow_list(&json!([{ "encounter": { "id": "e1" } }]));
        assert_eq!(list.pagination, None);
        assert_eq!(list.items.len(), 1);

        let flow = &list.items[0];
        assert_eq!(flow.id, "e1");
        assert_eq!(flow.stage, "");
        assert_eq!(flow.stage_label, "");
        assert!(flow.has_encounter);
        assert!(flow.timeline.is_empty());
        assert_eq!(flow.patient_name, "Unknown patient");
    }

    #[test]
    fn flattens_encounter_fields() {
        let flow = normalize_opd_flow_snapshot(&sample()).expect("object");
        assert_eq!(flow.display_id, "OPD-2024-0007");
        assert_eq!(flow.stage, "IN_CONSULTATION");
        assert_eq!(flow.stage_label, "In consultation");
        assert_eq!(flow.triage_level, "URGENT");
        assert_eq!(flow.payment_method, "INSURANCE");
        assert_eq!(flow.doctor_name, "Peter Mwangi");
        assert_eq!(flow.patient_display_id, "MRN-881");
        assert!(flow.has_vitals);
        assert_eq!(flow.stage_history.len(), 2);
    }

    #[test]
    fn timeline_merges_stage_history_and_vitals() {
        let flow = normalize_opd_flow_snapshot(&sample()).expect("object");
        let kinds: Vec<_> = flow.timeline.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["STAGE_CHANGE", "VITALS", "STAGE_CHANGE"]);
        assert_eq!(flow.timeline[0].label, "In consultation");
        assert_eq!(flow.timeline[1].label, "Pulse 88 bpm");
    }

    #[test]
    fn uuid_only_flow_falls_back_to_internal_id() {
        let flow = normalize_opd_flow_snapshot(&json!({
            "id": "0b8f3a52-6c1d-4e2f-9a3b-1c2d3e4f5a6b"
        }))
        .expect("object");
        assert_eq!(flow.display_id, "0b8f3a52-6c1d-4e2f-9a3b-1c2d3e4f5a6b");
    }

    #[test]
    fn non_objects_are_rejected() {
        for raw in [json!(null), json!([]), json!("OPD-1"), json!(7)] {
            assert!(normalize_opd_flow_snapshot(&raw).is_none());
        }
    }

    #[test]
    fn renormalising_preserves_id_stage_and_timeline() {
        let once = normalize_opd_flow_snapshot(&sample()).expect("object");
        let serialised = serde_json::to_value(&once).expect("serialise");
        let twice = normalize_opd_flow_snapshot(&serialised).expect("object");
        assert_eq!(twice.id, once.id);
        assert_eq!(twice.stage, once.stage);
        assert_eq!(twice.timeline, once.timeline);
        assert_eq!(twice.doctor_name, once.doctor_name);
    }
}
