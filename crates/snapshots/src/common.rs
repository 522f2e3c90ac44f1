//! Sub-records shared by several domains: patients, vitals and stage history.

use crate::record::{
    as_record, list, nested, normalize_each, number, person_name, related_name, tag, text,
    text_or_empty, Record,
};
use crate::timeline::{TimelineEntry, TimelineEvent};
use flow_contracts::patterns::split_blood_pressure;
use flow_ids::{display_id_or_internal, resolve_display_id, PATIENT_FIELDS};
use flow_types::catalog::VitalType;
use flow_types::display_label;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name shown when a record carries no usable patient name.
pub const UNKNOWN_PATIENT: &str = "Unknown patient";

// ============================================================================
// Patients
// ============================================================================

/// The patient a workflow belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: String,
    pub display_id: String,
    pub name: String,
}

impl PatientSummary {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let record = as_record(raw)?;
        Some(Self {
            id: text_or_empty(record, &["id", "patient_id"]),
            display_id: display_id_or_internal(raw, &PATIENT_FIELDS),
            name: person_name(record).unwrap_or_default(),
        })
    }
}

/// Patient fields flattened onto every snapshot.
pub(crate) struct PatientView {
    pub patient: Option<PatientSummary>,
    pub name: String,
    pub display_id: String,
}

impl PatientView {
    pub(crate) fn from_record(record: &Record) -> Self {
        let patient = record.get("patient").and_then(PatientSummary::from_raw);

        let name = patient
            .as_ref()
            .map(|p| p.name.clone())
            .filter(|name| !name.is_empty())
            .or_else(|| text(record, &["patient_name"]))
            .unwrap_or_else(|| UNKNOWN_PATIENT.to_string());

        let display_id = patient
            .as_ref()
            .map(|p| p.display_id.clone())
            .filter(|id| !id.is_empty())
            .or_else(|| text(record, &["patient_display_id", "patient_number", "mrn"]))
            .or_else(|| record.get("patient_id").and_then(resolve_display_id))
            .unwrap_or_default();

        Self {
            patient,
            name,
            display_id,
        }
    }
}

/// Display id of a workflow record.
///
/// A readable id on the record wins, then a readable id on its parent relation (encounter,
/// admission...), then the internal `id` the snapshot already settled on.
pub(crate) fn workflow_display_id(raw: &Value, relation: Option<&Value>, id: &str) -> String {
    resolve_display_id(raw)
        .or_else(|| relation.and_then(resolve_display_id))
        .unwrap_or_else(|| id.to_string())
}

// ============================================================================
// Vitals
// ============================================================================

/// One vital sign reading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VitalReading {
    pub id: String,
    pub vital_type: String,
    pub value: Option<f64>,
    pub systolic_value: Option<f64>,
    pub diastolic_value: Option<f64>,
    pub unit: String,
    pub recorded_at: String,
}

impl VitalReading {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let record = as_record(raw)?;

        let legacy_pair = record
            .get("value")
            .and_then(Value::as_str)
            .and_then(split_blood_pressure);
        let systolic_value =
            number(record, &["systolic_value", "systolic"]).or(legacy_pair.map(|(s, _)| s));
        let diastolic_value =
            number(record, &["diastolic_value", "diastolic"]).or(legacy_pair.map(|(_, d)| d));

        Some(Self {
            id: text_or_empty(record, &["id"]),
            vital_type: tag(record, &["vital_type", "type", "name"]),
            value: number(record, &["value", "reading"]),
            systolic_value,
            diastolic_value,
            unit: text_or_empty(record, &["unit", "units"]),
            recorded_at: text_or_empty(record, &["recorded_at", "measured_at", "created_at"]),
        })
    }

    /// Human reading, e.g. `Blood pressure 120/80 mmHg`.
    pub fn label(&self) -> String {
        let name = display_label::<VitalType>(&self.vital_type);
        let name = if name.is_empty() { "Vitals".to_string() } else { name };

        let reading = match (self.systolic_value, self.diastolic_value, self.value) {
            (Some(systolic), Some(diastolic), _) => Some(format!("{systolic}/{diastolic}")),
            (_, _, Some(value)) => Some(value.to_string()),
            _ => None,
        };

        match (reading, self.unit.is_empty()) {
            (Some(reading), true) => format!("{name} {reading}"),
            (Some(reading), false) => format!("{name} {reading} {}", self.unit),
            (None, _) => name,
        }
    }
}

impl TimelineEvent for VitalReading {
    fn timeline_entry(&self) -> TimelineEntry {
        TimelineEntry::new("VITALS", self.recorded_at.clone(), self.label())
    }
}

/// Vitals on the record itself, else on the first nested record among `nested_keys`.
pub(crate) fn vitals(record: &Record, nested_keys: &[&str]) -> Vec<VitalReading> {
    const KEYS: &[&str] = &["vitals", "vital_signs"];
    let own = list(record, KEYS);
    let items = if own.is_empty() {
        nested(record, nested_keys)
            .map(|inner| list(inner, KEYS))
            .unwrap_or(&[])
    } else {
        own
    };
    normalize_each(items, VitalReading::from_raw)
}

// ============================================================================
// Stage history
// ============================================================================

/// One recorded stage (or status) change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageChange {
    pub stage: String,
    pub at: String,
    pub actor_name: String,
    pub note: String,
}

impl StageChange {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let record = as_record(raw)?;
        Some(Self {
            stage: tag(record, &["stage", "to_stage", "status", "to_status"]),
            at: text_or_empty(record, &["at", "changed_at", "created_at", "timestamp"]),
            actor_name: related_name(
                record,
                &["actor", "changed_by", "user"],
                &["actor_name", "changed_by_name"],
            ),
            note: text_or_empty(record, &["note", "notes", "reason"]),
        })
    }

    /// Timeline entry labelled through `label` (the domain's stage catalog).
    pub(crate) fn entry_with(&self, kind: &str, label: impl Fn(&str) -> String) -> TimelineEntry {
        let stage = label(&self.stage);
        let text = match (stage.is_empty(), self.note.is_empty()) {
            (false, true) => stage,
            (false, false) => format!("{stage}: {}", self.note),
            (true, false) => self.note.clone(),
            (true, true) => "Stage changed".to_string(),
        };
        TimelineEntry::new(kind, self.at.clone(), text)
    }
}
