//! Pharmacy order snapshots.

use crate::common::{workflow_display_id, PatientSummary, PatientView, StageChange};
use crate::envelope::{normalize_list, ListEnvelope};
use crate::record::{
    as_record, flag, integer, list, nested, normalize_each, number, related_name, tag, text,
    text_or_empty,
};
use crate::timeline::{merge_timeline, Timeline, TimelineEntry};
use flow_types::catalog::PharmacyStatus;
use flow_types::{display_label, Catalog};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn count(value: Option<i64>) -> u64 {
    value.and_then(|n| u64::try_from(n).ok()).unwrap_or(0)
}

/// One line of a pharmacy order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub medication_id: String,
    pub medication_name: String,
    pub quantity: u64,
    pub quantity_dispensed: u64,
    pub unit_price: f64,
    /// Sent by the service, else `quantity * unit_price`.
    pub line_total: f64,
    pub dosage_instructions: String,
    pub is_fully_dispensed: bool,
}

impl OrderItem {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let record = as_record(raw)?;
        let medication = nested(record, &["medication", "drug"]);

        let quantity = count(integer(record, &["quantity", "quantity_ordered"]));
        let quantity_dispensed = count(integer(record, &["quantity_dispensed", "dispensed"]));
        let unit_price = number(record, &["unit_price", "price"])
            .or_else(|| medication.and_then(|m| number(m, &["unit_price", "price"])))
            .unwrap_or(0.0);

        Some(Self {
            id: text_or_empty(record, &["id"]),
            medication_id: text(record, &["medication_id"])
                .or_else(|| medication.and_then(|m| text(m, &["id"])))
                .unwrap_or_default(),
            medication_name: text(record, &["medication_name", "drug_name"])
                .or_else(|| medication.and_then(|m| text(m, &["name", "generic_name"])))
                .unwrap_or_default(),
            quantity,
            quantity_dispensed,
            unit_price,
            line_total: number(record, &["line_total", "total"])
                .unwrap_or(quantity as f64 * unit_price),
            dosage_instructions: text_or_empty(record, &["dosage_instructions", "instructions"]),
            is_fully_dispensed: flag(record, &["is_fully_dispensed"])
                .unwrap_or(quantity > 0 && quantity_dispensed >= quantity),
        })
    }
}

/// Canonical view of one pharmacy order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PharmacyOrderSnapshot {
    pub id: String,
    pub display_id: String,
    pub status: String,
    pub status_label: String,
    pub source: String,
    pub patient: Option<PatientSummary>,
    pub patient_name: String,
    pub patient_display_id: String,
    pub prescriber_name: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub amount_paid: f64,
    /// Never negative.
    pub balance: f64,
    pub payment_method: String,
    pub is_fully_dispensed: bool,
    pub status_history: Vec<StageChange>,
    pub created_at: String,
    pub timeline: Vec<TimelineEntry>,
}

impl Timeline for PharmacyOrderSnapshot {
    fn to_timeline(&self) -> Vec<TimelineEntry> {
        let statuses = self
            .status_history
            .iter()
            .map(|change| change.entry_with("STATUS_CHANGE", display_label::<PharmacyStatus>));
        merge_timeline([statuses])
    }
}

/// Normalises one pharmacy order. `None` only when `raw` is not a JSON object.
pub fn normalize_pharmacy_order_snapshot(raw: &Value) -> Option<PharmacyOrderSnapshot> {
    let record = as_record(raw)?;

    let id = text_or_empty(record, &["id", "order_id"]);
    let display_id = workflow_display_id(raw, None, &id);
    let status = tag(record, &["status", "order_status"]);
    let patient = PatientView::from_record(record);

    let items = normalize_each(list(record, &["items", "order_items"]), OrderItem::from_raw);
    let total_amount = number(record, &["total_amount", "total"])
        .unwrap_or_else(|| items.iter().map(|item| item.line_total).sum());
    let amount_paid = number(record, &["amount_paid", "paid_amount"]).unwrap_or(0.0);
    let balance = number(record, &["balance", "balance_due"])
        .unwrap_or(total_amount - amount_paid)
        .max(0.0);

    let is_fully_dispensed = flag(record, &["is_fully_dispensed"]).unwrap_or_else(|| {
        PharmacyStatus::from_wire(&status) == Some(PharmacyStatus::Dispensed)
            || (!items.is_empty() && items.iter().all(|item| item.is_fully_dispensed))
    });

    let mut snapshot = PharmacyOrderSnapshot {
        id,
        display_id,
        status_label: display_label::<PharmacyStatus>(&status),
        status,
        source: tag(record, &["source", "order_source"]),
        patient: patient.patient,
        patient_name: patient.name,
        patient_display_id: patient.display_id,
        prescriber_name: related_name(
            record,
            &["prescriber", "prescribed_by", "doctor"],
            &["prescriber_name"],
        ),
        items,
        total_amount,
        amount_paid,
        balance,
        payment_method: tag(record, &["payment_method"]),
        is_fully_dispensed,
        status_history: normalize_each(
            list(record, &["status_history", "history"]),
            StageChange::from_raw,
        ),
        created_at: text_or_empty(record, &["created_at", "ordered_at"]),
        timeline: Vec::new(),
    };
    snapshot.timeline = snapshot.to_timeline();
    Some(snapshot)
}

/// Normalises a pharmacy order list response (bare array or wrapped).
pub fn normalize_pharmacy_order_list(raw: &Value) -> ListEnvelope<PharmacyOrderSnapshot> {
    normalize_list(raw, normalize_pharmacy_order_snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "id": "9a8b7c6d-5e4f-4a3b-9c2d-1e0f9a8b7c6d",
            "display_id": "RX-1042",
            "status": "partially_dispensed",
            "source": "opd",
            "payment_method": "mobile_money",
            "patient": { "patient_number": "PT-9", "first_name": "Lydia", "last_name": "Were" },
            "prescriber": { "full_name": "Dr. Odhiambo" },
            "amount_paid": "300",
            "items": [
                {
                    "id": "i1",
                    "medication": { "id": "m1", "name": "Amoxicillin 500mg", "unit_price": 20 },
                    "quantity": 21,
                    "quantity_dispensed": 21
                },
                {
                    "id": "i2",
                    "medication_name": "Paracetamol 500mg",
                    "quantity": "10",
                    "quantity_dispensed": 0,
                    "unit_price": 5.5
                }
            ],
            "status_history": [
                { "status": "PENDING", "changed_at": "2024-07-01T09:00:00Z" },
                { "status": "VERIFIED", "changed_at": "2024-07-01T09:05:00Z" },
                { "to_status": "partially_dispensed", "changed_at": "2024-07-01T09:20:00Z",
                  "note": "Paracetamol out of stock" }
            ]
        })
    }

    #[test]
    fn computes_line_totals_and_balance() {
        let order = normalize_pharmacy_order_snapshot(&sample()).expect("object");
        assert_eq!(order.items[0].medication_name, "Amoxicillin 500mg");
        assert_eq!(order.items[0].line_total, 420.0);
        assert_eq!(order.items[1].line_total, 55.0);
        assert_eq!(order.total_amount, 475.0);
        assert_eq!(order.amount_paid, 300.0);
        assert_eq!(order.balance, 175.0);
        assert!(order.items[0].is_fully_dispensed);
        assert!(!order.is_fully_dispensed);
    }

    #[test]
    fn canonicalises_tags_and_people() {
        let order = normalize_pharmacy_order_snapshot(&sample()).expect("object");
        assert_eq!(order.display_id, "RX-1042");
        assert_eq!(order.status, "PARTIALLY_DISPENSED");
        assert_eq!(order.status_label, "Partially dispensed");
        assert_eq!(order.source, "OPD");
        assert_eq!(order.payment_method, "MOBILE_MONEY");
        assert_eq!(order.prescriber_name, "Dr. Odhiambo");
        assert_eq!(order.patient_display_id, "PT-9");
    }

    #[test]
    fn overpayment_never_yields_negative_balance() {
        let order = normalize_pharmacy_order_snapshot(&json!({
            "status": "DISPENSED",
            "total_amount": 100,
            "amount_paid": 150
        }))
        .expect("object");
        assert_eq!(order.balance, 0.0);
        assert!(order.is_fully_dispensed);
    }

    #[test]
    fn timeline_follows_status_history() {
        let order = normalize_pharmacy_order_snapshot(&sample()).expect("object");
        let labels: Vec<_> = order.timeline.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Partially dispensed: Paracetamol out of stock",
                "Verified",
                "Pending"
            ]
        );
        assert!(order.timeline.iter().all(|e| e.kind == "STATUS_CHANGE"));
    }

    #[test]
    fn renormalising_preserves_id_status_and_timeline() {
        let once = normalize_pharmacy_order_snapshot(&sample()).expect("object");
        let serialised = serde_json::to_value(&once).expect("serialise");
        let twice = normalize_pharmacy_order_snapshot(&serialised).expect("object");
        assert_eq!(twice.id, once.id);
        assert_eq!(twice.status, once.status);
        assert_eq!(twice.timeline, once.timeline);
        assert_eq!(twice.items, once.items);
        assert_eq!(twice.balance, once.balance);
    }

    #[test]
    fn wrapped_list_with_meta() {
        let list = normalize_pharmacy_order_list(&json!({
            "data": [sample(), 4],
            "meta": { "page": 2, "limit": 1, "total": 2 }
        }));
        assert_eq!(list.items.len(), 1);
        let pagination = list.pagination.expect("meta");
        assert_eq!(pagination.total_pages, 2);
        assert!(!pagination.has_next);
    }
}
