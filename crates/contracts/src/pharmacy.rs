//! Pharmacy order contracts.

use crate::schema::{has, require_when, tag, Contract, FieldKind, FieldSpec, Rule, RuleContext};
use crate::shared::{Paging, LIMIT, LONG, MAX_COUNT, PAGE, SEARCH, SHORT};
use crate::Contracted;
use flow_ids::FlowId;
use flow_types::catalog::{OrderSource, PaymentMethod, PharmacyAction, PharmacyStatus};
use flow_types::{Catalog, NonEmptyText};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub static PHARMACY_ORDER_LIST_PARAMS: Contract = Contract {
    name: "PharmacyOrderListParams",
    fields: &[
        PAGE,
        LIMIT,
        SEARCH,
        FieldSpec::optional(
            "status",
            FieldKind::Enum {
                values: <PharmacyStatus as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::optional(
            "source",
            FieldKind::Enum {
                values: <OrderSource as Catalog>::WIRE_VALUES,
            },
        ),
    ],
    rules: &[],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PharmacyOrderListParams {
    #[serde(flatten)]
    pub paging: Paging,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PharmacyStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<OrderSource>,
}

impl Contracted for PharmacyOrderListParams {
    fn contract() -> &'static Contract {
        &PHARMACY_ORDER_LIST_PARAMS
    }
}

// ============================================================================
// Ordering
// ============================================================================

pub static ORDER_ITEM_ROW: Contract = Contract {
    name: "OrderItemRow",
    fields: &[
        FieldSpec::required("medication_id", FieldKind::Identifier),
        FieldSpec::required(
            "quantity",
            FieldKind::Integer {
                min: Some(1),
                max: Some(MAX_COUNT),
            },
        ),
        FieldSpec::optional("dosage_instructions", LONG),
    ],
    rules: &[],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderItemRow {
    pub medication_id: FlowId,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage_instructions: Option<NonEmptyText>,
}

pub static CREATE_PHARMACY_ORDER: Contract = Contract {
    name: "CreatePharmacyOrder",
    fields: &[
        FieldSpec::required("patient_id", FieldKind::Identifier),
        FieldSpec::required(
            "source",
            FieldKind::Enum {
                values: <OrderSource as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::optional("encounter_id", FieldKind::Identifier),
        FieldSpec::required(
            "items",
            FieldKind::Rows {
                contract: &ORDER_ITEM_ROW,
                min_items: 1,
            },
        ),
    ],
    rules: &[],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePharmacyOrder {
    pub patient_id: FlowId,
    pub source: OrderSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter_id: Option<FlowId>,
    pub items: Vec<OrderItemRow>,
}

impl Contracted for CreatePharmacyOrder {
    fn contract() -> &'static Contract {
        &CREATE_PHARMACY_ORDER
    }
}

// ============================================================================
// Dispensing
// ============================================================================

pub static DISPENSE_ROW: Contract = Contract {
    name: "DispenseRow",
    fields: &[
        FieldSpec::required("order_item_id", FieldKind::Identifier),
        FieldSpec::required(
            "quantity_dispensed",
            FieldKind::Integer {
                min: Some(0),
                max: Some(MAX_COUNT),
            },
        ),
        FieldSpec::optional("batch_number", SHORT),
    ],
    rules: &[],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispenseRow {
    pub order_item_id: FlowId,
    pub quantity_dispensed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<NonEmptyText>,
}

pub static DISPENSE_PHARMACY_ORDER: Contract = Contract {
    name: "DispensePharmacyOrder",
    fields: &[
        FieldSpec::required(
            "items",
            FieldKind::Rows {
                contract: &DISPENSE_ROW,
                min_items: 1,
            },
        ),
        FieldSpec::required(
            "payment_method",
            FieldKind::Enum {
                values: <PaymentMethod as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::optional(
            "amount_paid",
            FieldKind::Number {
                min: Some(0.0),
                max: None,
            },
        ),
        FieldSpec::optional("payment_reference", SHORT),
    ],
    rules: &[Rule {
        name: "electronic_payment_needs_reference",
        check: electronic_payment_needs_reference,
    }],
};

fn electronic_payment_needs_reference(
    payload: &mut Map<String, Value>,
    ctx: &mut RuleContext<'_>,
) {
    let Some(method) = tag(payload, "payment_method") else {
        return;
    };
    let needs_reference =
        PaymentMethod::from_wire(method).is_some_and(PaymentMethod::needs_reference);
    if needs_reference && !has(payload, "payment_reference") {
        ctx.violation(
            "payment_reference",
            format!("is required when payment_method is {method}"),
        );
    }
}

/// Hands out stock against an order and takes payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispensePharmacyOrder {
    pub items: Vec<DispenseRow>,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_paid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<NonEmptyText>,
}

impl Contracted for DispensePharmacyOrder {
    fn contract() -> &'static Contract {
        &DISPENSE_PHARMACY_ORDER
    }
}

pub static PHARMACY_TRANSITION: Contract = Contract {
    name: "PharmacyTransition",
    fields: &[
        FieldSpec::required(
            "action",
            FieldKind::Enum {
                values: <PharmacyAction as Catalog>::WIRE_VALUES,
            },
        ),
        FieldSpec::optional("reason", LONG),
    ],
    rules: &[Rule {
        name: "cancel_or_return_needs_reason",
        check: cancel_or_return_needs_reason,
    }],
};

fn cancel_or_return_needs_reason(payload: &mut Map<String, Value>, ctx: &mut RuleContext<'_>) {
    require_when(
        payload,
        ctx,
        "action",
        &[PharmacyAction::Cancel.as_str(), PharmacyAction::Return.as_str()],
        "reason",
    );
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PharmacyTransition {
    pub action: PharmacyAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<NonEmptyText>,
}

impl Contracted for PharmacyTransition {
    fn contract() -> &'static Contract {
        &PHARMACY_TRANSITION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContractError;
    use serde_json::json;

    #[test]
    fn order_needs_at_least_one_item() {
        let err = CreatePharmacyOrder::parse(&json!({
            "patient_id": "PT-1",
            "source": "walk_in",
            "items": []
        }))
        .expect_err("no items");
        assert!(err.as_validation().is_some_and(|f| f.has_field("items")));
    }

    #[test]
    fn order_item_quantities_must_be_positive_whole_numbers() {
        let err = CreatePharmacyOrder::parse(&json!({
            "patient_id": "PT-1",
            "source": "OPD",
            "items": [
                { "medication_id": "MED-10", "quantity": 0 },
                { "medication_id": "MED-11", "quantity": "1.5" },
                { "medication_id": "MED-12", "quantity": "2" }
            ]
        }))
        .expect_err("bad quantities");
        let failure = err.as_validation().expect("validation failure");
        assert_eq!(
            failure.fields().collect::<Vec<_>>(),
            vec!["items[0].quantity", "items[1].quantity"]
        );
    }

    #[test]
    fn counts_beyond_u32_are_violations_not_translation_errors() {
        let err = CreatePharmacyOrder::parse(&json!({
            "patient_id": "PT-1",
            "source": "OPD",
            "items": [{ "medication_id": "MED-1", "quantity": 5_000_000_000_u64 }]
        }))
        .expect_err("quantity too large");
        let failure = err.as_validation().expect("validation failure");
        assert!(failure.has_field("items[0].quantity"));

        let err = DispensePharmacyOrder::parse(&json!({
            "items": [{ "order_item_id": "OI-1", "quantity_dispensed": "5000000000" }],
            "payment_method": "CASH"
        }))
        .expect_err("dispensed quantity too large");
        assert!(err
            .as_validation()
            .is_some_and(|f| f.has_field("items[0].quantity_dispensed")));

        let err = PharmacyOrderListParams::parse(&json!({ "page": "5000000000" }))
            .expect_err("page too large");
        assert!(err.as_validation().is_some_and(|f| f.has_field("page")));

        let max = PharmacyOrderListParams::parse(&json!({ "page": u32::MAX }))
            .expect("largest page");
        assert_eq!(max.paging.page, Some(u32::MAX));
    }

    #[test]
    fn order_parses_rows() {
        let order = CreatePharmacyOrder::parse(&json!({
            "patient_id": "PT-1",
            "source": "ipd",
            "items": [{ "medication_id": "MED-10", "quantity": "3", "dosage_instructions": "tds" }]
        }))
        .expect("valid order");
        assert_eq!(order.source, OrderSource::Ipd);
        assert_eq!(order.items[0].quantity, 3);
    }

    #[test]
    fn electronic_payments_need_a_reference() {
        for method in ["MOBILE_MONEY", "card"] {
            let err = DispensePharmacyOrder::parse(&json!({
                "items": [{ "order_item_id": "OI-1", "quantity_dispensed": 2 }],
                "payment_method": method,
                "amount_paid": "1500"
            }))
            .expect_err("no reference");
            match err {
                ContractError::Validation(failure) => {
                    assert_eq!(failure.violations.len(), 1);
                    assert_eq!(failure.violations[0].field, "payment_reference");
                }
                other => panic!("expected Validation error, got {other:?}"),
            }
        }

        let cash = DispensePharmacyOrder::parse(&json!({
            "items": [{ "order_item_id": "OI-1", "quantity_dispensed": 0 }],
            "payment_method": "cash",
            "amount_paid": 0
        }))
        .expect("cash needs no reference");
        assert_eq!(cash.amount_paid, Some(0.0));
    }

    #[test]
    fn negative_payment_is_rejected() {
        let err = DispensePharmacyOrder::parse(&json!({
            "items": [{ "order_item_id": "OI-1", "quantity_dispensed": 1 }],
            "payment_method": "CASH",
            "amount_paid": -5
        }))
        .expect_err("negative");
        assert!(err.as_validation().is_some_and(|f| f.has_field("amount_paid")));
    }

    #[test]
    fn cancel_and_return_need_reasons() {
        for action in ["CANCEL", "return"] {
            let err = PharmacyTransition::parse(&json!({ "action": action })).expect_err("reason");
            assert!(err.as_validation().is_some_and(|f| f.has_field("reason")));
        }
        let verify = PharmacyTransition::parse(&json!({ "action": "VERIFY" })).expect("verify");
        assert_eq!(verify.action, PharmacyAction::Verify);
        assert_eq!(verify.reason, None);
    }
}
