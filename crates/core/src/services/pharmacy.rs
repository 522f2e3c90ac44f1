//! Pharmacy order operations.

use crate::constants::PHARMACY_ORDERS_PATH;
use crate::error::ClassifiedResult;
use crate::gateway::Gateway;
use flow_contracts::pharmacy::{
    CreatePharmacyOrder, DispensePharmacyOrder, PharmacyOrderListParams, PharmacyTransition,
};
use flow_snapshots::{
    normalize_pharmacy_order_list, normalize_pharmacy_order_snapshot, ListEnvelope,
    PharmacyOrderSnapshot,
};
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct PharmacyService {
    gateway: Gateway,
}

type OrderReply = ClassifiedResult<Option<PharmacyOrderSnapshot>>;

impl PharmacyService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list_orders(
        &self,
        params: &Value,
    ) -> ClassifiedResult<ListEnvelope<PharmacyOrderSnapshot>> {
        const OP: &str = "pharmacy.list_orders";
        let params: PharmacyOrderListParams = self.gateway.parse(OP, params)?;
        let url = self.gateway.list_url(OP, PHARMACY_ORDERS_PATH, &params)?;

        let data = self.gateway.get(OP, url).await?;
        Ok(normalize_pharmacy_order_list(&data))
    }

    pub async fn get_order(&self, order_id: &str) -> OrderReply {
        const OP: &str = "pharmacy.get_order";
        let order_id = self.gateway.flow_id(OP, "order_id", order_id)?;
        let url = self.gateway.url(&format!("{PHARMACY_ORDERS_PATH}/{order_id}"));

        let data = self.gateway.get(OP, url).await?;
        Ok(normalize_pharmacy_order_snapshot(&data))
    }

    pub async fn create_order(&self, payload: &Value) -> OrderReply {
        const OP: &str = "pharmacy.create_order";
        let payload: CreatePharmacyOrder = self.gateway.parse(OP, payload)?;
        let url = self.gateway.url(PHARMACY_ORDERS_PATH);

        let data = self.gateway.post(OP, url, &payload).await?;
        Ok(normalize_pharmacy_order_snapshot(&data))
    }

    /// Dispenses some or all items and records the payment.
    pub async fn dispense(&self, order_id: &str, payload: &Value) -> OrderReply {
        const OP: &str = "pharmacy.dispense";
        let ([order_id], payload): (_, DispensePharmacyOrder) =
            self.gateway.parse_at(OP, [("order_id", order_id)], payload)?;
        let url = self
            .gateway
            .url(&format!("{PHARMACY_ORDERS_PATH}/{order_id}/dispense"));

        let data = self.gateway.post(OP, url, &payload).await?;
        Ok(normalize_pharmacy_order_snapshot(&data))
    }

    pub async fn transition(&self, order_id: &str, payload: &Value) -> OrderReply {
        const OP: &str = "pharmacy.transition";
        let ([order_id], payload): (_, PharmacyTransition) =
            self.gateway.parse_at(OP, [("order_id", order_id)], payload)?;
        let url = self
            .gateway
            .url(&format!("{PHARMACY_ORDERS_PATH}/{order_id}/transitions"));

        let data = self.gateway.post(OP, url, &payload).await?;
        Ok(normalize_pharmacy_order_snapshot(&data))
    }
}
