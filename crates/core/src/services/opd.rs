//! Outpatient flow operations.

use crate::constants::OPD_FLOWS_PATH;
use crate::error::ClassifiedResult;
use crate::gateway::Gateway;
use flow_contracts::opd::{OpdFlowListParams, OpdTransition, StartOpdFlow};
use flow_contracts::shared::RecordVitals;
use flow_snapshots::{
    normalize_opd_flow_list, normalize_opd_flow_snapshot, ListEnvelope, OpdFlowSnapshot,
};
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct OpdService {
    gateway: Gateway,
}

impl OpdService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Lists outpatient flows matching `params`.
    pub async fn list_flows(
        &self,
        params: &Value,
    ) -> ClassifiedResult<ListEnvelope<OpdFlowSnapshot>> {
        const OP: &str = "opd.list_flows";
        let params: OpdFlowListParams = self.gateway.parse(OP, params)?;
        let url = self.gateway.list_url(OP, OPD_FLOWS_PATH, &params)?;

        let data = self.gateway.get(OP, url).await?;
        Ok(normalize_opd_flow_list(&data))
    }

    /// Fetches one flow. `None` when the service answered with something other than a record.
    pub async fn get_flow(&self, flow_id: &str) -> ClassifiedResult<Option<OpdFlowSnapshot>> {
        const OP: &str = "opd.get_flow";
        let flow_id = self.gateway.flow_id(OP, "flow_id", flow_id)?;
        let url = self.gateway.url(&format!("{OPD_FLOWS_PATH}/{flow_id}"));

        let data = self.gateway.get(OP, url).await?;
        Ok(normalize_opd_flow_snapshot(&data))
    }

    pub async fn start_flow(&self, payload: &Value) -> ClassifiedResult<Option<OpdFlowSnapshot>> {
        const OP: &str = "opd.start_flow";
        let payload: StartOpdFlow = self.gateway.parse(OP, payload)?;
        let url = self.gateway.url(OPD_FLOWS_PATH);

        let data = self.gateway.post(OP, url, &payload).await?;
        Ok(normalize_opd_flow_snapshot(&data))
    }

    pub async fn record_vitals(
        &self,
        flow_id: &str,
        payload: &Value,
    ) -> ClassifiedResult<Option<OpdFlowSnapshot>> {
        const OP: &str = "opd.record_vitals";
        let ([flow_id], payload): (_, RecordVitals) =
            self.gateway.parse_at(OP, [("flow_id", flow_id)], payload)?;
        let url = self.gateway.url(&format!("{OPD_FLOWS_PATH}/{flow_id}/vitals"));

        let data = self.gateway.post(OP, url, &payload).await?;
        Ok(normalize_opd_flow_snapshot(&data))
    }

    /// Requests a stage change. Whether the change is allowed is decided by the service.
    pub async fn transition(
        &self,
        flow_id: &str,
        payload: &Value,
    ) -> ClassifiedResult<Option<OpdFlowSnapshot>> {
        const OP: &str = "opd.transition";
        let ([flow_id], payload): (_, OpdTransition) =
            self.gateway.parse_at(OP, [("flow_id", flow_id)], payload)?;
        let url = self.gateway.url(&format!("{OPD_FLOWS_PATH}/{flow_id}/transitions"));

        let data = self.gateway.post(OP, url, &payload).await?;
        Ok(normalize_opd_flow_snapshot(&data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::testing::{gateway, RecordingTransport};
    use crate::transport::{Method, TransportFailure};
    use serde_json::json;

    #[tokio::test]
    async fn list_flows_encodes_query_and_normalises_bare_arrays() {
        let transport = RecordingTransport::replying(json!([{ "encounter": { "id": "e1" } }]));
        let service = OpdService::new(gateway(&transport));

        let list = service
            .list_flows(&json!({ "stage": "waiting_consultation", "page": "2" }))
            .await
            .expect("list");

        assert_eq!(list.items[0].id, "e1");
        assert_eq!(list.pagination, None);

        let request = transport.only_request();
        assert_eq!(request.method, Method::Get);
        assert_eq!(
            request.url,
            "/api/v1/opd/flows?page=2&stage=WAITING_CONSULTATION"
        );
        assert_eq!(request.body, None);
    }

    #[tokio::test]
    async fn invalid_payload_never_reaches_the_transport() {
        let transport = RecordingTransport::replying(json!({}));
        let service = OpdService::new(gateway(&transport));

        let err = service
            .start_flow(&json!({ "arrival_mode": "TELEPORT" }))
            .await
            .unwrap_err();

        assert_eq!(err.category, ErrorCategory::Validation);
        assert!(err.has_violation("patient_id"));
        assert!(err.has_violation("arrival_mode"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn invalid_path_id_is_rejected_before_sending() {
        let transport = RecordingTransport::replying(json!({}));
        let service = OpdService::new(gateway(&transport));

        let err = service.get_flow("../admin").await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::Validation);
        assert_eq!(err.operation, "opd.get_flow");
        assert!(err.has_violation("flow_id"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn record_vitals_posts_the_normalised_payload() {
        let transport = RecordingTransport::replying(json!({
            "id": "OPD-12",
            "stage": "waiting_consultation",
            "vitals": [{ "vital_type": "BLOOD_PRESSURE", "systolic_value": 130,
                         "diastolic_value": 85, "recorded_at": "2024-03-01T09:00:00Z" }]
        }));
        let service = OpdService::new(gateway(&transport));

        let flow = service
            .record_vitals(
                "OPD-12",
                &json!({ "vitals": [{ "vital_type": "blood_pressure", "value": "130/85" }] }),
            )
            .await
            .expect("recorded")
            .expect("record");

        assert_eq!(flow.stage, "WAITING_CONSULTATION");
        assert_eq!(flow.timeline[0].label, "Blood pressure 130/85");

        let request = transport.only_request();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "/api/v1/opd/flows/OPD-12/vitals");
        let body = request.body.expect("body");
        assert_eq!(body["vitals"][0]["systolic_value"], json!(130.0));
        assert_eq!(body["vitals"][0]["diastolic_value"], json!(85.0));
        assert!(body["vitals"][0].get("value").is_none());
    }

    #[tokio::test]
    async fn remote_failures_are_classified_and_returned() {
        let transport = RecordingTransport::failing(TransportFailure::new(409, "stage changed"));
        let service = OpdService::new(gateway(&transport));

        let err = service
            .transition("OPD-12", &json!({ "action": "COMPLETE" }))
            .await
            .unwrap_err();

        assert_eq!(err.category, ErrorCategory::Conflict);
        assert_eq!(err.operation, "opd.transition");
        assert_eq!(transport.requests().len(), 1);
    }
}
