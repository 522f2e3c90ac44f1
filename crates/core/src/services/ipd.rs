//! Inpatient flow operations: admission, beds, transfers and the ward record.

use crate::constants::IPD_FLOWS_PATH;
use crate::error::ClassifiedResult;
use crate::gateway::Gateway;
use flow_contracts::ipd::{
    AddNursingNote, AddWardRound, AssignBed, IpdFlowListParams, IpdTransition,
    RecordMedicationAdministration, RequestTransfer, StartIpdFlow, UpdateTransfer,
};
use flow_contracts::shared::RecordVitals;
use flow_contracts::Contracted;
use flow_snapshots::{
    normalize_ipd_flow_list, normalize_ipd_flow_snapshot, IpdFlowSnapshot, ListEnvelope,
};
use serde_json::Value;

/// Every mutation answers with the updated flow, normalised; `None` when the service answered
/// with something other than a record.
#[derive(Clone, Debug)]
pub struct IpdService {
    gateway: Gateway,
}

type FlowReply = ClassifiedResult<Option<IpdFlowSnapshot>>;

impl IpdService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list_flows(
        &self,
        params: &Value,
    ) -> ClassifiedResult<ListEnvelope<IpdFlowSnapshot>> {
        const OP: &str = "ipd.list_flows";
        let params: IpdFlowListParams = self.gateway.parse(OP, params)?;
        let url = self.gateway.list_url(OP, IPD_FLOWS_PATH, &params)?;

        let data = self.gateway.get(OP, url).await?;
        Ok(normalize_ipd_flow_list(&data))
    }

    pub async fn get_flow(&self, flow_id: &str) -> FlowReply {
        const OP: &str = "ipd.get_flow";
        let flow_id = self.gateway.flow_id(OP, "flow_id", flow_id)?;
        let url = self.gateway.url(&format!("{IPD_FLOWS_PATH}/{flow_id}"));

        let data = self.gateway.get(OP, url).await?;
        Ok(normalize_ipd_flow_snapshot(&data))
    }

    /// Admits a patient.
    pub async fn start_flow(&self, payload: &Value) -> FlowReply {
        const OP: &str = "ipd.start_flow";
        let payload: StartIpdFlow = self.gateway.parse(OP, payload)?;
        let url = self.gateway.url(IPD_FLOWS_PATH);

        let data = self.gateway.post(OP, url, &payload).await?;
        Ok(normalize_ipd_flow_snapshot(&data))
    }

    pub async fn assign_bed(&self, flow_id: &str, payload: &Value) -> FlowReply {
        self.post_to::<AssignBed>("ipd.assign_bed", flow_id, "bed-assignments", payload)
            .await
    }

    pub async fn request_transfer(&self, flow_id: &str, payload: &Value) -> FlowReply {
        self.post_to::<RequestTransfer>("ipd.request_transfer", flow_id, "transfers", payload)
            .await
    }

    /// Approves, rejects, completes or cancels one transfer of the flow.
    pub async fn update_transfer(
        &self,
        flow_id: &str,
        transfer_id: &str,
        payload: &Value,
    ) -> FlowReply {
        const OP: &str = "ipd.update_transfer";
        let ([flow_id, transfer_id], payload): (_, UpdateTransfer) = self.gateway.parse_at(
            OP,
            [("flow_id", flow_id), ("transfer_id", transfer_id)],
            payload,
        )?;
        let url = self
            .gateway
            .url(&format!("{IPD_FLOWS_PATH}/{flow_id}/transfers/{transfer_id}"));

        let data = self.gateway.post(OP, url, &payload).await?;
        Ok(normalize_ipd_flow_snapshot(&data))
    }

    pub async fn add_ward_round(&self, flow_id: &str, payload: &Value) -> FlowReply {
        self.post_to::<AddWardRound>("ipd.add_ward_round", flow_id, "ward-rounds", payload)
            .await
    }

    pub async fn add_nursing_note(&self, flow_id: &str, payload: &Value) -> FlowReply {
        self.post_to::<AddNursingNote>(
            "ipd.add_nursing_note",
            flow_id,
            "nursing-notes",
            payload,
        )
        .await
    }

    pub async fn record_medication_administration(
        &self,
        flow_id: &str,
        payload: &Value,
    ) -> FlowReply {
        self.post_to::<RecordMedicationAdministration>(
            "ipd.record_medication_administration",
            flow_id,
            "medication-administrations",
            payload,
        )
        .await
    }

    pub async fn record_vitals(&self, flow_id: &str, payload: &Value) -> FlowReply {
        self.post_to::<RecordVitals>("ipd.record_vitals", flow_id, "vitals", payload)
            .await
    }

    /// Requests a stage change (discharge planning, discharge, cancellation). Legality is the
    /// service's call.
    pub async fn transition(&self, flow_id: &str, payload: &Value) -> FlowReply {
        self.post_to::<IpdTransition>("ipd.transition", flow_id, "transitions", payload)
            .await
    }

    async fn post_to<P: Contracted>(
        &self,
        operation: &'static str,
        flow_id: &str,
        resource: &str,
        payload: &Value,
    ) -> FlowReply {
        let ([flow_id], payload): (_, P) =
            self.gateway.parse_at(operation, [("flow_id", flow_id)], payload)?;
        let url = self
            .gateway
            .url(&format!("{IPD_FLOWS_PATH}/{flow_id}/{resource}"));

        let data = self.gateway.post(operation, url, &payload).await?;
        Ok(normalize_ipd_flow_snapshot(&data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::testing::{gateway, RecordingTransport};
    use crate::transport::{Method, TransportFailure};
    use serde_json::json;

    const FLOW: &str = "IPD-2024-0042";

    #[tokio::test]
    async fn list_flows_applies_queue_scope_default() {
        let transport = RecordingTransport::replying(json!({
            "items": [{ "id": FLOW, "stage": "admitted_in_bed" }],
            "pagination": { "page": 1, "limit": 20, "total": 1 }
        }));
        let service = IpdService::new(gateway(&transport));

        let list = service
            .list_flows(&json!({ "has_active_bed": "yes" }))
            .await
            .expect("list");
        assert_eq!(list.items[0].stage_label, "Admitted in bed");
        assert_eq!(list.pagination.map(|p| p.has_next), Some(false));

        assert_eq!(
            transport.only_request().url,
            "/api/v1/ipd/flows?has_active_bed=true&queue_scope=ACTIVE"
        );
    }

    #[tokio::test]
    async fn completing_a_transfer_without_a_bed_is_rejected_locally() {
        let transport = RecordingTransport::replying(json!({}));
        let service = IpdService::new(gateway(&transport));

        let err = service
            .update_transfer(FLOW, "TRF-9", &json!({ "action": "complete" }))
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(err.has_violation("to_bed_id"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn bad_path_ids_and_bad_payload_are_reported_together() {
        let transport = RecordingTransport::replying(json!({}));
        let service = IpdService::new(gateway(&transport));

        let err = service
            .update_transfer("../x", "TRF 1", &json!({ "action": "COMPLETE" }))
            .await
            .unwrap_err();

        assert!(err.is_validation());
        let fields: Vec<&str> = err.violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["flow_id", "transfer_id", "to_bed_id"]);
        assert!(transport.requests().is_empty());

        let err = service
            .add_ward_round("../x", &json!({ "notes": "Stable" }))
            .await
            .unwrap_err();
        assert!(err.has_violation("flow_id"));
        assert_eq!(err.violations.len(), 1);
    }

    #[tokio::test]
    async fn update_transfer_targets_the_transfer() {
        let transport = RecordingTransport::replying(json!({ "id": FLOW }));
        let service = IpdService::new(gateway(&transport));

        service
            .update_transfer(FLOW, "TRF-9", &json!({ "action": "COMPLETE", "to_bed_id": "B-7" }))
            .await
            .expect("updated");

        let request = transport.only_request();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, format!("/api/v1/ipd/flows/{FLOW}/transfers/TRF-9"));
        assert_eq!(
            request.body,
            Some(json!({ "action": "COMPLETE", "to_bed_id": "B-7" }))
        );
    }

    #[tokio::test]
    async fn ward_record_mutations_post_to_their_resources() {
        let cases: [(&str, Value); 4] = [
            ("bed-assignments", json!({ "bed_id": "B-7" })),
            ("ward-rounds", json!({ "notes": "Stable overnight" })),
            ("nursing-notes", json!({ "note": "Pain controlled", "note_type": "handover" })),
            (
                "medication-administrations",
                json!({
                    "medication_name": "Ceftriaxone",
                    "dose": "1 g",
                    "status": "GIVEN",
                    "administered_at": "2024-05-02T06:00:00Z"
                }),
            ),
        ];

        for (resource, payload) in cases {
            let transport = RecordingTransport::replying(json!({ "id": FLOW }));
            let service = IpdService::new(gateway(&transport));

            let flow = match resource {
                "bed-assignments" => service.assign_bed(FLOW, &payload).await,
                "ward-rounds" => service.add_ward_round(FLOW, &payload).await,
                "nursing-notes" => service.add_nursing_note(FLOW, &payload).await,
                _ => service.record_medication_administration(FLOW, &payload).await,
            }
            .expect("accepted")
            .expect("record");

            assert_eq!(flow.id, FLOW);
            assert_eq!(
                transport.only_request().url,
                format!("/api/v1/ipd/flows/{FLOW}/{resource}")
            );
        }
    }

    #[tokio::test]
    async fn blood_pressure_without_readings_fails_on_both_fields() {
        let transport = RecordingTransport::replying(json!({}));
        let service = IpdService::new(gateway(&transport));

        let err = service
            .record_vitals(FLOW, &json!({ "vitals": [{ "vital_type": "BLOOD_PRESSURE" }] }))
            .await
            .unwrap_err();

        assert!(err.has_violation("vitals[0].systolic_value"));
        assert!(err.has_violation("vitals[0].diastolic_value"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn not_found_is_classified() {
        let transport =
            RecordingTransport::failing(TransportFailure::new(404, "no such admission"));
        let service = IpdService::new(gateway(&transport));

        let err = service.get_flow(FLOW).await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::NotFound);
        assert_eq!(transport.only_request().url, format!("/api/v1/ipd/flows/{FLOW}"));
    }

    #[tokio::test]
    async fn non_record_reply_is_none() {
        let transport = RecordingTransport::replying(json!("accepted"));
        let service = IpdService::new(gateway(&transport));

        let reply = service
            .transition(FLOW, &json!({ "action": "CANCEL_ADMISSION" }))
            .await
            .expect("sent");
        assert_eq!(reply, None);
    }
}
