//! Theatre case operations: scheduling, stage changes and the perioperative record.

use crate::constants::THEATRE_FLOWS_PATH;
use crate::error::ClassifiedResult;
use crate::gateway::Gateway;
use flow_contracts::theatre::{
    AddPostOpNote, RecordAnesthesiaObservation, RecordChecklistAttestation, ScheduleTheatreCase,
    TheatreFlowListParams, TheatreTransition,
};
use flow_contracts::Contracted;
use flow_snapshots::{
    normalize_theatre_flow_list, normalize_theatre_flow_snapshot, ListEnvelope,
    TheatreFlowSnapshot,
};
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct TheatreService {
    gateway: Gateway,
}

type CaseReply = ClassifiedResult<Option<TheatreFlowSnapshot>>;

impl TheatreService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list_flows(
        &self,
        params: &Value,
    ) -> ClassifiedResult<ListEnvelope<TheatreFlowSnapshot>> {
        const OP: &str = "theatre.list_flows";
        let params: TheatreFlowListParams = self.gateway.parse(OP, params)?;
        let url = self.gateway.list_url(OP, THEATRE_FLOWS_PATH, &params)?;

        let data = self.gateway.get(OP, url).await?;
        Ok(normalize_theatre_flow_list(&data))
    }

    pub async fn get_flow(&self, flow_id: &str) -> CaseReply {
        const OP: &str = "theatre.get_flow";
        let flow_id = self.gateway.flow_id(OP, "flow_id", flow_id)?;
        let url = self.gateway.url(&format!("{THEATRE_FLOWS_PATH}/{flow_id}"));

        let data = self.gateway.get(OP, url).await?;
        Ok(normalize_theatre_flow_snapshot(&data))
    }

    pub async fn schedule_case(&self, payload: &Value) -> CaseReply {
        const OP: &str = "theatre.schedule_case";
        let payload: ScheduleTheatreCase = self.gateway.parse(OP, payload)?;
        let url = self.gateway.url(THEATRE_FLOWS_PATH);

        let data = self.gateway.post(OP, url, &payload).await?;
        Ok(normalize_theatre_flow_snapshot(&data))
    }

    pub async fn transition(&self, flow_id: &str, payload: &Value) -> CaseReply {
        self.post_to::<TheatreTransition>("theatre.transition", flow_id, "transitions", payload)
            .await
    }

    pub async fn record_anesthesia_observation(&self, flow_id: &str, payload: &Value) -> CaseReply {
        self.post_to::<RecordAnesthesiaObservation>(
            "theatre.record_anesthesia_observation",
            flow_id,
            "anesthesia-observations",
            payload,
        )
        .await
    }

    pub async fn add_post_op_note(&self, flow_id: &str, payload: &Value) -> CaseReply {
        self.post_to::<AddPostOpNote>("theatre.add_post_op_note", flow_id, "post-op-notes", payload)
            .await
    }

    pub async fn record_checklist_attestation(&self, flow_id: &str, payload: &Value) -> CaseReply {
        self.post_to::<RecordChecklistAttestation>(
            "theatre.record_checklist_attestation",
            flow_id,
            "checklist-attestations",
            payload,
        )
        .await
    }

    async fn post_to<P: Contracted>(
        &self,
        operation: &'static str,
        flow_id: &str,
        resource: &str,
        payload: &Value,
    ) -> CaseReply {
        let ([flow_id], payload): (_, P) =
            self.gateway.parse_at(operation, [("flow_id", flow_id)], payload)?;
        let url = self
            .gateway
            .url(&format!("{THEATRE_FLOWS_PATH}/{flow_id}/{resource}"));

        let data = self.gateway.post(operation, url, &payload).await?;
        Ok(normalize_theatre_flow_snapshot(&data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::testing::{gateway, RecordingTransport};
    use crate::transport::TransportFailure;
    use serde_json::json;

    const CASE: &str = "TH-2024-0019";

    #[tokio::test]
    async fn schedule_case_posts_to_the_collection() {
        let transport = RecordingTransport::replying(json!({
            "id": CASE,
            "stage": "scheduled",
            "procedure_name": "Appendectomy"
        }));
        let service = TheatreService::new(gateway(&transport));

        let case = service
            .schedule_case(&json!({
                "patient_id": "PT-0042",
                "procedure_name": " Appendectomy ",
                "priority": "urgent"
            }))
            .await
            .expect("scheduled")
            .expect("record");
        assert_eq!(case.stage_label, "Scheduled");

        let request = transport.only_request();
        assert_eq!(request.url, "/api/v1/theatre/flows");
        assert_eq!(
            request.body,
            Some(json!({
                "patient_id": "PT-0042",
                "procedure_name": "Appendectomy",
                "priority": "URGENT"
            }))
        );
    }

    #[tokio::test]
    async fn empty_observation_is_rejected() {
        let transport = RecordingTransport::replying(json!({}));
        let service = TheatreService::new(gateway(&transport));

        let err = service
            .record_anesthesia_observation(CASE, &json!({ "observed_at": "2024-06-10T08:40:00Z" }))
            .await
            .unwrap_err();
        assert!(err.has_violation("vitals"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn unconfirmed_checklist_needs_notes() {
        let transport = RecordingTransport::replying(json!({}));
        let service = TheatreService::new(gateway(&transport));

        let err = service
            .record_checklist_attestation(CASE, &json!({ "phase": "SIGN_OUT", "confirmed": "no" }))
            .await
            .unwrap_err();
        assert!(err.has_violation("notes"));
    }

    #[tokio::test]
    async fn perioperative_mutations_post_to_their_resources() {
        let transport = RecordingTransport::replying(json!({ "id": CASE }));
        let service = TheatreService::new(gateway(&transport));

        service
            .add_post_op_note(CASE, &json!({ "note": "Uneventful" }))
            .await
            .expect("note");
        assert_eq!(
            transport.only_request().url,
            format!("/api/v1/theatre/flows/{CASE}/post-op-notes")
        );
    }

    #[tokio::test]
    async fn list_failure_is_classified() {
        let transport = RecordingTransport::failing(TransportFailure::new(503, "maintenance"));
        let service = TheatreService::new(gateway(&transport));

        let err = service
            .list_flows(&json!({ "priority": "EMERGENCY" }))
            .await
            .unwrap_err();
        assert_eq!(err.category, ErrorCategory::Unavailable);
        assert_eq!(err.operation, "theatre.list_flows");
    }
}
