//! In-memory transport for service tests.

use crate::config::CoreConfig;
use crate::gateway::Gateway;
use crate::transport::{Transport, TransportFailure, TransportRequest, TransportResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Records every request and answers from a queue of canned replies (`null` once drained).
#[derive(Default)]
pub(crate) struct RecordingTransport {
    requests: Mutex<Vec<TransportRequest>>,
    replies: Mutex<VecDeque<anyhow::Result<Value>>>,
}

impl RecordingTransport {
    pub(crate) fn replying(data: Value) -> Arc<Self> {
        let transport = Self::default();
        transport.replies.lock().expect("lock").push_back(Ok(data));
        Arc::new(transport)
    }

    pub(crate) fn failing(failure: TransportFailure) -> Arc<Self> {
        let transport = Self::default();
        transport
            .replies
            .lock()
            .expect("lock")
            .push_back(Err(anyhow::Error::new(failure)));
        Arc::new(transport)
    }

    pub(crate) fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().expect("lock").clone()
    }

    /// The single request sent, panicking if there was not exactly one.
    pub(crate) fn only_request(&self) -> TransportRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request: {requests:?}");
        requests.into_iter().next().expect("one request")
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn request(&self, request: TransportRequest) -> anyhow::Result<TransportResponse> {
        self.requests.lock().expect("lock").push(request);
        let reply = self.replies.lock().expect("lock").pop_front();
        reply.unwrap_or(Ok(Value::Null)).map(TransportResponse::new)
    }
}

pub(crate) fn gateway(transport: &Arc<RecordingTransport>) -> Gateway {
    Gateway::new(Arc::new(CoreConfig::default()), transport.clone())
}
