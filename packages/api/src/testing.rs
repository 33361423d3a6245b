//! Scripted transport for tests (enabled by the `test-support` feature).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::transport::{ApiRequest, ApiResponse, Transport, TransportError};

#[derive(Default)]
struct Script {
    responses: VecDeque<Result<ApiResponse, TransportError>>,
    requests: Vec<ApiRequest>,
}

/// Transport that replays queued responses in order and records every request.
///
/// Clones share the queue and the request log. Running out of responses is a
/// transport failure.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON response.
    pub fn respond(&self, status: u16, body: Value) -> &Self {
        let bytes = body.to_string().into_bytes();
        self.script()
            .responses
            .push_back(Ok(ApiResponse::new(status, bytes)));
        self
    }

    /// Queue a response with a raw (possibly empty or non-JSON) body.
    pub fn respond_raw(&self, status: u16, body: &str) -> &Self {
        self.script()
            .responses
            .push_back(Ok(ApiResponse::new(status, body.as_bytes().to_vec())));
        self
    }

    /// Queue a transport failure.
    pub fn fail(&self, message: &str) -> &Self {
        self.script()
            .responses
            .push_back(Err(TransportError::new(message)));
        self
    }

    /// Every request sent so far, oldest first.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.script().requests.clone()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        self.script().requests.last().cloned()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut script = self.script();
        script.requests.push(request);
        script
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new("no scripted response left")))
    }
}
