//! In-memory fakes for the transport seam (testing only)
//!
//! Provides `ScriptedTransport`, which replays a queue of canned responses
//! and records every call, so client and poll-loop behavior can be verified
//! without any network.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::transport::{Transport, TransportError, TransportResponse};

/// One request observed by a [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// HTTP method used.
    pub method: Method,
    /// Request path, base path included.
    pub path: String,
    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
    /// JSON body, if one was sent.
    pub body: Option<Value>,
}

/// Transport fake that pops one scripted response per request.
///
/// An exhausted script yields a network error, so a test that makes more
/// calls than it scripted fails loudly instead of hanging.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a JSON response with the given HTTP status.
    pub fn push_json(&self, status: u16, body: Value) {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(TransportResponse { status, body }));
    }

    /// Script a connection-level failure.
    pub fn push_network_error(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(TransportError::Network(message.to_string())));
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            body,
        });

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("script exhausted".to_string())))
    }
}
