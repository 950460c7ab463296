//! HTTP transport seam.
//!
//! All remote I/O goes through the [`Transport`] trait so the client,
//! poll loop, and orchestrator can be exercised against in-memory fakes
//! (see the `fakes` module). [`HttpTransport`] is the real implementation,
//! backed by `reqwest` with bearer-token auth.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::ConnectionConfig;

/// A raw HTTP exchange result: status code plus parsed body.
///
/// Bodies that are not valid JSON are carried as a JSON string so error
/// messages from proxies and gateways still surface.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, parsed as JSON when possible.
    pub body: Value,
}

/// Failures below the HTTP layer (connection refused, DNS, TLS).
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request never produced an HTTP response.
    #[error("network failure: {0}")]
    Network(String),
}

/// One remote exchange. Implementations perform exactly one request per
/// call; retry policy lives with the callers.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a single request and return the raw response.
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<TransportResponse, TransportError>;
}

/// Transport backed by a shared `reqwest` client.
pub struct HttpTransport {
    client: reqwest::Client,
    host: String,
    token: Option<String>,
}

impl HttpTransport {
    /// Build a transport for the configured endpoint.
    pub fn new(config: &ConnectionConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .expect("Failed to create HTTP client");

        HttpTransport {
            client,
            host: config.host.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<TransportResponse, TransportError> {
        let url = format!("{}/{}", self.host, path);
        debug!(%method, %url, "sending request");

        let mut request = self.client.request(method, &url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(TransportResponse { status, body })
    }
}
