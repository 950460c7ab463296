//! Remote API client: trigger requests, slug resolution, run inspection.
//!
//! `SyncClient` owns the version-specific endpoint layout and the
//! 4xx/5xx classification. It never retries: each method issues exactly
//! one remote query, and retry policy belongs to the poll loop.

use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::error::SyncError;
use crate::record::RunRecord;
use crate::status::ApiVersion;
use crate::transport::{HttpTransport, Transport};
use crate::types::{JobReference, RunHandle};
use crate::Result;

/// Client for one remote endpoint speaking one API version.
///
/// Cheap to share: the transport is behind an `Arc`, and the client holds
/// no per-invocation state.
#[derive(Clone)]
pub struct SyncClient {
    transport: Arc<dyn Transport>,
    api_version: ApiVersion,
}

impl SyncClient {
    /// Build a client over a real HTTP transport.
    pub fn new(config: &ConnectionConfig, api_version: ApiVersion) -> Self {
        SyncClient {
            transport: Arc::new(HttpTransport::new(config)),
            api_version,
        }
    }

    /// Build a client over an arbitrary transport (fakes in tests).
    pub fn with_transport(transport: Arc<dyn Transport>, api_version: ApiVersion) -> Self {
        SyncClient {
            transport,
            api_version,
        }
    }

    /// The API version this client speaks.
    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    /// Trigger a run for the referenced sync.
    ///
    /// Fails with [`SyncError::InvalidReference`] before any remote call
    /// when the reference carries neither id nor slug.
    pub async fn trigger(&self, job: &JobReference) -> Result<RunHandle> {
        let body = match (job.id(), job.slug()) {
            (Some(id), _) => json!({ "syncId": id }),
            (None, Some(slug)) => json!({ "syncSlug": slug }),
            (None, None) => return Err(SyncError::InvalidReference),
        };

        let data = self
            .request(Method::POST, "syncs/trigger", &[], Some(body))
            .await?;

        let run_id = field_as_string(&data, "id")
            .ok_or_else(|| SyncError::Payload("trigger response missing run id".to_string()))?;

        info!(sync = %job, run_id = %run_id, "sync trigger accepted");
        Ok(RunHandle::new(run_id))
    }

    /// Resolve a sync slug to its canonical id via the list endpoint.
    ///
    /// A slug the remote does not know yields [`SyncError::RemoteRejected`];
    /// there is no silent fallback.
    pub async fn resolve_id(&self, slug: &str) -> Result<String> {
        let data = self
            .request(Method::GET, "syncs", &[("slug", slug.to_string())], None)
            .await?;

        data.as_array()
            .and_then(|syncs| syncs.first())
            .and_then(|sync| field_as_string(sync, "id"))
            .ok_or_else(|| SyncError::RemoteRejected {
                status: 404,
                message: format!("no sync found for slug {slug}"),
            })
    }

    /// Fetch the current state of one run. Exactly one remote query.
    ///
    /// The runs listing is ordered most-recent-first; the first entry is
    /// the one scoped to the requested run id. An empty listing means the
    /// trigger was accepted but the run record has not materialized yet,
    /// which is reported as a queued placeholder rather than an error.
    pub async fn fetch_run(&self, sync_id: &str, run: &RunHandle) -> Result<RunRecord> {
        let data = self
            .request(
                Method::GET,
                &format!("syncs/{sync_id}/runs"),
                &[("runId", run.id().to_string())],
                None,
            )
            .await?;

        match data.as_array().and_then(|runs| runs.first()) {
            Some(payload) => Ok(RunRecord::from_payload(payload, self.api_version)),
            None => {
                debug!(sync_id, run_id = run.id(), "run record not yet available");
                Ok(RunRecord::queued_placeholder())
            }
        }
    }

    /// Fetch the sync's own detail document (schedule, configuration,
    /// last-run metadata). Supplementary; polled outcomes do not depend
    /// on it.
    pub async fn sync_details(&self, sync_id: &str) -> Result<Value> {
        self.request(Method::GET, &format!("syncs/{sync_id}"), &[], None)
            .await
    }

    /// Issue one request and classify the response.
    ///
    /// 2xx bodies have their `data` envelope unwrapped when present; 4xx
    /// becomes `RemoteRejected` (do not blindly retry); everything else
    /// becomes `TransientRemote` (the poll loop may retry).
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value> {
        let path = format!("{}{}", self.api_version.base_path(), endpoint);
        let response = self
            .transport
            .request(method, &path, query, body)
            .await
            .map_err(|e| SyncError::TransientRemote {
                message: e.to_string(),
            })?;

        match response.status {
            200..=299 => Ok(unwrap_envelope(response.body)),
            400..=499 => Err(SyncError::RemoteRejected {
                status: response.status,
                message: compact_body(&response.body),
            }),
            status => Err(SyncError::TransientRemote {
                message: format!("HTTP {status}: {}", compact_body(&response.body)),
            }),
        }
    }
}

/// Successful responses wrap their payload in a top-level `data` key.
fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Read a field as a string, accepting both JSON strings and numbers
/// (the remote is inconsistent about numeric ids).
fn field_as_string(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn compact_body(body: &Value) -> String {
    match body {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
