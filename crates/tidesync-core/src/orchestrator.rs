//! Trigger-and-wait composition over the client and poll loop.

use serde_json::Value;
use tracing::{info, warn};

use crate::client::SyncClient;
use crate::poll::{poll_run, PollPolicy};
use crate::record::RunRecord;
use crate::types::{JobReference, RunHandle};
use crate::Result;

/// Everything known about a sync once its run reached an accepted
/// terminal state.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Canonical id of the sync (resolved from the slug when needed).
    pub sync_id: String,
    /// Handle of the run this invocation triggered.
    pub handle: RunHandle,
    /// Final run snapshot.
    pub run: RunRecord,
    /// The run ended in `warning` and the policy accepted it.
    pub accepted_with_warning: bool,
    /// Supplementary sync detail document, when the post-completion
    /// lookup succeeded.
    pub sync_details: Option<Value>,
}

/// Result of [`SyncOrchestrator::run_sync`].
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// Fire-and-forget: trigger accepted, no polling performed.
    Triggered(RunHandle),
    /// Polled to completion.
    Completed(SyncReport),
}

/// Result of a single-shot run probe.
#[derive(Debug, Clone)]
pub enum RunProbe {
    /// Run has not reached a terminal state yet.
    Pending(RunRecord),
    /// Run finished in an accepted terminal state.
    Complete(RunRecord),
}

/// Composes the trigger request and the poll loop into one operation.
///
/// Each call owns its own run handle and loop state; an orchestrator can
/// serve any number of concurrent invocations, which share nothing but
/// the remote endpoint itself.
#[derive(Clone)]
pub struct SyncOrchestrator {
    client: SyncClient,
}

impl SyncOrchestrator {
    pub fn new(client: SyncClient) -> Self {
        SyncOrchestrator { client }
    }

    /// The underlying client.
    pub fn client(&self) -> &SyncClient {
        &self.client
    }

    /// User-facing dashboard link. Static; the observed API exposes no
    /// per-sync dashboard path.
    pub fn web_link(&self) -> &'static str {
        crate::config::WEB_BASE_URL
    }

    /// Trigger a run and return immediately with its handle.
    pub async fn trigger_only(&self, job: &JobReference) -> Result<RunHandle> {
        let handle = self.client.trigger(job).await?;
        info!(sync = %job, run_id = handle.id(), "created sync run request");
        Ok(handle)
    }

    /// Trigger a run and poll it to a terminal state.
    ///
    /// When the job is referenced by slug only, its canonical id is
    /// resolved with exactly one lookup call before polling, since the
    /// runs endpoint is keyed by id. After an accepted completion the
    /// sync's detail document is fetched best-effort: a failure there is
    /// logged, never turned into a sync failure.
    pub async fn trigger_and_wait(
        &self,
        job: &JobReference,
        policy: &PollPolicy,
    ) -> Result<SyncReport> {
        job.validate()?;
        let handle = self.client.trigger(job).await?;
        let sync_id = self.canonical_id(job).await?;

        let outcome = poll_run(&self.client, &sync_id, &handle, policy).await?;
        let (run, accepted_with_warning) = outcome.into_parts();

        let sync_details = match self.client.sync_details(&sync_id).await {
            Ok(details) => Some(details),
            Err(err) => {
                warn!(sync_id, "sync completed but detail lookup failed: {err}");
                None
            }
        };

        info!(
            sync_id,
            run_id = handle.id(),
            status = %run.status,
            accepted_with_warning,
            "sync run complete"
        );

        Ok(SyncReport {
            sync_id,
            handle,
            run,
            accepted_with_warning,
            sync_details,
        })
    }

    /// Trigger and optionally wait, as one entry point.
    pub async fn run_sync(
        &self,
        job: &JobReference,
        policy: &PollPolicy,
        synchronous: bool,
    ) -> Result<SyncOutcome> {
        if synchronous {
            self.trigger_and_wait(job, policy)
                .await
                .map(SyncOutcome::Completed)
        } else {
            self.trigger_only(job).await.map(SyncOutcome::Triggered)
        }
    }

    /// Inspect a run once and report whether it finished.
    ///
    /// For callers that schedule their own cadence (external sensors).
    /// A failed, cancelled, or disallowed-warning terminal state is
    /// returned as the corresponding error, exactly as the poll loop
    /// would classify it.
    pub async fn probe_run(
        &self,
        sync_id: &str,
        run: &RunHandle,
        fail_on_warning: bool,
    ) -> Result<RunProbe> {
        use crate::error::SyncError;
        use crate::status::CanonicalStatus;

        let record = self.client.fetch_run(sync_id, run).await?;
        if !record.status.is_terminal() {
            return Ok(RunProbe::Pending(record));
        }

        match record.status {
            CanonicalStatus::Succeeded => Ok(RunProbe::Complete(record)),
            CanonicalStatus::Warning if !fail_on_warning => Ok(RunProbe::Complete(record)),
            _ => Err(SyncError::terminal_failure(sync_id, run.id(), &record)),
        }
    }

    /// Resolve the job's canonical id, calling the remote only when the
    /// reference carries a slug and no id.
    async fn canonical_id(&self, job: &JobReference) -> Result<String> {
        use crate::error::SyncError;

        match (job.id(), job.slug()) {
            (Some(id), _) => Ok(id.to_string()),
            (None, Some(slug)) => self.client.resolve_id(slug).await,
            (None, None) => Err(SyncError::InvalidReference),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::fakes::ScriptedTransport;
    use crate::status::{ApiVersion, CanonicalStatus};
    use serde_json::json;
    use std::sync::Arc;

    fn orchestrator(transport: Arc<ScriptedTransport>) -> SyncOrchestrator {
        SyncOrchestrator::new(SyncClient::with_transport(transport, ApiVersion::V3))
    }

    #[tokio::test]
    async fn test_trigger_only_makes_one_call() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({"data": {"id": "123"}}));
        let orch = orchestrator(transport.clone());

        let handle = orch.trigger_only(&JobReference::by_id("1")).await.unwrap();

        assert_eq!(handle.id(), "123");
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_run_sync_asynchronous_skips_polling() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({"data": {"id": "123"}}));
        let orch = orchestrator(transport.clone());

        let outcome = orch
            .run_sync(&JobReference::by_id("1"), &PollPolicy::default(), false)
            .await
            .unwrap();

        assert!(matches!(outcome, SyncOutcome::Triggered(_)));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_run_sync_invalid_reference_no_calls() {
        let transport = Arc::new(ScriptedTransport::new());
        let orch = orchestrator(transport.clone());

        let err = orch
            .run_sync(&JobReference::new(None, None), &PollPolicy::default(), true)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::InvalidReference));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_probe_run_pending() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({"data": [{"id": "42", "status": "processing"}]}));
        let orch = orchestrator(transport);

        let probe = orch
            .probe_run("1", &RunHandle::new("42"), false)
            .await
            .unwrap();

        assert!(matches!(probe, RunProbe::Pending(_)));
    }

    #[tokio::test]
    async fn test_probe_run_complete() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({"data": [{"id": "42", "status": "success"}]}));
        let orch = orchestrator(transport);

        let probe = orch
            .probe_run("1", &RunHandle::new("42"), false)
            .await
            .unwrap();

        match probe {
            RunProbe::Complete(record) => assert_eq!(record.status, CanonicalStatus::Succeeded),
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_probe_run_disallowed_warning_fails() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(
            200,
            json!({"data": [{"id": "42", "status": "warning", "error": "partial rows"}]}),
        );
        let orch = orchestrator(transport);

        let err = orch
            .probe_run("1", &RunHandle::new("42"), true)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::TerminalFailure { .. }));
    }

    #[tokio::test]
    async fn test_web_link_is_static() {
        let transport = Arc::new(ScriptedTransport::new());
        let orch = orchestrator(transport);
        assert_eq!(orch.web_link(), "https://app.tidesync.io");
    }
}
