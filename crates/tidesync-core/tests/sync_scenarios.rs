//! End-to-end trigger-and-wait scenarios over the scripted fake transport.
//!
//! These exercise the orchestrator, client, and poll loop together the way
//! a host scheduler would drive them. Time-sensitive cases run under
//! tokio's paused clock, so sleeps resolve instantly and deterministically.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tidesync_core::fakes::ScriptedTransport;
use tidesync_core::{
    ApiVersion, CanonicalStatus, JobReference, PollPolicy, SyncClient, SyncError, SyncOrchestrator,
    SyncOutcome,
};

fn orchestrator(transport: Arc<ScriptedTransport>, version: ApiVersion) -> SyncOrchestrator {
    SyncOrchestrator::new(SyncClient::with_transport(transport, version))
}

fn run_entry(status: &str, error: Option<&str>) -> serde_json::Value {
    json!({"data": [{
        "id": "42",
        "status": status,
        "completionRatio": 0.54,
        "error": error
    }]})
}

// ===========================================================================
// Scenario A/B: clean successes
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn success_on_first_poll_completes_in_one_tick() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_json(200, json!({"id": "42"}));
    transport.push_json(200, run_entry("success", None));
    transport.push_json(200, json!({"data": {"id": "1", "slug": "testsync"}}));
    let orch = orchestrator(transport.clone(), ApiVersion::V2);

    let report = orch
        .trigger_and_wait(&JobReference::by_id("1"), &PollPolicy::default())
        .await
        .unwrap();

    assert_eq!(report.run.status, CanonicalStatus::Succeeded);
    assert!(!report.accepted_with_warning);
    assert_eq!(report.sync_details.unwrap()["slug"], "testsync");

    // one trigger, one poll, one detail lookup - and v2 endpoints throughout
    let calls = transport.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].path, "api/v2/rest/syncs/trigger");
    assert_eq!(calls[1].path, "api/v2/rest/syncs/1/runs");
    assert_eq!(calls[2].path, "api/v2/rest/syncs/1");
}

#[tokio::test(start_paused = true)]
async fn pending_then_success_takes_exactly_two_ticks() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_json(200, json!({"id": "42"}));
    transport.push_json(200, run_entry("pending", None));
    transport.push_json(200, run_entry("success", None));
    transport.push_json(200, json!({"id": "1"}));
    let orch = orchestrator(transport.clone(), ApiVersion::V2);

    let started = tokio::time::Instant::now();
    let report = orch
        .trigger_and_wait(
            &JobReference::by_id("1"),
            &PollPolicy::new(Duration::from_millis(500)),
        )
        .await
        .unwrap();

    assert_eq!(report.run.status, CanonicalStatus::Succeeded);
    // two poll ticks separated by exactly one sleep interval
    assert_eq!(transport.calls().len(), 4);
    assert_eq!(started.elapsed(), Duration::from_millis(500));
}

// ===========================================================================
// Scenario C/D: warnings under both policies
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn warning_with_fail_on_warning_is_terminal_failure() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_json(200, json!({"id": "42"}));
    transport.push_json(200, run_entry("warning", Some("some rows skipped")));
    let orch = orchestrator(transport, ApiVersion::V2);

    let err = orch
        .trigger_and_wait(
            &JobReference::by_id("1"),
            &PollPolicy::default().with_fail_on_warning(true),
        )
        .await
        .unwrap_err();

    match err {
        SyncError::TerminalFailure { status, detail, .. } => {
            assert_eq!(status, CanonicalStatus::Warning);
            assert_eq!(detail, "some rows skipped");
        }
        other => panic!("expected TerminalFailure, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn warning_accepted_when_policy_allows() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_json(200, json!({"id": "42"}));
    transport.push_json(200, run_entry("warning", Some("some rows skipped")));
    transport.push_json(200, json!({"id": "1"}));
    let orch = orchestrator(transport, ApiVersion::V2);

    let report = orch
        .trigger_and_wait(&JobReference::by_id("1"), &PollPolicy::default())
        .await
        .unwrap();

    assert_eq!(report.run.status, CanonicalStatus::Warning);
    assert!(report.accepted_with_warning);
}

// ===========================================================================
// Scenario E: deadline on a run that never finishes
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn always_pending_times_out_at_deadline() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_json(200, json!({"id": "42"}));
    for _ in 0..4 {
        transport.push_json(200, run_entry("pending", None));
    }
    let orch = orchestrator(transport.clone(), ApiVersion::V2);

    let started = tokio::time::Instant::now();
    let err = orch
        .trigger_and_wait(
            &JobReference::by_id("1"),
            &PollPolicy::new(Duration::from_millis(500)).with_timeout(Duration::from_secs(1)),
        )
        .await
        .unwrap_err();

    match err {
        SyncError::TimedOut {
            elapsed,
            last_status,
            ..
        } => {
            assert!(elapsed >= Duration::from_secs(1));
            assert_eq!(last_status, CanonicalStatus::Queued);
        }
        other => panic!("expected TimedOut, got {other:?}"),
    }
    // terminated at, not just after, the deadline
    assert_eq!(started.elapsed(), Duration::from_secs(1));
}

// ===========================================================================
// Scenario F: transient remote flakiness is absorbed
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn one_transient_error_then_success_is_not_surfaced() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_json(200, json!({"id": "42"}));
    transport.push_json(503, json!("upstream unavailable"));
    transport.push_json(200, run_entry("success", None));
    transport.push_json(200, json!({"id": "1"}));
    let orch = orchestrator(transport.clone(), ApiVersion::V2);

    let report = orch
        .trigger_and_wait(
            &JobReference::by_id("1"),
            &PollPolicy::new(Duration::from_millis(500)),
        )
        .await
        .unwrap();

    assert_eq!(report.run.status, CanonicalStatus::Succeeded);
    assert_eq!(transport.calls().len(), 4);
}

// ===========================================================================
// Identity resolution and call-count properties
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn slug_only_makes_one_trigger_and_one_resolution_call() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_json(200, json!({"data": {"id": "42"}}));
    transport.push_json(200, json!({"data": [{"id": "7", "slug": "weekly-accounts"}]}));
    transport.push_json(200, run_entry("success", None));
    transport.push_json(200, json!({"data": {"id": "7"}}));
    let orch = orchestrator(transport.clone(), ApiVersion::V3);

    let report = orch
        .trigger_and_wait(
            &JobReference::by_slug("weekly-accounts"),
            &PollPolicy::default(),
        )
        .await
        .unwrap();

    assert_eq!(report.sync_id, "7");
    let calls = transport.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0].path, "api/v1/syncs/trigger");
    assert_eq!(calls[0].body.as_ref().unwrap()["syncSlug"], "weekly-accounts");
    assert_eq!(calls[1].path, "api/v1/syncs");
    assert_eq!(calls[2].path, "api/v1/syncs/7/runs");
}

#[tokio::test]
async fn empty_reference_fails_before_any_remote_call() {
    let transport = Arc::new(ScriptedTransport::new());
    let orch = orchestrator(transport.clone(), ApiVersion::V3);

    let err = orch
        .run_sync(&JobReference::new(None, None), &PollPolicy::default(), true)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::InvalidReference));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn fire_and_forget_returns_handle_without_polling() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_json(200, json!({"data": {"id": "900"}}));
    let orch = orchestrator(transport.clone(), ApiVersion::V3);

    let outcome = orch
        .run_sync(&JobReference::by_id("1"), &PollPolicy::default(), false)
        .await
        .unwrap();

    match outcome {
        SyncOutcome::Triggered(handle) => assert_eq!(handle.id(), "900"),
        other => panic!("expected Triggered, got {other:?}"),
    }
    assert_eq!(transport.calls().len(), 1);
}

// ===========================================================================
// Post-completion detail lookup is best-effort
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn detail_lookup_failure_does_not_fail_a_completed_sync() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_json(200, json!({"data": {"id": "42"}}));
    transport.push_json(200, run_entry("success", None));
    transport.push_json(500, json!("details unavailable"));
    let orch = orchestrator(transport, ApiVersion::V3);

    let report = orch
        .trigger_and_wait(&JobReference::by_id("1"), &PollPolicy::default())
        .await
        .unwrap();

    assert_eq!(report.run.status, CanonicalStatus::Succeeded);
    assert!(report.sync_details.is_none());
}

// ===========================================================================
// The materialization race: trigger accepted, run record not yet visible
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn missing_run_record_counts_as_queued_and_polling_continues() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_json(200, json!({"data": {"id": "42"}}));
    transport.push_json(200, json!({"data": []}));
    transport.push_json(200, run_entry("success", None));
    transport.push_json(200, json!({"data": {"id": "1"}}));
    let orch = orchestrator(transport.clone(), ApiVersion::V3);

    let report = orch
        .trigger_and_wait(
            &JobReference::by_id("1"),
            &PollPolicy::new(Duration::from_millis(500)),
        )
        .await
        .unwrap();

    assert_eq!(report.run.status, CanonicalStatus::Succeeded);
    assert_eq!(transport.calls().len(), 4);
}
