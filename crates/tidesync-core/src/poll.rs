//! The sync-run polling state machine.
//!
//! One tick = deadline check, one inspection, classification, then sleep.
//! Transient remote failures are absorbed here (the wall-clock deadline
//! still bounds the loop), terminal statuses end it, and everything else
//! keeps it polling. Cancellation is cooperative: dropping the returned
//! future aborts the loop between await points; a trigger that the remote
//! already accepted is never retracted.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::client::SyncClient;
use crate::config::DEFAULT_POLL_INTERVAL;
use crate::error::SyncError;
use crate::record::RunRecord;
use crate::status::CanonicalStatus;
use crate::types::RunHandle;
use crate::Result;

/// How a poll loop waits: cadence, deadline, and warning policy.
///
/// Configuration, not mutable state; one value can drive many loops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Wait between successive status polls.
    pub interval: Duration,
    /// Wall-clock deadline measured from loop start; `None` polls forever.
    pub timeout: Option<Duration>,
    /// Treat a `warning` outcome as a failure.
    pub fail_on_warning: bool,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            fail_on_warning: false,
        }
    }
}

impl PollPolicy {
    /// Policy with the given interval, no deadline, warnings accepted.
    pub fn new(interval: Duration) -> Self {
        PollPolicy {
            interval,
            ..Default::default()
        }
    }

    /// Set a wall-clock deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set whether warnings fail the sync.
    pub fn with_fail_on_warning(mut self, fail_on_warning: bool) -> Self {
        self.fail_on_warning = fail_on_warning;
        self
    }
}

/// How a poll loop ended without error.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Run finished cleanly.
    Succeeded(RunRecord),
    /// Run finished with a warning the policy accepts.
    WarnedAccepted(RunRecord),
}

impl PollOutcome {
    /// The final run snapshot.
    pub fn record(&self) -> &RunRecord {
        match self {
            PollOutcome::Succeeded(record) | PollOutcome::WarnedAccepted(record) => record,
        }
    }

    /// Whether the run completed under the accepted-warning path.
    pub fn accepted_with_warning(&self) -> bool {
        matches!(self, PollOutcome::WarnedAccepted(_))
    }

    /// Unwrap into the final snapshot plus the warning flag.
    pub fn into_parts(self) -> (RunRecord, bool) {
        match self {
            PollOutcome::Succeeded(record) => (record, false),
            PollOutcome::WarnedAccepted(record) => (record, true),
        }
    }
}

/// Poll one run until it reaches a terminal state or the deadline expires.
///
/// The first inspection happens immediately; sleeps come after
/// classification. The deadline is wall-clock from loop start and is
/// re-evaluated at the top of every tick, so transient-error retries can
/// degrade throughput but never extend the loop past its deadline.
pub async fn poll_run(
    client: &SyncClient,
    sync_id: &str,
    run: &RunHandle,
    policy: &PollPolicy,
) -> Result<PollOutcome> {
    let started = Instant::now();
    let mut last_status = CanonicalStatus::Unknown;

    loop {
        if let Some(timeout) = policy.timeout {
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(SyncError::TimedOut {
                    sync_id: sync_id.to_string(),
                    run_id: run.id().to_string(),
                    elapsed,
                    last_status,
                });
            }
        }

        match client.fetch_run(sync_id, run).await {
            Ok(record) => {
                info!(
                    sync_id,
                    run_id = run.id(),
                    status = %record.status,
                    "polling sync run: {:.0}% complete",
                    record.completion_percent()
                );
                last_status = record.status;

                match record.status {
                    CanonicalStatus::Succeeded => {
                        return Ok(PollOutcome::Succeeded(record));
                    }
                    CanonicalStatus::Warning => {
                        if policy.fail_on_warning {
                            return Err(SyncError::terminal_failure(sync_id, run.id(), &record));
                        }
                        warn!(
                            sync_id,
                            run_id = run.id(),
                            "sync run completed with warnings; accepting per policy"
                        );
                        return Ok(PollOutcome::WarnedAccepted(record));
                    }
                    CanonicalStatus::Failed | CanonicalStatus::Cancelled => {
                        return Err(SyncError::terminal_failure(sync_id, run.id(), &record));
                    }
                    CanonicalStatus::Queued | CanonicalStatus::Running => {}
                    CanonicalStatus::Unknown => {
                        warn!(
                            sync_id,
                            run_id = run.id(),
                            "unrecognized sync run status; continuing to poll"
                        );
                    }
                }
            }
            Err(err) if err.is_transient() => {
                warn!(
                    sync_id,
                    run_id = run.id(),
                    "transient remote failure while polling, will retry: {err}"
                );
            }
            Err(err) => return Err(err),
        }

        sleep(policy.interval).await;
    }
}
