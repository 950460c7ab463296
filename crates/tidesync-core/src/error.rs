//! Error types for tidesync-core

use std::time::Duration;

use thiserror::Error;

use crate::record::RunRecord;
use crate::status::CanonicalStatus;

/// Errors that can occur while triggering or tracking a sync run.
///
/// Distinguishes caller mistakes (`InvalidReference`), remote refusals
/// (`RemoteRejected`), flakiness (`TransientRemote`), and business outcomes
/// (`TerminalFailure`, `TimedOut`) so a host scheduler can decide what to
/// retry.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Neither a sync id nor a sync slug was provided.
    #[error("one of sync id or sync slug must be provided to trigger a sync")]
    InvalidReference,

    /// The remote service refused the request (4xx). Not retried.
    #[error("remote rejected the request (HTTP {status}): {message}")]
    RemoteRejected {
        /// HTTP status code returned by the remote.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// A 5xx or network-level failure. Retried by the poll loop only.
    #[error("transient remote failure: {message}")]
    TransientRemote {
        /// What went wrong at the transport level.
        message: String,
    },

    /// The sync run itself finished in a failed, cancelled, or
    /// disallowed-warning state. A business outcome, not a transport error.
    #[error("sync {sync_id} run {run_id} finished with status {status}: {detail}")]
    TerminalFailure {
        /// Canonical id of the sync.
        sync_id: String,
        /// Id of the run that failed.
        run_id: String,
        /// Canonical status the run ended in.
        status: CanonicalStatus,
        /// Error detail reported by the remote, if any.
        detail: String,
    },

    /// The wall-clock deadline expired while the run was still non-terminal.
    #[error("sync {sync_id} run {run_id} timed out after {elapsed:?} (last status: {last_status})")]
    TimedOut {
        /// Canonical id of the sync.
        sync_id: String,
        /// Id of the run being polled.
        run_id: String,
        /// Time elapsed since the poll loop started.
        elapsed: Duration,
        /// Last canonical status observed before the deadline.
        last_status: CanonicalStatus,
    },

    /// The remote answered but the payload was not shaped as expected.
    #[error("unexpected payload from remote: {0}")]
    Payload(String),
}

impl SyncError {
    /// Build a `TerminalFailure` from the record that ended the run.
    pub(crate) fn terminal_failure(sync_id: &str, run_id: &str, record: &RunRecord) -> Self {
        SyncError::TerminalFailure {
            sync_id: sync_id.to_string(),
            run_id: run_id.to_string(),
            status: record.status,
            detail: record
                .error_detail
                .clone()
                .unwrap_or_else(|| "no error detail provided".to_string()),
        }
    }

    /// Whether the poll loop may absorb this error and keep polling.
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::TransientRemote { .. })
    }
}
