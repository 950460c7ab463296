//! Normalized snapshots of a sync run's state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::status::{ApiVersion, CanonicalStatus};

/// One immutable snapshot of a run, produced fresh on every poll.
///
/// The raw payload is kept verbatim so callers can inspect fields this
/// client does not model (row counts, timestamps, query sizes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Canonical classification of the run's progress.
    pub status: CanonicalStatus,

    /// Fraction of the run completed, in `[0, 1]`, when reported.
    pub completion_ratio: Option<f64>,

    /// Error message reported by the remote, if any.
    pub error_detail: Option<String>,

    /// The raw per-run payload as received.
    pub raw: Value,
}

impl RunRecord {
    /// Normalize one per-run payload from the given API version.
    ///
    /// Tolerant by construction: a missing or non-string `status` becomes
    /// [`CanonicalStatus::Unknown`], both `completionRatio` and
    /// `completion_ratio` wire keys are accepted, and `error` may be null.
    pub fn from_payload(payload: &Value, version: ApiVersion) -> Self {
        let status = payload
            .get("status")
            .and_then(Value::as_str)
            .map(|raw| CanonicalStatus::normalize(raw, version))
            .unwrap_or(CanonicalStatus::Unknown);

        let completion_ratio = payload
            .get("completionRatio")
            .or_else(|| payload.get("completion_ratio"))
            .and_then(Value::as_f64)
            .map(|ratio| ratio.clamp(0.0, 1.0));

        let error_detail = payload
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string);

        RunRecord {
            status,
            completion_ratio,
            error_detail,
            raw: payload.clone(),
        }
    }

    /// Sentinel returned when a trigger has been accepted but the backing
    /// run record has not materialized yet. Keeps the poll loop's contract
    /// uniform: the run counts as queued and polling continues.
    pub fn queued_placeholder() -> Self {
        RunRecord {
            status: CanonicalStatus::Queued,
            completion_ratio: None,
            error_detail: Some("trigger accepted; run record not yet available".to_string()),
            raw: Value::Null,
        }
    }

    /// Completion as a percentage for logging, 0 when unreported.
    pub fn completion_percent(&self) -> f64 {
        self.completion_ratio.unwrap_or(0.0) * 100.0
    }
}
