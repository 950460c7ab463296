//! Status vocabularies and their canonical classification.
//!
//! Each API version speaks its own set of raw status strings. The rest of
//! the crate never looks at raw strings: [`CanonicalStatus::normalize`] is
//! the single place version-specific vocabulary is consulted, and whether a
//! status is terminal is a pure function of the canonical value alone.

use serde::{Deserialize, Serialize};

/// Which generation of the remote API a client speaks.
///
/// Selects both the endpoint base path and the status vocabulary. The two
/// vocabularies are kept as separate tables and never merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// Legacy REST surface, served under `api/v2/rest/`.
    V2,
    /// Current product API. Confusingly served under `api/v1/`.
    #[default]
    V3,
}

impl ApiVersion {
    /// Base path prefix for this version's endpoints, with trailing slash.
    pub fn base_path(&self) -> &'static str {
        match self {
            ApiVersion::V2 => "api/v2/rest/",
            ApiVersion::V3 => "api/v1/",
        }
    }

    /// Short tag used in logs and CLI flags.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V2 => "v2",
            ApiVersion::V3 => "v3",
        }
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ApiVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v2" => Ok(ApiVersion::V2),
            "v3" => Ok(ApiVersion::V3),
            other => Err(format!("unsupported API version: {other} (expected v2 or v3)")),
        }
    }
}

/// Version-independent classification of a sync run's progress.
///
/// `Unknown` exists for forward compatibility: a vocabulary string this
/// client has not seen maps here instead of raising, and it is never
/// treated as terminal or as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalStatus {
    /// Run accepted but not yet started.
    Queued,
    /// Run is actively querying, processing, or reporting.
    Running,
    /// Run finished cleanly.
    Succeeded,
    /// Run finished with warnings.
    Warning,
    /// Run failed or was interrupted.
    Failed,
    /// Run was cancelled or aborted.
    Cancelled,
    /// Status string outside the known vocabulary.
    Unknown,
}

impl CanonicalStatus {
    /// Map a raw status string from the given API version to its canonical
    /// value. Total: unrecognized strings become [`CanonicalStatus::Unknown`].
    pub fn normalize(raw: &str, version: ApiVersion) -> Self {
        match version {
            ApiVersion::V3 => match raw {
                "queued" => CanonicalStatus::Queued,
                "querying" | "processing" | "reporting" => CanonicalStatus::Running,
                "success" => CanonicalStatus::Succeeded,
                "warning" => CanonicalStatus::Warning,
                "failed" | "interrupted" => CanonicalStatus::Failed,
                "cancelled" | "aborted" => CanonicalStatus::Cancelled,
                _ => CanonicalStatus::Unknown,
            },
            ApiVersion::V2 => match raw {
                "pending" => CanonicalStatus::Queued,
                "processing" => CanonicalStatus::Running,
                "success" => CanonicalStatus::Succeeded,
                "warning" => CanonicalStatus::Warning,
                "failed" => CanonicalStatus::Failed,
                "cancelled" => CanonicalStatus::Cancelled,
                _ => CanonicalStatus::Unknown,
            },
        }
    }

    /// Whether the remote run will not change further from this status.
    ///
    /// Pure function of the canonical value; `Unknown` is never terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CanonicalStatus::Succeeded
                | CanonicalStatus::Warning
                | CanonicalStatus::Failed
                | CanonicalStatus::Cancelled
        )
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalStatus::Queued => "queued",
            CanonicalStatus::Running => "running",
            CanonicalStatus::Succeeded => "succeeded",
            CanonicalStatus::Warning => "warning",
            CanonicalStatus::Failed => "failed",
            CanonicalStatus::Cancelled => "cancelled",
            CanonicalStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
