//! Value types identifying syncs and their runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Identifies a remote sync by opaque id or human-readable slug.
///
/// Exactly one of the two must be set when triggering; immutable once
/// constructed. Validation is deferred to trigger time so callers can
/// assemble references from optional CLI flags or task parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReference {
    id: Option<String>,
    slug: Option<String>,
}

impl JobReference {
    /// Reference a sync by its opaque id.
    pub fn by_id(id: impl Into<String>) -> Self {
        JobReference {
            id: Some(id.into()),
            slug: None,
        }
    }

    /// Reference a sync by its human-readable slug.
    pub fn by_slug(slug: impl Into<String>) -> Self {
        JobReference {
            id: None,
            slug: Some(slug.into()),
        }
    }

    /// Build from optional parts, e.g. CLI flags. May be invalid; checked
    /// by [`JobReference::validate`] before any remote call is made.
    pub fn new(id: Option<String>, slug: Option<String>) -> Self {
        JobReference { id, slug }
    }

    /// The sync id, if this reference carries one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The sync slug, if this reference carries one.
    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    /// Ensure at least one identity is present.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.id.is_none() && self.slug.is_none() {
            return Err(SyncError::InvalidReference);
        }
        Ok(())
    }
}

impl std::fmt::Display for JobReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.id, &self.slug) {
            (Some(id), _) => write!(f, "{id}"),
            (None, Some(slug)) => write!(f, "{slug}"),
            (None, None) => write!(f, "<unidentified sync>"),
        }
    }
}

/// The run identifier returned by a trigger request.
///
/// Scopes subsequent status queries to this particular run rather than
/// "whatever ran most recently". Normally created by the client when a
/// trigger is accepted; construct one directly only to monitor a run that
/// was triggered elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHandle {
    id: String,
    requested_at: DateTime<Utc>,
}

impl RunHandle {
    /// Wrap a run id handed out by the remote trigger endpoint.
    pub fn new(id: impl Into<String>) -> Self {
        RunHandle {
            id: id.into(),
            requested_at: Utc::now(),
        }
    }

    /// The remote run id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// When the trigger request was accepted, client-side clock.
    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }
}

impl std::fmt::Display for RunHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
