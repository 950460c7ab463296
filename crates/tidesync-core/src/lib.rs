//! Tidesync-Core: trigger and track remote data-sync runs.
//!
//! This crate is the client-side orchestration layer for the tidesync
//! HTTP API: it submits a trigger request for a sync (by id or slug),
//! resolves the run it created, and polls that run to a terminal outcome
//! under a caller-supplied interval/timeout/warning policy.
//!
//! ## Key Components
//!
//! - [`SyncClient`]: trigger, slug resolution, and run inspection
//! - [`poll_run`]: the polling state machine
//! - [`SyncOrchestrator`]: "trigger and optionally wait" in one call
//! - [`CanonicalStatus`]: version-independent run classification
//!
//! Remote I/O is behind the [`Transport`](transport::Transport) trait;
//! the `fakes` module provides a scripted in-memory transport for tests.
//!
//! ```no_run
//! use tidesync_core::{
//!     ApiVersion, ConnectionConfig, JobReference, PollPolicy, SyncClient, SyncOrchestrator,
//! };
//!
//! # async fn example() -> tidesync_core::Result<()> {
//! let client = SyncClient::new(&ConnectionConfig::from_env(), ApiVersion::V3);
//! let orchestrator = SyncOrchestrator::new(client);
//! let report = orchestrator
//!     .trigger_and_wait(&JobReference::by_slug("nightly-contacts"), &PollPolicy::default())
//!     .await?;
//! println!("final status: {}", report.run.status);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
mod error;
pub mod fakes;
pub mod orchestrator;
pub mod poll;
pub mod record;
pub mod status;
pub mod transport;
mod types;

pub use client::SyncClient;
pub use config::{ConnectionConfig, DEFAULT_POLL_INTERVAL, WEB_BASE_URL};
pub use error::SyncError;
pub use orchestrator::{RunProbe, SyncOrchestrator, SyncOutcome, SyncReport};
pub use poll::{poll_run, PollOutcome, PollPolicy};
pub use record::RunRecord;
pub use status::{ApiVersion, CanonicalStatus};
pub use types::{JobReference, RunHandle};

/// Result type for tidesync-core operations
pub type Result<T> = std::result::Result<T, SyncError>;
