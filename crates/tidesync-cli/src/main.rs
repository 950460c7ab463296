//! tidesync - trigger and monitor remote data-sync runs from the shell
//!
//! ## Commands
//!
//! - `trigger`: start a sync run by id or slug, optionally waiting for it
//! - `status`: probe a previously triggered run once
//! - `link`: print the dashboard URL

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use tidesync_core::{
    ApiVersion, ConnectionConfig, JobReference, PollPolicy, RunHandle, RunProbe, SyncClient,
    SyncOrchestrator, SyncOutcome,
};

#[derive(Parser)]
#[command(name = "tidesync")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Trigger and monitor tidesync data-sync runs", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Named connection to resolve from the environment
    /// (TIDESYNC_<NAME>_HOST / TIDESYNC_<NAME>_TOKEN)
    #[arg(long, global = true)]
    connection: Option<String>,

    /// API version to speak (v2 or v3)
    #[arg(long, global = true, default_value = "v3")]
    api_version: ApiVersion,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trigger a sync run and wait for it to finish
    Trigger {
        /// Sync id to trigger
        #[arg(long)]
        id: Option<String>,

        /// Sync slug to trigger (alternative to --id)
        #[arg(long)]
        slug: Option<String>,

        /// Return immediately after the trigger is accepted
        #[arg(long)]
        no_wait: bool,

        /// Seconds to wait between status polls
        #[arg(long, default_value = "3")]
        interval: u64,

        /// Maximum seconds to wait before giving up
        #[arg(long)]
        timeout: Option<u64>,

        /// Treat a warning outcome as a failure
        #[arg(long)]
        fail_on_warning: bool,
    },

    /// Probe a run once and report whether it finished
    Status {
        /// Sync id the run belongs to
        #[arg(long)]
        sync_id: String,

        /// Run id to probe
        #[arg(long)]
        run_id: String,

        /// Treat a warning outcome as a failure
        #[arg(long)]
        fail_on_warning: bool,
    },

    /// Print the dashboard URL
    Link,
}

/// Wire the global subscriber. `RUST_LOG` wins when set; otherwise the
/// tidesync crates log at debug under `--verbose` and info elsewhere.
fn init_tracing(json: bool, verbose: bool) {
    let directives = if verbose {
        "info,tidesync=debug,tidesync_core=debug"
    } else {
        "info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    let layer = fmt::layer().with_target(false);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(layer.json()).try_init().ok();
    } else {
        registry.with(layer).try_init().ok();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.json, cli.verbose);

    let config = match &cli.connection {
        Some(name) => ConnectionConfig::named(name),
        None => ConnectionConfig::from_env(),
    };
    let client = SyncClient::new(&config, cli.api_version);
    let orchestrator = SyncOrchestrator::new(client);

    match cli.command {
        Commands::Trigger {
            id,
            slug,
            no_wait,
            interval,
            timeout,
            fail_on_warning,
        } => {
            let job = JobReference::new(id, slug);
            let mut policy = PollPolicy::new(Duration::from_secs(interval))
                .with_fail_on_warning(fail_on_warning);
            if let Some(secs) = timeout {
                policy = policy.with_timeout(Duration::from_secs(secs));
            }

            let outcome = orchestrator
                .run_sync(&job, &policy, !no_wait)
                .await
                .context("Failed to run sync")?;

            match outcome {
                SyncOutcome::Triggered(handle) => {
                    println!("run {} requested for sync {job}", handle.id());
                }
                SyncOutcome::Completed(report) => {
                    info!(
                        "sync {} run {} finished: {}",
                        report.sync_id,
                        report.handle.id(),
                        report.run.status
                    );
                    println!("{}", serde_json::to_string_pretty(&report.run)?);
                }
            }
        }

        Commands::Status {
            sync_id,
            run_id,
            fail_on_warning,
        } => {
            let handle = RunHandle::new(run_id);
            let probe = orchestrator
                .probe_run(&sync_id, &handle, fail_on_warning)
                .await
                .context("Failed to probe sync run")?;

            match probe {
                RunProbe::Pending(record) => {
                    println!(
                        "run {handle} still {} ({:.0}% complete)",
                        record.status,
                        record.completion_percent()
                    );
                }
                RunProbe::Complete(record) => {
                    println!("{}", serde_json::to_string_pretty(&record)?);
                }
            }
        }

        Commands::Link => {
            println!("{}", orchestrator.web_link());
        }
    }

    Ok(())
}
