//! IssueMirror daemon entry point.
//!
//! Loads configuration, builds the tracker clients, and syncs every open
//! GitHub issue on a fixed interval until a shutdown signal arrives.

mod scheduler;
mod signals;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use issuemirror_core::{HttpIssueMirror, MirrorConfig};

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// IssueMirror polling daemon.
#[derive(Parser, Debug)]
#[command(
    name = "issuemirror-daemon",
    version,
    about = "Periodically mirror open GitHub issues into a GitLab project"
)]
struct Args {
    /// Path to a TOML configuration file. Without it, configuration is read
    /// from the environment.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Run a single cycle and exit.
    #[arg(long)]
    once: bool,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            MirrorConfig::load_and_resolve(path).context("failed to load configuration file")?
        }
        None => MirrorConfig::from_env().context("failed to read configuration from environment")?,
    };
    config
        .validate()
        .context("configuration validation failed")?;

    // Initialize tracing
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.daemon.log_level);

    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .init();

    // Startup banner
    info!("========================================");
    info!("  IssueMirror Daemon v{}", env!("CARGO_PKG_VERSION"));
    info!("========================================");
    match &args.config {
        Some(path) => info!("Config file   : {}", path.display()),
        None => info!("Config file   : (environment)"),
    }
    info!("GitHub repo   : {}", config.github_repo_slug());
    info!("GitHub API    : {}", config.github.api_url);
    info!("GitLab API    : {}", config.gitlab.api_url());
    info!("GitLab project: {}", config.gitlab.project);
    info!("Poll interval : {}s", config.daemon.poll_interval_secs);
    info!("Log level     : {}", log_level);
    info!("========================================");

    let mirror = Arc::new(
        HttpIssueMirror::from_config(&config).context("failed to initialize tracker clients")?,
    );
    let poll_interval = Duration::from_secs(config.daemon.poll_interval_secs);
    let mut sched = scheduler::Scheduler::new(mirror, poll_interval);

    if args.once {
        sched.run_cycle().await;
        info!("IssueMirror daemon finished single cycle.");
        return Ok(());
    }

    // Shutdown notify for cooperative cancellation
    let shutdown = Arc::new(tokio::sync::Notify::new());
    let scheduler_shutdown = shutdown.clone();

    let mut scheduler_handle = tokio::spawn(async move {
        sched.run(scheduler_shutdown).await;
    });

    tokio::select! {
        _ = signals::wait_for_shutdown() => {
            info!("Shutdown signal received, stopping...");
            shutdown.notify_one();

            // Let an in-flight cycle finish (up to 30s)
            match tokio::time::timeout(Duration::from_secs(30), &mut scheduler_handle).await {
                Ok(Ok(())) => info!("scheduler stopped gracefully"),
                Ok(Err(e)) => warn!("scheduler task error: {}", e),
                Err(_) => {
                    warn!("scheduler did not stop within 30s, forcing shutdown");
                    scheduler_handle.abort();
                }
            }
        }
        res = &mut scheduler_handle => {
            if let Err(e) = res {
                warn!("scheduler task error: {}", e);
            }
        }
    }

    info!("IssueMirror daemon stopped.");
    Ok(())
}
