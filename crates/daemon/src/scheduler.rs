//! Scheduler that syncs every open GitHub issue on a fixed interval.
//!
//! The first cycle runs immediately. Cycles never overlap: the next wait
//! starts only after the current cycle has finished.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time;
use tracing::{error, info, warn};

use issuemirror_core::tracker::{DestinationTracker, SourceTracker};
use issuemirror_core::IssueMirror;

/// Aggregate statistics across sync cycles.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SchedulerStats {
    pub total_cycles: u64,
    pub total_issues_synced: u64,
    pub total_issue_failures: u64,
    pub total_errors: u64,
    pub consecutive_errors: u64,
}

pub struct Scheduler<S, D> {
    mirror: Arc<IssueMirror<S, D>>,
    poll_interval: Duration,
    stats: SchedulerStats,
}

impl<S, D> Scheduler<S, D>
where
    S: SourceTracker,
    D: DestinationTracker,
{
    pub fn new(mirror: Arc<IssueMirror<S, D>>, poll_interval: Duration) -> Self {
        Self {
            mirror,
            poll_interval,
            stats: SchedulerStats::default(),
        }
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Run cycles until `shutdown` is notified.
    ///
    /// A notification that arrives mid-cycle is kept by the [`Notify`] and
    /// ends the loop once that cycle is done.
    pub async fn run(&mut self, shutdown: Arc<Notify>) {
        info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            "scheduler started"
        );

        loop {
            self.run_cycle().await;

            tokio::select! {
                _ = time::sleep(self.poll_interval) => {}
                _ = shutdown.notified() => {
                    info!("scheduler received shutdown signal");
                    break;
                }
            }
        }

        info!(cycles = self.stats.total_cycles, "scheduler stopped");
    }

    /// Run one full cycle over the open issues and record its outcome.
    pub async fn run_cycle(&mut self) {
        self.stats.total_cycles += 1;
        let cycle = self.stats.total_cycles;
        info!(cycle, "starting sync cycle");

        match self.mirror.sync_open_issues().await {
            Ok(report) => {
                self.stats.consecutive_errors = 0;
                self.stats.total_issues_synced += report.synced.len() as u64;
                self.stats.total_issue_failures += report.failed.len() as u64;

                let created: usize = report.synced.iter().filter(|r| r.issue_created).count();
                let mutations: usize = report.synced.iter().map(|r| r.mutations()).sum();
                info!(
                    cycle,
                    issues = report.issues_seen(),
                    synced = report.synced.len(),
                    failed = report.failed.len(),
                    issues_created = created,
                    mutations,
                    "sync cycle completed"
                );
                for failure in &report.failed {
                    warn!(
                        cycle,
                        issue = failure.source_issue,
                        error = %failure.error,
                        "issue left unsynced this cycle"
                    );
                }
            }
            Err(e) => {
                self.stats.total_errors += 1;
                self.stats.consecutive_errors += 1;
                error!(
                    cycle,
                    error = %e,
                    total_errors = self.stats.total_errors,
                    consecutive_errors = self.stats.consecutive_errors,
                    "sync cycle failed"
                );
            }
        }
    }
}
