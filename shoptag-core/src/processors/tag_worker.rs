//! TagWorker processor.
//!
//! The TagWorker is responsible for:
//! - Receiving `TagJob` events accepted by the pipeline in `async` mode
//! - Running the tag merge for each job, one at a time
//! - Publishing a `TagOutcomeReport` for every job
//! - On shutdown, draining queued jobs until the drain deadline and logging
//!   every job it has to abandon
//!
//! Jobs run detached from the request that accepted them, so a sender
//! timing out or disconnecting does not cancel the remote call.

use crate::events::{OutcomeReportSender, TagJob, TagJobReceiver, TagOutcomeReport};
use crate::tagging::{RemoteUpdateOutcome, TagMergeClient};
use kanau::processor::Processor;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// How long queued jobs may keep running after shutdown is signaled.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// TagWorker runs accepted tag merges in the background.
pub struct TagWorker {
    merge: TagMergeClient,
    job_rx: TagJobReceiver,
    report_tx: OutcomeReportSender,
    shutdown_rx: watch::Receiver<bool>,
    drain_timeout: Duration,
}

impl TagWorker {
    /// Create a new TagWorker.
    ///
    /// # Arguments
    ///
    /// * `merge` - Client performing the remote merge
    /// * `job_rx` - Receiver for TagJob events
    /// * `report_tx` - Sender for outcome reports
    /// * `shutdown_rx` - Receiver for shutdown signal
    pub fn new(
        merge: TagMergeClient,
        job_rx: TagJobReceiver,
        report_tx: OutcomeReportSender,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            merge,
            job_rx,
            report_tx,
            shutdown_rx,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    /// Run the TagWorker until shutdown is signaled or all senders are gone.
    pub async fn run(mut self) {
        info!("TagWorker started");

        loop {
            tokio::select! {
                biased;

                // Check for shutdown
                Ok(()) = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("TagWorker received shutdown signal");
                        break;
                    }
                }

                // Receive TagJob events
                Some(job) = self.job_rx.recv() => {
                    debug!(job = ?job, "Received TagJob");
                    self.run_job(job).await;
                }

                else => {
                    info!("TagJob channel closed");
                    break;
                }
            }
        }

        self.drain().await;

        info!("TagWorker shutdown complete");
    }

    /// Run one job to completion and publish its outcome.
    async fn run_job(&self, job: TagJob) {
        let webhook_id = job.webhook_id.clone();
        let outcome = match self.merge.process(job.into()).await {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        };

        if !outcome.success() {
            error!(
                webhook_id = ?webhook_id,
                resource_id = %outcome.resource_id,
                status = ?outcome.status_code,
                detail = %outcome.detail,
                "Background tag update failed"
            );
        }

        self.publish(TagOutcomeReport::new(webhook_id, outcome));
    }

    /// Stop accepting jobs and work off the queue until the drain deadline.
    ///
    /// A job still running at the deadline is cut short; it and every job
    /// after it are reported as abandoned.
    async fn drain(&mut self) {
        self.job_rx.close();
        let deadline = Instant::now() + self.drain_timeout;
        let mut abandoned = 0usize;

        while let Some(job) = self.job_rx.recv().await {
            if Instant::now() >= deadline {
                self.abandon(job, "shutdown drain deadline passed before start");
                abandoned += 1;
                continue;
            }
            if tokio::time::timeout_at(deadline, self.run_job(job.clone()))
                .await
                .is_err()
            {
                self.abandon(job, "cut short by shutdown drain deadline");
                abandoned += 1;
            }
        }

        if abandoned > 0 {
            warn!(abandoned, "TagWorker abandoned jobs during shutdown");
        }
    }

    fn abandon(&self, job: TagJob, reason: &str) {
        warn!(
            webhook_id = ?job.webhook_id,
            resource_id = %job.resource_id,
            tag = %job.tag,
            reason,
            "Abandoning tag job"
        );
        let outcome = RemoteUpdateOutcome::abandoned(job.resource_id, reason);
        self.publish(TagOutcomeReport::new(job.webhook_id, outcome));
    }

    fn publish(&self, report: TagOutcomeReport) {
        // No subscriber is not an error.
        let _ = self.report_tx.send(report);
    }
}
