//! Job lifecycle controller
//!
//! Drives one job from creation through polling to a single terminal
//! outcome:
//!
//! ```text
//! Created -> Polling -> { Succeeded | Failed | TimedOut | Aborted }
//! ```
//!
//! The deadline is checked strictly before each poll is issued. A poll that
//! was issued in time is always allowed to finish and its answer counts.

use ocjob_client::ClusterClient;
use ocjob_core::{
    Deadline, JobHandle, JobPhase, JobSpec, JobStatus, RunOutcome, RunReport,
};
use std::io::Write;
use std::sync::Arc;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ControllerConfig;
use crate::progress::{Notice, ProgressTracker};
use crate::reporter::{LogReporter, ReportError};

/// How the poll loop ended
#[derive(Debug)]
enum WatchResult {
    /// The job reached a terminal phase
    Finished(JobStatus),
    /// The deadline passed first
    TimedOut,
    /// The cluster could not be observed
    Unobservable(String),
    /// The cancellation token fired
    Cancelled,
}

/// Runs jobs to completion against a cluster
///
/// Instances share nothing but the client, so several controllers can run
/// concurrently in one process.
pub struct JobController {
    client: Arc<dyn ClusterClient>,
    reporter: LogReporter,
    config: ControllerConfig,
    cancel: CancellationToken,
}

impl JobController {
    /// Creates a controller that is never cancelled
    pub fn new(client: Arc<dyn ClusterClient>, config: ControllerConfig) -> Self {
        Self::with_cancellation(client, config, CancellationToken::new())
    }

    /// Creates a controller that stops waiting once `cancel` fires
    pub fn with_cancellation(
        client: Arc<dyn ClusterClient>,
        config: ControllerConfig,
        cancel: CancellationToken,
    ) -> Self {
        let reporter = LogReporter::new(Arc::clone(&client));
        Self {
            client,
            reporter,
            config,
            cancel,
        }
    }

    /// Create the job described by `spec`, wait for it, and report its logs
    ///
    /// Container logs and the final summary line are written to `out`.
    ///
    /// # Returns
    /// The single report of this run; its exit code is the process exit code
    pub async fn run<W: Write + Send>(&self, spec: &JobSpec, out: &mut W) -> RunReport {
        let report = self.run_to_outcome(spec, out).await;

        if let Err(e) = writeln!(out, "ocjob: {}", report.summary_line()) {
            warn!("Failed to write summary line: {}", e);
        }
        let _ = out.flush();

        report
    }

    async fn run_to_outcome<W: Write + Send>(&self, spec: &JobSpec, out: &mut W) -> RunReport {
        let started = Instant::now();
        let report = |handle: Option<JobHandle>, outcome: RunOutcome| RunReport {
            template_name: spec.template_name.clone(),
            handle,
            outcome,
        };

        if self.cancel.is_cancelled() {
            return report(None, RunOutcome::Cancelled);
        }

        info!(
            "Creating job from template '{}' in namespace '{}'",
            spec.template_name, spec.namespace
        );
        let handle = match self.client.create_job(spec).await {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to create job from template '{}': {}", spec.template_name, e);
                return report(None, RunOutcome::CreationFailed(e.to_string()));
            }
        };

        let deadline = Deadline::from_timeout(started, self.config.timeout);
        info!(
            "Waiting for {} to finish, timeout={}",
            handle,
            self.config
                .timeout
                .map(|t| format!("{}s", t.as_secs()))
                .unwrap_or_else(|| "none".to_string())
        );

        let outcome = match self.watch(&handle, deadline).await {
            WatchResult::Finished(status) => {
                let outcome = self.finish(&handle, &status);
                self.print_logs(&handle, out).await;
                outcome
            }
            WatchResult::TimedOut => {
                error!(
                    "Timeout value {}s reached while waiting for {}",
                    self.config.timeout.map(|t| t.as_secs()).unwrap_or_default(),
                    handle
                );
                self.print_logs(&handle, out).await;
                RunOutcome::TimedOut
            }
            WatchResult::Unobservable(cause) => {
                error!("Giving up on {}: {}", handle, cause);
                RunOutcome::PollError(cause)
            }
            WatchResult::Cancelled => {
                warn!("Interrupted while waiting for {}, leaving it untouched", handle);
                return report(Some(handle), RunOutcome::Cancelled);
            }
        };

        if self.config.delete_after_finished {
            self.cleanup(&handle).await;
        }

        report(Some(handle), outcome)
    }

    /// Poll until the job is terminal, the deadline passes, polling fails for
    /// good, or the run is cancelled
    async fn watch(&self, handle: &JobHandle, deadline: Deadline) -> WatchResult {
        let mut tracker =
            ProgressTracker::new(self.config.timeout, self.config.progress_interval, Instant::now());
        let mut error_streak: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return WatchResult::Cancelled;
            }
            if deadline.is_expired(Instant::now()) {
                return WatchResult::TimedOut;
            }

            let polled = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return WatchResult::Cancelled,
                polled = self.client.get_job_status(handle) => polled,
            };

            match polled {
                Ok(status) => {
                    error_streak = 0;
                    debug!("{} is {:?}", handle, status.phase);

                    if status.phase.is_terminal() {
                        return WatchResult::Finished(status);
                    }
                    for notice in tracker.observe(&status, Instant::now()) {
                        log_notice(handle, &notice);
                    }
                }
                Err(e) if e.is_transient() => {
                    error_streak += 1;
                    if error_streak >= self.config.max_poll_errors {
                        return WatchResult::Unobservable(format!(
                            "{} consecutive status polls failed, last error: {}",
                            error_streak, e
                        ));
                    }
                    warn!(
                        "Failed to poll {} (attempt {}/{}): {}",
                        handle, error_streak, self.config.max_poll_errors, e
                    );
                }
                Err(e) => return WatchResult::Unobservable(e.to_string()),
            }

            let now = Instant::now();
            if tracker.progress_due(now) {
                info!(
                    "Still waiting for {}, {}",
                    handle,
                    ProgressTracker::describe_remaining(&deadline, now)
                );
            }

            let wake = deadline.clamp(now + self.config.poll_interval);
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return WatchResult::Cancelled,
                _ = time::sleep_until(wake) => {}
            }
        }
    }

    /// Map a terminal status to an outcome and log what is known about it
    fn finish(&self, handle: &JobHandle, status: &JobStatus) -> RunOutcome {
        match status.phase {
            JobPhase::Succeeded { exit_code } => {
                let code = exit_code.unwrap_or(0);
                if code != 0 {
                    warn!(
                        "{} reports success but a container exited with {}, treating as failure",
                        handle, code
                    );
                }
                match status.duration() {
                    Some(duration) => info!(
                        "Job {} finished successfully after {}s",
                        handle.name,
                        duration.num_seconds()
                    ),
                    None => info!("Job {} finished successfully", handle.name),
                }
                RunOutcome::Completed(code)
            }
            JobPhase::Failed { exit_code } => {
                error!(
                    "Job failed: {}, reason: {}",
                    status.failure_message.as_deref().unwrap_or("unknown"),
                    status.failure_reason.as_deref().unwrap_or("unknown")
                );
                error!("Pods that failed: {:?}", status.pod_names());
                RunOutcome::Completed(failure_exit_code(exit_code))
            }
            JobPhase::Pending | JobPhase::Running => {
                RunOutcome::PollError(format!("{} is not in a terminal state", handle))
            }
        }
    }

    /// Print container logs; failures are logged and never change the outcome
    ///
    /// A fetch that fails as a whole still leaves a marker in `out`, so an
    /// empty log section never hides a failure.
    async fn print_logs<W: Write + Send>(&self, handle: &JobHandle, out: &mut W) {
        match self
            .reporter
            .report(handle, &self.config.log_containers, out)
            .await
        {
            Ok(_) => {}
            Err(ReportError::Fetch(cause)) => {
                warn!("Could not fetch logs of {}: {}", handle, cause);
                if let Err(e) = writeln!(out, "(logs unavailable: {})", cause) {
                    warn!("Failed to write log marker: {}", e);
                }
            }
            Err(e) => warn!("Could not print logs of {}: {}", handle, e),
        }
    }

    async fn cleanup(&self, handle: &JobHandle) {
        match self.client.delete_job(handle).await {
            Ok(()) => info!("Deleted {}", handle),
            Err(e) => warn!("Failed to delete {}: {}", handle, e),
        }
    }
}

/// Exit code for a failed job; never 0
fn failure_exit_code(reported: Option<i32>) -> i32 {
    match reported {
        Some(code) if code != 0 => code,
        _ => 1,
    }
}

fn log_notice(handle: &JobHandle, notice: &Notice) {
    match notice {
        Notice::DeadlineMismatch {
            job_seconds,
            agent_seconds,
        } => warn!(
            "{}: wait timeout {}s does not match job deadline {}s",
            handle, agent_seconds, job_seconds
        ),
        Notice::Stalled {
            pod,
            container,
            reason,
            waited,
        } => warn!(
            "Pod {} container {} has remained in state {} for {}s",
            pod,
            container,
            reason,
            waited.as_secs()
        ),
        Notice::Stuck {
            pod,
            container,
            reason,
        } => error!(
            "Pod {} container {} is not ready, waiting for {}",
            pod, container, reason
        ),
    }
}
