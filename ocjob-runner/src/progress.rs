//! Progress tracking while a job is being waited on
//!
//! Turns the stream of status snapshots into occasional human-facing
//! notices. Nothing here influences the outcome of a run.

use ocjob_core::{Deadline, JobStatus};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// A container waiting in the same state for this long gets its first warning
const FIRST_STALL_WARNING: Duration = Duration::from_secs(20);

/// Each further warning for the same stall comes this much later
const STALL_WARNING_STEP: Duration = Duration::from_secs(10);

/// Something worth telling the operator about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The job's own `activeDeadlineSeconds` differs from the agent timeout
    DeadlineMismatch { job_seconds: i64, agent_seconds: u64 },
    /// A container has been waiting with the same reason for a while
    Stalled {
        pod: String,
        container: String,
        reason: String,
        waited: Duration,
    },
    /// A container entered a waiting state the cluster will not recover from
    Stuck {
        pod: String,
        container: String,
        reason: String,
    },
}

#[derive(Debug)]
struct Stall {
    reason: String,
    since: Instant,
    next_warning: Duration,
    reported_stuck: bool,
}

/// Tracks per-container waiting states and progress-line pacing
#[derive(Debug)]
pub struct ProgressTracker {
    timeout: Option<Duration>,
    progress_interval: Duration,
    last_progress: Instant,
    checked_deadline: bool,
    stalls: HashMap<(String, String), Stall>,
}

impl ProgressTracker {
    pub fn new(timeout: Option<Duration>, progress_interval: Duration, now: Instant) -> Self {
        Self {
            timeout,
            progress_interval,
            last_progress: now,
            checked_deadline: false,
            stalls: HashMap::new(),
        }
    }

    /// Feed one status snapshot and collect the notices it triggers
    pub fn observe(&mut self, status: &JobStatus, now: Instant) -> Vec<Notice> {
        let mut notices = Vec::new();

        if !self.checked_deadline {
            self.checked_deadline = true;
            if let (Some(job_seconds), Some(timeout)) = (status.active_deadline_seconds, self.timeout)
            {
                if u64::try_from(job_seconds).ok() != Some(timeout.as_secs()) {
                    notices.push(Notice::DeadlineMismatch {
                        job_seconds,
                        agent_seconds: timeout.as_secs(),
                    });
                }
            }
        }

        let mut still_waiting = Vec::new();
        for container in &status.containers {
            let Some(reason) = container.waiting_reason() else {
                continue;
            };
            let key = (container.pod.clone(), container.container.clone());
            still_waiting.push(key.clone());

            let stall = self.stalls.entry(key).or_insert_with(|| Stall {
                reason: reason.to_string(),
                since: now,
                next_warning: FIRST_STALL_WARNING,
                reported_stuck: false,
            });

            if stall.reason != reason {
                *stall = Stall {
                    reason: reason.to_string(),
                    since: now,
                    next_warning: FIRST_STALL_WARNING,
                    reported_stuck: false,
                };
            }

            if container.is_stuck() && !stall.reported_stuck {
                stall.reported_stuck = true;
                notices.push(Notice::Stuck {
                    pod: container.pod.clone(),
                    container: container.container.clone(),
                    reason: reason.to_string(),
                });
            }

            let waited = now.saturating_duration_since(stall.since);
            if waited >= stall.next_warning {
                stall.next_warning = waited + STALL_WARNING_STEP;
                notices.push(Notice::Stalled {
                    pod: container.pod.clone(),
                    container: container.container.clone(),
                    reason: reason.to_string(),
                    waited,
                });
            }
        }

        self.stalls.retain(|key, _| still_waiting.contains(key));
        notices
    }

    /// Whether a "still waiting" line is due; resets the pacing when it is
    pub fn progress_due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_progress) >= self.progress_interval {
            self.last_progress = now;
            true
        } else {
            false
        }
    }

    /// Describe the remaining wait for a progress line
    pub fn describe_remaining(deadline: &Deadline, now: Instant) -> String {
        match deadline.remaining(now) {
            Some(remaining) => format!("{}s remaining", remaining.as_secs()),
            None => "no timeout".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocjob_core::{ContainerState, ContainerStatus, JobPhase};

    fn waiting(reason: &str) -> JobStatus {
        let mut status = JobStatus::new(JobPhase::Pending);
        status.containers.push(ContainerStatus {
            pod: "job-abc".to_string(),
            container: "main".to_string(),
            state: ContainerState::Waiting {
                reason: Some(reason.to_string()),
            },
        });
        status
    }

    #[test]
    fn test_deadline_mismatch_reported_once() {
        let now = Instant::now();
        let mut tracker =
            ProgressTracker::new(Some(Duration::from_secs(60)), Duration::from_secs(20), now);
        let mut status = JobStatus::new(JobPhase::Running);
        status.active_deadline_seconds = Some(600);

        assert_eq!(
            tracker.observe(&status, now),
            vec![Notice::DeadlineMismatch {
                job_seconds: 600,
                agent_seconds: 60
            }]
        );
        assert!(tracker.observe(&status, now).is_empty());
    }

    #[test]
    fn test_matching_deadline_is_quiet() {
        let now = Instant::now();
        let mut tracker =
            ProgressTracker::new(Some(Duration::from_secs(600)), Duration::from_secs(20), now);
        let mut status = JobStatus::new(JobPhase::Running);
        status.active_deadline_seconds = Some(600);
        assert!(tracker.observe(&status, now).is_empty());
    }

    #[test]
    fn test_stall_warnings_back_off() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new(None, Duration::from_secs(20), start);
        let status = waiting("ContainerCreating");

        assert!(tracker.observe(&status, start).is_empty());
        assert!(tracker.observe(&status, start + Duration::from_secs(19)).is_empty());

        let notices = tracker.observe(&status, start + Duration::from_secs(20));
        assert!(matches!(
            notices.as_slice(),
            [Notice::Stalled { reason, waited, .. }]
                if reason == "ContainerCreating" && *waited == Duration::from_secs(20)
        ));

        assert!(tracker.observe(&status, start + Duration::from_secs(29)).is_empty());
        assert_eq!(tracker.observe(&status, start + Duration::from_secs(30)).len(), 1);
    }

    #[test]
    fn test_reason_change_resets_stall() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new(None, Duration::from_secs(20), start);

        tracker.observe(&waiting("ContainerCreating"), start);
        let notices = tracker.observe(&waiting("PodInitializing"), start + Duration::from_secs(25));
        assert!(notices.is_empty());
    }

    #[test]
    fn test_stuck_container_reported_once() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new(None, Duration::from_secs(20), start);
        let status = waiting("ImagePullBackOff");

        let notices = tracker.observe(&status, start);
        assert!(matches!(notices.as_slice(), [Notice::Stuck { reason, .. }] if reason == "ImagePullBackOff"));
        assert!(tracker.observe(&status, start + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_progress_pacing() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new(None, Duration::from_secs(20), start);

        assert!(!tracker.progress_due(start + Duration::from_secs(10)));
        assert!(tracker.progress_due(start + Duration::from_secs(20)));
        assert!(!tracker.progress_due(start + Duration::from_secs(30)));
        assert!(tracker.progress_due(start + Duration::from_secs(41)));
    }

    #[test]
    fn test_describe_remaining() {
        let now = Instant::now();
        let deadline = Deadline::from_timeout(now, Some(Duration::from_secs(90)));
        assert_eq!(
            ProgressTracker::describe_remaining(&deadline, now),
            "90s remaining"
        );
        assert_eq!(
            ProgressTracker::describe_remaining(&Deadline::Unbounded, now),
            "no timeout"
        );
    }
}
