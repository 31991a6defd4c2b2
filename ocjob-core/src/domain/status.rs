//! Job status snapshots
//!
//! A `JobStatus` is what one poll of the cluster returned. Nothing is
//! accumulated across polls; the controller only ever looks at the latest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Waiting reasons the kubelet will not recover from on its own
pub const UNRECOVERABLE_WAIT_REASONS: &[&str] = &[
    "ErrImagePull",
    "ImagePullBackOff",
    "CrashLoopBackOff",
    "CreateContainerConfigError",
    "InvalidImageName",
];

/// Coarse lifecycle phase of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobPhase {
    Pending,
    Running,
    Succeeded { exit_code: Option<i32> },
    Failed { exit_code: Option<i32> },
}

impl JobPhase {
    /// Classify a job from its counters, conditions and container states
    ///
    /// The `Complete` and `Failed` conditions decide the terminal phase when
    /// the cluster has set either; if both are set, failure wins. Without
    /// conditions only a finished success counts as terminal: a failed pod
    /// with no active replacement may still be retried within the job's
    /// backoff limit.
    pub fn classify(raw: &RawJobState, containers: &[ContainerStatus]) -> Self {
        let (failed, succeeded) = if raw.has_conditions() {
            (raw.failed_condition, raw.complete_condition)
        } else {
            (false, raw.succeeded > 0 && raw.active == 0)
        };

        if failed {
            JobPhase::Failed {
                exit_code: reported_exit_code(containers),
            }
        } else if succeeded {
            JobPhase::Succeeded {
                exit_code: succeeded_exit_code(containers),
            }
        } else if raw.active > 0 {
            JobPhase::Running
        } else {
            JobPhase::Pending
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Succeeded { .. } | JobPhase::Failed { .. })
    }
}

/// Job counters and conditions as read from the job object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawJobState {
    pub active: u32,
    pub succeeded: u32,
    pub failed: u32,
    /// `Complete` condition is `True`
    pub complete_condition: bool,
    /// `Failed` condition is `True`
    pub failed_condition: bool,
}

impl RawJobState {
    /// Whether the cluster has reached a verdict on the job
    pub fn has_conditions(&self) -> bool {
        self.complete_condition || self.failed_condition
    }
}

/// State of a single container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerState {
    Waiting { reason: Option<String> },
    Running,
    Terminated { exit_code: i32, reason: Option<String> },
    Unknown,
}

/// Container-level detail used for log attribution and diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStatus {
    pub pod: String,
    pub container: String,
    pub state: ContainerState,
}

impl ContainerStatus {
    pub fn waiting_reason(&self) -> Option<&str> {
        match &self.state {
            ContainerState::Waiting { reason } => reason.as_deref(),
            _ => None,
        }
    }

    /// Whether the container is stuck in a state the cluster will not leave by itself
    pub fn is_stuck(&self) -> bool {
        self.waiting_reason()
            .is_some_and(|reason| UNRECOVERABLE_WAIT_REASONS.contains(&reason))
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.state {
            ContainerState::Terminated { exit_code, .. } => Some(exit_code),
            _ => None,
        }
    }
}

/// Snapshot of one job at one poll instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub phase: JobPhase,
    pub containers: Vec<ContainerStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Reason of the `Failed` condition, if any
    pub failure_reason: Option<String>,
    /// Message of the `Failed` condition, if any
    pub failure_message: Option<String>,
    /// `activeDeadlineSeconds` from the job spec
    pub active_deadline_seconds: Option<i64>,
}

impl JobStatus {
    /// A bare snapshot with the given phase and no detail
    pub fn new(phase: JobPhase) -> Self {
        Self {
            phase,
            containers: Vec::new(),
            started_at: None,
            completed_at: None,
            failure_reason: None,
            failure_message: None,
            active_deadline_seconds: None,
        }
    }

    /// Wall-clock time between job start and completion, when both are known
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Distinct pod names, in the order they were reported
    pub fn pod_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for container in &self.containers {
            if !names.contains(&container.pod.as_str()) {
                names.push(&container.pod);
            }
        }
        names
    }
}

/// Pick the exit code that best represents the job's containers
///
/// The first non-zero exit code wins; otherwise the first terminated
/// container's code; `None` if no container has terminated.
pub fn reported_exit_code(containers: &[ContainerStatus]) -> Option<i32> {
    let mut codes = containers.iter().filter_map(ContainerStatus::exit_code);
    let first = codes.next()?;
    if first != 0 {
        return Some(first);
    }
    Some(codes.find(|code| *code != 0).unwrap_or(first))
}

/// Exit code of a job that completed
///
/// Taken from a pod whose containers all terminated cleanly, so pods that
/// failed before a successful retry do not count. Falls back to
/// [`reported_exit_code`] when no such pod is known.
fn succeeded_exit_code(containers: &[ContainerStatus]) -> Option<i32> {
    let mut pods: Vec<&str> = Vec::new();
    for container in containers {
        if !pods.contains(&container.pod.as_str()) {
            pods.push(&container.pod);
        }
    }

    let clean_pod = pods.iter().any(|pod| {
        let mut codes = containers
            .iter()
            .filter(|c| c.pod == *pod)
            .map(ContainerStatus::exit_code);
        codes.all(|code| code == Some(0))
    });

    if clean_pod {
        Some(0)
    } else {
        reported_exit_code(containers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminated(pod: &str, container: &str, exit_code: i32) -> ContainerStatus {
        ContainerStatus {
            pod: pod.to_string(),
            container: container.to_string(),
            state: ContainerState::Terminated {
                exit_code,
                reason: None,
            },
        }
    }

    #[test]
    fn test_classify_pending_and_running() {
        assert_eq!(
            JobPhase::classify(&RawJobState::default(), &[]),
            JobPhase::Pending
        );
        let raw = RawJobState {
            active: 1,
            ..Default::default()
        };
        assert_eq!(JobPhase::classify(&raw, &[]), JobPhase::Running);
    }

    #[test]
    fn test_classify_succeeded_from_condition() {
        let raw = RawJobState {
            succeeded: 1,
            complete_condition: true,
            ..Default::default()
        };
        assert_eq!(
            JobPhase::classify(&raw, &[terminated("p1", "main", 0)]),
            JobPhase::Succeeded { exit_code: Some(0) }
        );
    }

    #[test]
    fn test_classify_succeeded_from_counters_without_conditions() {
        let raw = RawJobState {
            succeeded: 1,
            ..Default::default()
        };
        assert_eq!(
            JobPhase::classify(&raw, &[]),
            JobPhase::Succeeded { exit_code: None }
        );
    }

    #[test]
    fn test_classify_failed_wins_over_succeeded() {
        let raw = RawJobState {
            succeeded: 1,
            failed: 1,
            complete_condition: true,
            failed_condition: true,
            ..Default::default()
        };
        let containers = vec![terminated("p1", "main", 3), terminated("p2", "main", 0)];
        assert_eq!(
            JobPhase::classify(&raw, &containers),
            JobPhase::Failed { exit_code: Some(3) }
        );
    }

    #[test]
    fn test_classify_complete_after_retry_is_succeeded() {
        let raw = RawJobState {
            succeeded: 1,
            failed: 1,
            complete_condition: true,
            ..Default::default()
        };
        let containers = vec![terminated("first", "main", 1), terminated("retry", "main", 0)];
        assert_eq!(
            JobPhase::classify(&raw, &containers),
            JobPhase::Succeeded { exit_code: Some(0) }
        );
    }

    #[test]
    fn test_classify_failed_pod_still_retrying_is_running() {
        let raw = RawJobState {
            active: 1,
            failed: 1,
            ..Default::default()
        };
        assert_eq!(JobPhase::classify(&raw, &[]), JobPhase::Running);
    }

    #[test]
    fn test_classify_gap_between_retries_is_not_terminal() {
        let raw = RawJobState {
            failed: 1,
            ..Default::default()
        };
        let phase = JobPhase::classify(&raw, &[terminated("first", "main", 1)]);
        assert_eq!(phase, JobPhase::Pending);
        assert!(!phase.is_terminal());
    }

    #[test]
    fn test_succeeded_exit_code_without_clean_pod() {
        let containers = vec![terminated("p1", "main", 0), terminated("p1", "sidecar", 2)];
        assert_eq!(succeeded_exit_code(&containers), Some(2));
        assert_eq!(succeeded_exit_code(&[]), None);
    }

    #[test]
    fn test_reported_exit_code_prefers_non_zero() {
        let containers = vec![
            terminated("p1", "setup", 0),
            terminated("p1", "main", 2),
            terminated("p1", "sidecar", 1),
        ];
        assert_eq!(reported_exit_code(&containers), Some(2));
        assert_eq!(reported_exit_code(&containers[..1]), Some(0));
        assert_eq!(reported_exit_code(&[]), None);
    }

    #[test]
    fn test_stuck_container() {
        let status = ContainerStatus {
            pod: "p1".to_string(),
            container: "main".to_string(),
            state: ContainerState::Waiting {
                reason: Some("ImagePullBackOff".to_string()),
            },
        };
        assert!(status.is_stuck());
        assert_eq!(status.waiting_reason(), Some("ImagePullBackOff"));
        assert!(!terminated("p1", "main", 0).is_stuck());
    }

    #[test]
    fn test_pod_names_are_distinct() {
        let mut status = JobStatus::new(JobPhase::Running);
        status.containers = vec![
            terminated("p1", "a", 0),
            terminated("p1", "b", 0),
            terminated("p2", "a", 0),
        ];
        assert_eq!(status.pod_names(), vec!["p1", "p2"]);
    }
}
