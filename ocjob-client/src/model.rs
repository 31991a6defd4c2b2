//! Wire types for the parts of the Kubernetes API the agent reads
//!
//! Only the fields the agent needs are modelled; everything else is ignored.

use chrono::{DateTime, Utc};
use ocjob_core::domain::status::{
    ContainerState, ContainerStatus, JobPhase, JobStatus, RawJobState,
};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    pub metadata: ObjectMeta,
    pub spec: JobSpecWire,
    pub status: JobStatusWire,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobSpecWire {
    pub active_deadline_seconds: Option<i64>,
    pub template: PodTemplate,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodTemplate {
    pub spec: PodSpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobStatusWire {
    pub active: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub start_time: Option<DateTime<Utc>>,
    pub completion_time: Option<DateTime<Utc>>,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    pub reason: Option<String>,
    pub message: Option<String>,
}

impl Condition {
    fn is_true(&self, type_: &str) -> bool {
        self.type_ == type_ && self.status == "True"
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodList {
    pub items: Vec<Pod>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pod {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
    pub status: PodStatusWire,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodSpec {
    pub active_deadline_seconds: Option<i64>,
    pub init_containers: Vec<NamedContainer>,
    pub containers: Vec<NamedContainer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamedContainer {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodStatusWire {
    pub phase: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub init_container_statuses: Vec<ContainerStatusWire>,
    pub container_statuses: Vec<ContainerStatusWire>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerStatusWire {
    pub name: String,
    pub state: ContainerStateWire,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerStateWire {
    pub waiting: Option<StateDetail>,
    pub running: Option<serde_json::Value>,
    pub terminated: Option<StateDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateDetail {
    pub reason: Option<String>,
    pub exit_code: Option<i32>,
}

impl Pod {
    /// Names of all containers declared by the pod, init containers first
    pub fn container_names(&self) -> Vec<String> {
        self.spec
            .init_containers
            .iter()
            .chain(self.spec.containers.iter())
            .map(|c| c.name.clone())
            .collect()
    }

    /// Whether this pod belongs to the current run of a job started at `job_start`
    ///
    /// Pods that have not started yet are always kept.
    pub fn started_since(&self, job_start: Option<DateTime<Utc>>) -> bool {
        match (self.status.start_time, job_start) {
            (Some(pod_start), Some(job_start)) => pod_start >= job_start,
            _ => true,
        }
    }

    fn container_statuses(&self) -> Vec<ContainerStatus> {
        self.status
            .init_container_statuses
            .iter()
            .chain(self.status.container_statuses.iter())
            .map(|status| ContainerStatus {
                pod: self.metadata.name.clone(),
                container: status.name.clone(),
                state: status.state.to_domain(),
            })
            .collect()
    }
}

impl ContainerStateWire {
    fn to_domain(&self) -> ContainerState {
        if let Some(terminated) = &self.terminated {
            ContainerState::Terminated {
                exit_code: terminated.exit_code.unwrap_or(0),
                reason: terminated.reason.clone(),
            }
        } else if self.running.is_some() {
            ContainerState::Running
        } else if let Some(waiting) = &self.waiting {
            ContainerState::Waiting {
                reason: waiting.reason.clone(),
            }
        } else {
            ContainerState::Unknown
        }
    }
}

impl Job {
    fn raw_state(&self) -> RawJobState {
        let conditions = &self.status.conditions;
        RawJobState {
            active: self.status.active,
            succeeded: self.status.succeeded,
            failed: self.status.failed,
            complete_condition: conditions.iter().any(|c| c.is_true("Complete")),
            failed_condition: conditions.iter().any(|c| c.is_true("Failed")),
        }
    }

    /// Build a status snapshot from this job and the pods of its current run
    pub fn to_status(&self, pods: &[Pod]) -> JobStatus {
        let containers: Vec<ContainerStatus> = pods
            .iter()
            .filter(|pod| pod.started_since(self.status.start_time))
            .flat_map(Pod::container_statuses)
            .collect();

        let failed = self.status.conditions.iter().find(|c| c.is_true("Failed"));

        JobStatus {
            phase: JobPhase::classify(&self.raw_state(), &containers),
            containers,
            started_at: self.status.start_time,
            completed_at: self.status.completion_time,
            failure_reason: failed.and_then(|c| c.reason.clone()),
            failure_message: failed.and_then(|c| c.message.clone()),
            active_deadline_seconds: self
                .spec
                .active_deadline_seconds
                .or(self.spec.template.spec.active_deadline_seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn failed_job() -> Job {
        serde_json::from_value(json!({
            "metadata": { "name": "harmonie-00", "namespace": "forecast" },
            "spec": { "template": { "spec": { "activeDeadlineSeconds": 600 } } },
            "status": {
                "failed": 1,
                "startTime": "2024-05-01T10:00:00Z",
                "conditions": [
                    { "type": "Failed", "status": "True", "reason": "BackoffLimitExceeded",
                      "message": "Job has reached the specified backoff limit" }
                ]
            }
        }))
        .unwrap()
    }

    fn pod(name: &str, start: &str, exit_code: i32) -> Pod {
        serde_json::from_value(json!({
            "metadata": { "name": name },
            "spec": { "containers": [ { "name": "main" } ] },
            "status": {
                "phase": "Failed",
                "startTime": start,
                "containerStatuses": [
                    { "name": "main", "state": { "terminated": { "exitCode": exit_code, "reason": "Error" } } }
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_failed_job_status() {
        let job = failed_job();
        let pods = vec![pod("harmonie-00-abcde", "2024-05-01T10:00:05Z", 3)];
        let status = job.to_status(&pods);

        assert_eq!(status.phase, JobPhase::Failed { exit_code: Some(3) });
        assert_eq!(status.failure_reason.as_deref(), Some("BackoffLimitExceeded"));
        assert_eq!(status.active_deadline_seconds, Some(600));
        assert_eq!(status.pod_names(), vec!["harmonie-00-abcde"]);
    }

    #[test]
    fn test_stale_pods_are_ignored() {
        let job = failed_job();
        let pods = vec![
            pod("old-run", "2024-05-01T09:00:00Z", 7),
            pod("new-run", "2024-05-01T10:00:01Z", 2),
        ];
        let status = job.to_status(&pods);

        assert_eq!(status.pod_names(), vec!["new-run"]);
        assert_eq!(status.phase, JobPhase::Failed { exit_code: Some(2) });
    }

    #[test]
    fn test_job_completed_after_retry_is_succeeded() {
        let job: Job = serde_json::from_value(json!({
            "metadata": { "name": "harmonie-00", "namespace": "forecast" },
            "status": {
                "succeeded": 1,
                "failed": 1,
                "startTime": "2024-05-01T10:00:00Z",
                "completionTime": "2024-05-01T10:05:00Z",
                "conditions": [ { "type": "Complete", "status": "True" } ]
            }
        }))
        .unwrap();
        let pods = vec![
            pod("first", "2024-05-01T10:00:01Z", 1),
            pod("retry", "2024-05-01T10:01:00Z", 0),
        ];

        let status = job.to_status(&pods);
        assert_eq!(status.phase, JobPhase::Succeeded { exit_code: Some(0) });
        assert_eq!(status.failure_reason, None);
    }

    #[test]
    fn test_failed_pod_awaiting_retry_is_not_terminal() {
        let job: Job = serde_json::from_value(json!({
            "metadata": { "name": "harmonie-00", "namespace": "forecast" },
            "status": { "failed": 1, "startTime": "2024-05-01T10:00:00Z" }
        }))
        .unwrap();
        let pods = vec![pod("first", "2024-05-01T10:00:01Z", 1)];

        let status = job.to_status(&pods);
        assert_eq!(status.phase, JobPhase::Pending);
    }

    #[test]
    fn test_pending_job_with_waiting_container() {
        let job: Job = serde_json::from_value(json!({
            "metadata": { "name": "j" },
            "status": {}
        }))
        .unwrap();
        let pod: Pod = serde_json::from_value(json!({
            "metadata": { "name": "j-xyz" },
            "spec": { "initContainers": [ { "name": "fetch" } ], "containers": [ { "name": "main" } ] },
            "status": {
                "containerStatuses": [
                    { "name": "main", "state": { "waiting": { "reason": "ImagePullBackOff" } } }
                ]
            }
        }))
        .unwrap();

        let status = job.to_status(std::slice::from_ref(&pod));
        assert_eq!(status.phase, JobPhase::Pending);
        assert!(status.containers[0].is_stuck());
        assert_eq!(pod.container_names(), vec!["fetch", "main"]);
    }
}
