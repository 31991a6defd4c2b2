//! Scripted in-memory cluster used by the controller and reporter tests

use async_trait::async_trait;
use ocjob_client::{ClientError, ClusterClient, Result};
use ocjob_core::{ContainerLog, JobHandle, JobPhase, JobSpec, JobStatus};
use std::collections::{BTreeSet, VecDeque};
use std::sync::Mutex;

/// One call made against the fake, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(String),
    Status,
    FetchLogs(BTreeSet<String>),
    Delete(JobHandle),
}

/// What the next status poll returns
#[derive(Debug, Clone)]
pub enum Step {
    Phase(JobPhase),
    Status(JobStatus),
    Transient,
    NotFound,
}

/// Fake cluster that replays a script of status answers
///
/// The last step of the script repeats forever. Every call is recorded.
pub struct FakeCluster {
    steps: Mutex<VecDeque<Step>>,
    create_error: Option<String>,
    logs: Vec<ContainerLog>,
    fail_logs: bool,
    fail_delete: bool,
    calls: Mutex<Vec<Call>>,
}

impl FakeCluster {
    pub fn new(phases: Vec<JobPhase>) -> Self {
        Self::with_steps(phases.into_iter().map(Step::Phase).collect())
    }

    pub fn with_steps(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            create_error: None,
            logs: Vec::new(),
            fail_logs: false,
            fail_delete: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A job that is pending, then running, and finishes on poll `n` (n >= 2)
    pub fn finishing_on_poll(n: usize, phase: JobPhase) -> Self {
        let mut phases = vec![JobPhase::Pending];
        phases.extend(std::iter::repeat_n(JobPhase::Running, n.saturating_sub(2)));
        phases.push(phase);
        Self::new(phases)
    }

    pub fn failing_creation(mut self, message: &str) -> Self {
        self.create_error = Some(message.to_string());
        self
    }

    pub fn with_logs(mut self, logs: Vec<ContainerLog>) -> Self {
        self.logs = logs;
        self
    }

    pub fn with_failing_logs(mut self) -> Self {
        self.fail_logs = true;
        self
    }

    pub fn with_failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Status))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        if steps.len() > 1 {
            steps.pop_front().unwrap_or(Step::Phase(JobPhase::Running))
        } else {
            steps
                .front()
                .cloned()
                .unwrap_or(Step::Phase(JobPhase::Running))
        }
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn create_job(&self, spec: &JobSpec) -> Result<JobHandle> {
        self.record(Call::Create(spec.template_name.clone()));
        if let Some(message) = &self.create_error {
            return Err(ClientError::api_error(422, message.clone()));
        }
        let name = spec
            .name_override
            .clone()
            .unwrap_or_else(|| format!("{}-run", spec.template_name));
        Ok(JobHandle::new(&spec.namespace, name))
    }

    async fn get_job_status(&self, _handle: &JobHandle) -> Result<JobStatus> {
        self.record(Call::Status);
        match self.next_step() {
            Step::Phase(phase) => Ok(JobStatus::new(phase)),
            Step::Status(status) => Ok(status),
            Step::Transient => Err(ClientError::unavailable("connection refused")),
            Step::NotFound => Err(ClientError::api_error(404, "jobs.batch not found")),
        }
    }

    async fn fetch_container_logs(
        &self,
        _handle: &JobHandle,
        containers: &BTreeSet<String>,
    ) -> Result<Vec<ContainerLog>> {
        self.record(Call::FetchLogs(containers.clone()));
        if self.fail_logs {
            return Err(ClientError::unavailable("log endpoint unreachable"));
        }
        Ok(self.logs.clone())
    }

    async fn delete_job(&self, handle: &JobHandle) -> Result<()> {
        self.record(Call::Delete(handle.clone()));
        if self.fail_delete {
            return Err(ClientError::api_error(403, "forbidden"));
        }
        Ok(())
    }
}
