//! The cluster client trait and its HTTP implementation

use async_trait::async_trait;
use ocjob_core::{ContainerLog, JobHandle, JobSpec, JobStatus};
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::OpenShiftClient;
use crate::error::{ClientError, Result};
use crate::jobs::declared_name;

/// Operations the job controller needs from the cluster
///
/// Implementations translate requests and responses only; they never retry.
/// Retrying is a decision of the caller, based on [`ClientError::is_transient`].
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Instantiate the template of `spec` and create the resulting job
    ///
    /// The cluster may accept the job and only start it later.
    async fn create_job(&self, spec: &JobSpec) -> Result<JobHandle>;

    /// Take one fresh snapshot of a job's state
    async fn get_job_status(&self, handle: &JobHandle) -> Result<JobStatus>;

    /// Fetch the logs of a job's containers
    ///
    /// # Arguments
    /// * `handle` - The job
    /// * `containers` - Container names to fetch; empty means all containers
    ///
    /// # Returns
    /// One entry per container; a container whose log could not be fetched is
    /// returned as [`ocjob_core::LogContent::Unavailable`] rather than omitted.
    async fn fetch_container_logs(
        &self,
        handle: &JobHandle,
        containers: &BTreeSet<String>,
    ) -> Result<Vec<ContainerLog>>;

    /// Delete a job and its pods
    async fn delete_job(&self, handle: &JobHandle) -> Result<()>;
}

#[async_trait]
impl ClusterClient for OpenShiftClient {
    async fn create_job(&self, spec: &JobSpec) -> Result<JobHandle> {
        let job = self.render_job_object(spec).await?;

        if self.replace_existing {
            if let Some(name) = declared_name(&job) {
                self.delete_existing_job(&JobHandle::new(&spec.namespace, name))
                    .await?;
            }
        }

        let created = self.create_job_object(&spec.namespace, &job).await?;
        if created.metadata.name.is_empty() {
            return Err(ClientError::ParseError(
                "created job has no name".to_string(),
            ));
        }

        let namespace = created
            .metadata
            .namespace
            .unwrap_or_else(|| spec.namespace.clone());
        let handle = JobHandle::new(namespace, created.metadata.name);
        info!("Created {}", handle);

        Ok(handle)
    }

    async fn get_job_status(&self, handle: &JobHandle) -> Result<JobStatus> {
        let job = self.get_job(handle).await?;
        let pods = self.list_job_pods(handle).await?;

        Ok(job.to_status(&pods))
    }

    async fn fetch_container_logs(
        &self,
        handle: &JobHandle,
        containers: &BTreeSet<String>,
    ) -> Result<Vec<ContainerLog>> {
        let job = self.get_job(handle).await?;
        let pods = self.list_job_pods(handle).await?;

        let mut logs = Vec::new();
        let mut seen = BTreeSet::new();

        for pod in pods.iter().filter(|p| p.started_since(job.status.start_time)) {
            for container in pod.container_names() {
                if !containers.is_empty() && !containers.contains(&container) {
                    continue;
                }
                let pod_name = &pod.metadata.name;
                let entry = match self
                    .get_container_log(&handle.namespace, pod_name, &container)
                    .await
                {
                    Ok(text) => ContainerLog::text(pod_name, &container, text),
                    Err(e) => {
                        warn!("Failed to fetch logs of {}/{}: {}", pod_name, container, e);
                        ContainerLog::unavailable(pod_name, &container, e.to_string())
                    }
                };
                seen.insert(container);
                logs.push(entry);
            }
        }

        for missing in containers.difference(&seen) {
            warn!("Container '{}' not found in any pod of {}", missing, handle);
        }

        Ok(logs)
    }

    async fn delete_job(&self, handle: &JobHandle) -> Result<()> {
        match self.delete_job_object(handle).await {
            Err(e) if e.is_not_found() => Ok(()),
            other => other,
        }
    }
}
