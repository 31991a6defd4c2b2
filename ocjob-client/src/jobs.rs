//! Job-related API endpoints

use ocjob_core::JobHandle;
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::OpenShiftClient;
use crate::error::{ClientError, Result};
use crate::model::Job;

/// How long to wait for a replaced job to disappear
const DELETE_WAIT_TIMEOUT: Duration = Duration::from_secs(15);

/// Interval between existence checks while waiting for deletion
const DELETE_WAIT_INTERVAL: Duration = Duration::from_millis(500);

impl OpenShiftClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Create a job object in a namespace
    ///
    /// # Returns
    /// The job as stored by the cluster (its name may differ from the request
    /// when `generateName` is used)
    pub async fn create_job_object(&self, namespace: &str, job: &Value) -> Result<Job> {
        let path = format!("/apis/batch/v1/namespaces/{}/jobs", namespace);
        let response = self.request(Method::POST, &path).json(job).send().await?;

        self.handle_response(response).await
    }

    /// Get a job by handle
    pub async fn get_job(&self, handle: &JobHandle) -> Result<Job> {
        let path = format!(
            "/apis/batch/v1/namespaces/{}/jobs/{}",
            handle.namespace, handle.name
        );
        let response = self.request(Method::GET, &path).send().await?;

        self.handle_response(response).await
    }

    /// Delete a job and, in the background, its pods
    pub async fn delete_job_object(&self, handle: &JobHandle) -> Result<()> {
        let path = format!(
            "/apis/batch/v1/namespaces/{}/jobs/{}",
            handle.namespace, handle.name
        );
        let response = self
            .request(Method::DELETE, &path)
            .query(&[("propagationPolicy", "Background")])
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Delete a job if it exists and wait until the name is free again
    pub(crate) async fn delete_existing_job(&self, handle: &JobHandle) -> Result<()> {
        match self.delete_job_object(handle).await {
            Ok(()) => info!("Deleting existing {}", handle),
            Err(e) if e.is_not_found() => {
                debug!("No existing {} to delete", handle);
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        let give_up = Instant::now() + DELETE_WAIT_TIMEOUT;
        loop {
            match self.get_job(handle).await {
                Err(e) if e.is_not_found() => return Ok(()),
                Err(e) => return Err(e),
                Ok(_) if Instant::now() >= give_up => {
                    return Err(ClientError::Conflict(format!(
                        "{} still exists {}s after deletion",
                        handle,
                        DELETE_WAIT_TIMEOUT.as_secs()
                    )));
                }
                Ok(_) => time::sleep(DELETE_WAIT_INTERVAL).await,
            }
        }
    }
}

/// Name a job object will be created under, if it is known up front
pub(crate) fn declared_name(job: &Value) -> Option<&str> {
    job.pointer("/metadata/name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
}
