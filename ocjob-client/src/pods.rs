//! Pod-related API endpoints

use ocjob_core::JobHandle;
use reqwest::Method;

use crate::OpenShiftClient;
use crate::error::Result;
use crate::model::{Pod, PodList};

impl OpenShiftClient {
    // =============================================================================
    // Pods & Logs
    // =============================================================================

    /// List the pods created for a job
    ///
    /// Uses the `job-name` label the job controller puts on every pod.
    pub async fn list_job_pods(&self, handle: &JobHandle) -> Result<Vec<Pod>> {
        let path = format!("/api/v1/namespaces/{}/pods", handle.namespace);
        let selector = format!("job-name={}", handle.name);
        let response = self
            .request(Method::GET, &path)
            .query(&[("labelSelector", selector.as_str())])
            .send()
            .await?;

        let list: PodList = self.handle_response(response).await?;
        Ok(list.items)
    }

    /// Get the full log of one container
    pub async fn get_container_log(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
    ) -> Result<String> {
        let path = format!("/api/v1/namespaces/{}/pods/{}/log", namespace, pod);
        let response = self
            .request(Method::GET, &path)
            .query(&[("container", container)])
            .send()
            .await?;

        self.handle_text_response(response).await
    }
}
