//! ocjob cluster client
//!
//! A small, type-safe client for the parts of the OpenShift / Kubernetes API
//! the job agent needs: processing templates, creating and deleting jobs,
//! reading job and pod status, and fetching container logs.
//!
//! The [`ClusterClient`] trait is the seam the controller is written against;
//! [`OpenShiftClient`] is the HTTP implementation.
//!
//! # Example
//!
//! ```no_run
//! use ocjob_client::{ClusterClient, ClusterConfig, OpenShiftClient};
//! use ocjob_core::JobHandle;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClusterConfig::new("https://api.cluster.example:6443", "forecast")
//!         .with_token("sha256~secret");
//!     let client = OpenShiftClient::new(config)?;
//!
//!     let status = client
//!         .get_job_status(&JobHandle::new("forecast", "harmonie-00"))
//!         .await?;
//!     println!("{:?}", status.phase);
//!     Ok(())
//! }
//! ```

mod cluster;
pub mod error;
mod jobs;
pub mod model;
mod pods;
mod templates;

pub use cluster::ClusterClient;
pub use error::{ClientError, ErrorKind, Result};

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

/// Connection settings for one cluster namespace
#[derive(Clone)]
pub struct ClusterConfig {
    /// API server URL (e.g. "https://api.cluster.example:6443")
    pub api_server_url: String,
    /// Namespace (project) jobs are created in
    pub namespace: String,
    /// Bearer token; `None` sends unauthenticated requests
    pub token: Option<String>,
    /// Timeout applied to every single HTTP request
    pub request_timeout: Duration,
    /// Accept self-signed or otherwise invalid TLS certificates
    pub accept_invalid_certs: bool,
    /// Delete an existing job with the same name before creating a new one
    pub replace_existing: bool,
}

impl ClusterConfig {
    pub fn new(api_server_url: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            api_server_url: api_server_url.into(),
            namespace: namespace.into(),
            token: None,
            request_timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
            replace_existing: true,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

impl fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("api_server_url", &self.api_server_url)
            .field("namespace", &self.namespace)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("request_timeout", &self.request_timeout)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("replace_existing", &self.replace_existing)
            .finish()
    }
}

/// HTTP client for the OpenShift / Kubernetes API
///
/// Cheap to clone; clones share the underlying connection pool. Every
/// instance carries its own credentials, so several clients for different
/// clusters or namespaces can live in one process.
#[derive(Clone)]
pub struct OpenShiftClient {
    /// API server URL without trailing slash
    base_url: String,
    /// Bearer token sent with every request
    token: Option<String>,
    /// Whether to replace an existing job of the same name on creation
    replace_existing: bool,
    /// HTTP client instance
    client: Client,
}

impl OpenShiftClient {
    /// Create a new client from connection settings
    ///
    /// # Errors
    /// Fails if the underlying HTTP client cannot be built (e.g. TLS backend
    /// initialisation failure).
    pub fn new(config: ClusterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self::with_client(config, client))
    }

    /// Create a new client with a custom HTTP client
    ///
    /// `request_timeout` and `accept_invalid_certs` from the config are not
    /// applied; configure them on `client` instead.
    pub fn with_client(config: ClusterConfig, client: Client) -> Self {
        Self {
            base_url: config.api_server_url.trim_end_matches('/').to_string(),
            token: config.token,
            replace_existing: config.replace_existing,
            client,
        }
    }

    /// Get the base URL of the API server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request against an API path, with credentials attached
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, &url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and return an error if the request failed
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), api_message(&error_text)));
        }

        Ok(response)
    }

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response with a plain-text body
    async fn handle_text_response(&self, response: reqwest::Response) -> Result<String> {
        Ok(Self::check_status(response).await?.text().await?)
    }

    /// Handle an API response whose body is not needed
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        Self::check_status(response).await?;
        Ok(())
    }
}

impl fmt::Debug for OpenShiftClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenShiftClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .field("replace_existing", &self.replace_existing)
            .finish()
    }
}

/// Extract the `message` field of a Kubernetes `Status` body, if there is one
fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
