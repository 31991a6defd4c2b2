//! Configuration module
//!
//! Connection settings shared by all commands: where the API server is,
//! which project to work in, and where the bearer token comes from.

use anyhow::{Context, Result};
use clap::Args;
use ocjob_client::ClusterConfig;
use ocjob_core::parse_timeout;
use std::time::Duration;

/// Default environment variable holding the bearer token
pub const DEFAULT_TOKEN_ENV_KEY: &str = "ECFLOW_OPENSHIFT_TOKEN";

/// Connection arguments accepted by every command
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// API server URL, e.g. https://api.cluster.example:6443
    #[arg(long, env = "OCJOB_API_SERVER_URL")]
    pub api_server_url: String,

    /// Project (namespace) to work in
    #[arg(long, env = "OCJOB_PROJECT")]
    pub project: String,

    /// Name of the environment variable holding the bearer token
    #[arg(long, alias = "token-source", default_value = DEFAULT_TOKEN_ENV_KEY)]
    pub token_from_env_key: String,

    /// Do not send a token (e.g. when going through `kubectl proxy`)
    #[arg(long)]
    pub no_login: bool,

    /// Accept invalid TLS certificates from the API server
    #[arg(long)]
    pub insecure_skip_tls_verify: bool,

    /// Timeout of a single API request
    #[arg(long, default_value = "30s", value_parser = parse_timeout)]
    pub request_timeout: Duration,
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_server_url.is_empty() {
            anyhow::bail!("api-server-url cannot be empty");
        }

        if !self.api_server_url.starts_with("http://")
            && !self.api_server_url.starts_with("https://")
        {
            anyhow::bail!("api-server-url must start with http:// or https://");
        }

        if self.project.trim().is_empty() {
            anyhow::bail!("project cannot be empty");
        }

        if !self.no_login && self.token_from_env_key.is_empty() {
            anyhow::bail!("token-from-env-key cannot be empty");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request-timeout must be greater than 0");
        }

        Ok(())
    }

    /// Resolve the bearer token through `lookup`
    ///
    /// Returns `None` when login is disabled.
    pub fn resolve_token_with<F>(&self, lookup: F) -> Result<Option<String>>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.no_login {
            return Ok(None);
        }

        let token = lookup(&self.token_from_env_key)
            .filter(|token| !token.trim().is_empty())
            .with_context(|| {
                format!(
                    "No token found: environment variable {} is not set",
                    self.token_from_env_key
                )
            })?;

        Ok(Some(token.trim().to_string()))
    }

    /// Build the cluster client settings, reading the token from the environment
    pub fn cluster_config(&self, replace_existing: bool) -> Result<ClusterConfig> {
        self.validate()?;
        let token = self.resolve_token_with(|key| std::env::var(key).ok())?;

        let mut config = ClusterConfig::new(&self.api_server_url, &self.project);
        config.token = token;
        config.request_timeout = self.request_timeout;
        config.accept_invalid_certs = self.insecure_skip_tls_verify;
        config.replace_existing = replace_existing;

        Ok(config)
    }
}
