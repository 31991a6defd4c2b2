//! create-job-from-template command
//!
//! Renders the job spec, then hands it to the job controller and turns the
//! run report into the process exit code.

use anyhow::{Context, Result};
use clap::Args;
use ocjob_client::{ClusterClient, OpenShiftClient};
use ocjob_core::{JobSpec, parse_timeout, render};
use ocjob_runner::{ControllerConfig, JobController};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;

/// Arguments of `create-job-from-template`
#[derive(Debug, Args)]
pub struct CreateJobArgs {
    #[command(flatten)]
    pub config: Config,

    /// Name of the template on the cluster
    #[arg(long)]
    pub template_name: String,

    /// Job name to use instead of the one in the template
    #[arg(long)]
    pub override_job_name: Option<String>,

    /// Template parameter as key=value; may be repeated, the last value wins
    #[arg(long = "job-param")]
    pub job_params: Vec<String>,

    /// Maximum time to wait for the job, e.g. 30s, 15m, 2h (default: no limit)
    #[arg(long, value_parser = parse_timeout)]
    pub job_timeout: Option<Duration>,

    /// Only print logs of these containers (default: all containers)
    #[arg(long = "log-container-name", num_args = 1..)]
    pub log_containers: Vec<String>,

    /// Delete the job once it has finished
    #[arg(long)]
    pub delete_after_finished: bool,

    /// Do not delete an existing job with the same name before creating
    #[arg(long)]
    pub keep_existing: bool,

    /// Wait between two status polls
    #[arg(long, default_value = "2s", value_parser = parse_timeout)]
    pub poll_interval: Duration,

    /// Consecutive failed status polls tolerated before giving up
    #[arg(long, default_value_t = ocjob_runner::config::DEFAULT_MAX_POLL_ERRORS)]
    pub max_poll_errors: u32,
}

impl CreateJobArgs {
    /// Render the job spec; fails on malformed parameters
    pub fn job_spec(&self) -> Result<JobSpec> {
        let spec = render(
            &self.template_name,
            &self.job_params,
            self.override_job_name.as_deref(),
            &self.config.project,
        )?;
        Ok(spec)
    }

    pub fn controller_config(&self) -> Result<ControllerConfig> {
        let config = ControllerConfig::new(self.job_timeout)
            .with_poll_interval(self.poll_interval)
            .with_max_poll_errors(self.max_poll_errors)
            .with_log_containers(self.log_containers.iter().cloned())
            .with_delete_after_finished(self.delete_after_finished);
        config.validate()?;
        Ok(config)
    }
}

/// Run a job from a template to completion
pub async fn handle_create(args: CreateJobArgs, cancel: CancellationToken) -> Result<i32> {
    let mut stdout = std::io::stdout();
    run_create(&args, connect, cancel, &mut stdout).await
}

/// Render, connect, and run the job, writing logs and the summary to `out`
///
/// The spec and controller settings are checked before `connect` is called,
/// so invalid input never reaches the cluster.
pub async fn run_create<C, W>(
    args: &CreateJobArgs,
    connect: C,
    cancel: CancellationToken,
    out: &mut W,
) -> Result<i32>
where
    C: FnOnce(&Config, bool) -> Result<Arc<dyn ClusterClient>>,
    W: Write + Send,
{
    let spec = args.job_spec()?;
    let controller_config = args.controller_config()?;
    let client = connect(&args.config, !args.keep_existing)?;

    let controller = JobController::with_cancellation(client, controller_config, cancel);
    let report = controller.run(&spec, out).await;

    Ok(report.exit_code())
}

/// Build the HTTP cluster client from the connection arguments
fn connect(config: &Config, replace_existing: bool) -> Result<Arc<dyn ClusterClient>> {
    let cluster_config = config
        .cluster_config(replace_existing)
        .context("Invalid cluster configuration")?;

    info!(
        "Connecting to {} as project {}",
        cluster_config.api_server_url, cluster_config.namespace
    );
    let client = OpenShiftClient::new(cluster_config).context("Failed to build HTTP client")?;

    Ok(Arc::new(client))
}
