//! print-logs-for-job command

use anyhow::{Context, Result};
use clap::Args;
use ocjob_client::OpenShiftClient;
use ocjob_core::{JobHandle, canonical_name};
use ocjob_runner::LogReporter;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;

/// Arguments of `print-logs-for-job`
#[derive(Debug, Args)]
pub struct PrintLogsArgs {
    #[command(flatten)]
    pub config: Config,

    /// Name of an existing job
    #[arg(long)]
    pub job_name: String,

    /// Only print logs of these containers (default: all containers)
    #[arg(long = "log-container-name", num_args = 1..)]
    pub log_containers: Vec<String>,
}

impl PrintLogsArgs {
    pub fn handle(&self) -> JobHandle {
        JobHandle::new(&self.config.project, canonical_name(&self.job_name))
    }

    pub fn containers(&self) -> BTreeSet<String> {
        self.log_containers.iter().cloned().collect()
    }
}

/// Print the logs of an existing job
pub async fn handle_print_logs(args: PrintLogsArgs) -> Result<i32> {
    let cluster_config = args
        .config
        .cluster_config(false)
        .context("Invalid cluster configuration")?;
    let client = OpenShiftClient::new(cluster_config).context("Failed to build HTTP client")?;
    let reporter = LogReporter::new(Arc::new(client));

    let handle = args.handle();
    let mut stdout = std::io::stdout();
    let written = reporter
        .report(&handle, &args.containers(), &mut stdout)
        .await
        .with_context(|| format!("Failed to print logs of {}", handle))?;

    info!("Printed {} container log(s) of {}", written, handle);
    Ok(0)
}
