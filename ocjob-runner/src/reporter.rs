//! Log reporter
//!
//! Fetches the logs of a job's containers and writes them out, one labelled
//! block per container. A container whose logs could not be fetched gets an
//! explicit marker instead of being left out, so "no output" and "fetch
//! failed" stay distinguishable.

use ocjob_client::{ClientError, ClusterClient};
use ocjob_core::{ContainerLog, JobHandle, LogContent};
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while reporting logs
#[derive(Debug, Error)]
pub enum ReportError {
    /// The logs could not be fetched at all
    #[error("Failed to fetch logs: {0}")]
    Fetch(#[from] ClientError),

    /// The output stream refused the logs
    #[error("Failed to write logs: {0}")]
    Write(#[from] io::Error),
}

/// Prints container logs of a job
#[derive(Clone)]
pub struct LogReporter {
    client: Arc<dyn ClusterClient>,
}

impl LogReporter {
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        Self { client }
    }

    /// Fetch and print the logs of `handle`
    ///
    /// # Arguments
    /// * `handle` - The job whose logs to print
    /// * `containers` - Container names to include; empty means all
    /// * `out` - Where to write the log blocks
    ///
    /// # Returns
    /// The number of container blocks written
    pub async fn report<W: Write + Send>(
        &self,
        handle: &JobHandle,
        containers: &BTreeSet<String>,
        out: &mut W,
    ) -> Result<usize, ReportError> {
        debug!("Fetching logs for {}", handle);
        let logs = self.client.fetch_container_logs(handle, containers).await?;

        write_logs(&logs, out)?;
        Ok(logs.len())
    }
}

/// Write log blocks for the given containers
pub fn write_logs<W: Write>(logs: &[ContainerLog], out: &mut W) -> io::Result<()> {
    if logs.is_empty() {
        writeln!(out, "(no containers matched)")?;
        return out.flush();
    }

    for log in logs {
        writeln!(out, "==> pod/{} container/{} <==", log.pod, log.container)?;
        match &log.content {
            LogContent::Text(text) if text.is_empty() => writeln!(out, "(no output)")?,
            LogContent::Text(text) => {
                let text = expand_escaped_newlines(text);
                out.write_all(text.as_bytes())?;
                if !text.ends_with('\n') {
                    writeln!(out)?;
                }
            }
            LogContent::Unavailable(reason) => {
                writeln!(out, "(logs unavailable: {})", reason)?
            }
        }
    }

    out.flush()
}

/// Expand literal `\n` sequences some workloads emit into real newlines
fn expand_escaped_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}
