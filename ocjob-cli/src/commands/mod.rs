//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod create;
mod logs;

pub use create::CreateJobArgs;
pub use logs::PrintLogsArgs;

use anyhow::Result;
use clap::Subcommand;
use tokio_util::sync::CancellationToken;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create a job from a template, wait for it and print its logs
    CreateJobFromTemplate(CreateJobArgs),
    /// Print the logs of an existing job
    PrintLogsForJob(PrintLogsArgs),
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Returns
/// The process exit code
pub async fn handle_command(command: Commands, cancel: CancellationToken) -> Result<i32> {
    match command {
        Commands::CreateJobFromTemplate(args) => create::handle_create(args, cancel).await,
        Commands::PrintLogsForJob(args) => logs::handle_print_logs(args).await,
    }
}
