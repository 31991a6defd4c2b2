//! ocjob CLI
//!
//! Runs a batch job from an OpenShift template on behalf of a workflow
//! scheduler and reports its result through the exit code.

mod commands;
mod config;
mod logging;
mod shutdown;

use clap::Parser;
use colored::*;
use commands::{Commands, handle_command};
use logging::LogLevel;
use ocjob_core::domain::outcome::EXIT_AGENT_FAILURE;
use std::io::IsTerminal;

#[derive(Parser)]
#[command(name = "ocjob")]
#[command(about = "Run OpenShift template jobs to completion", long_about = None)]
struct Cli {
    /// Verbosity of the agent's own logs (stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init(cli.log_level);
    if !std::io::stderr().is_terminal() {
        colored::control::set_override(false);
    }

    let code = match run(cli.command).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            println!("ocjob: error: {:#} (exit code {})", err, EXIT_AGENT_FAILURE);
            EXIT_AGENT_FAILURE
        }
    };

    std::process::exit(code);
}

async fn run(command: Commands) -> anyhow::Result<i32> {
    let cancel = shutdown::install_shutdown_handler()?;
    handle_command(command, cancel).await
}
