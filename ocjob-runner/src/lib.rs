//! ocjob Runner
//!
//! Runs one job on the cluster from creation to a terminal outcome.
//!
//! Architecture:
//! - Configuration: poll interval, timeout, error tolerance, cleanup policy
//! - Controller: the lifecycle state machine with its bounded poll loop
//! - Reporter: prints per-container logs of a job
//! - Progress: stall detection and "still waiting" pacing
//!
//! The controller talks to the cluster only through
//! [`ocjob_client::ClusterClient`], so it can be driven by any implementation
//! of that trait.

pub mod config;
pub mod controller;
pub mod progress;
pub mod reporter;

#[cfg(test)]
mod testing;

pub use config::ControllerConfig;
pub use controller::JobController;
pub use reporter::{LogReporter, ReportError};
