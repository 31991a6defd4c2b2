//! ocjob Core
//!
//! Core types and pure logic for the ocjob job-lifecycle agent.
//!
//! This crate contains:
//! - Domain types: job specs, handles, status snapshots and run outcomes
//! - Template rendering: turning CLI parameters into a `JobSpec`
//! - Deadlines and timeout parsing
//!
//! Nothing in here performs I/O; the cluster client and the controller build on top of it.

pub mod deadline;
pub mod domain;
pub mod template;

pub use deadline::{Deadline, TimeoutParseError, parse_timeout};
pub use domain::job::{JobHandle, JobSpec};
pub use domain::log::{ContainerLog, LogContent};
pub use domain::outcome::{RunOutcome, RunReport};
pub use domain::status::{
    ContainerState, ContainerStatus, JobPhase, JobStatus, RawJobState, reported_exit_code,
};
pub use template::{RenderError, canonical_name, render};
