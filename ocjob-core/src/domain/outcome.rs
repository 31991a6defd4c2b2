//! Run outcomes
//!
//! Exactly one `RunOutcome` is produced per controller invocation and it is
//! the only input to the process exit code.

use serde::{Deserialize, Serialize};

use crate::domain::job::JobHandle;

/// Exit code reported when the agent gave up waiting for the job
pub const EXIT_TIMED_OUT: i32 = 124;

/// Exit code reported when the agent itself failed (creation, polling, setup)
pub const EXIT_AGENT_FAILURE: i32 = 125;

/// Exit code reported when the agent was interrupted by a signal
pub const EXIT_CANCELLED: i32 = 130;

/// Terminal result of one controller invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// The job reached a terminal state and reported this exit code
    Completed(i32),
    /// The deadline passed before the job reached a terminal state
    TimedOut,
    /// The cluster rejected the job
    CreationFailed(String),
    /// The cluster could not be observed any more
    PollError(String),
    /// The agent was asked to stop while waiting
    Cancelled,
}

impl RunOutcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Completed(code) => *code,
            RunOutcome::TimedOut => EXIT_TIMED_OUT,
            RunOutcome::CreationFailed(_) | RunOutcome::PollError(_) => EXIT_AGENT_FAILURE,
            RunOutcome::Cancelled => EXIT_CANCELLED,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Completed(0))
    }
}

/// A run outcome together with the identity of the job it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Template the job was created from
    pub template_name: String,
    /// Handle of the created job, absent when creation failed
    pub handle: Option<JobHandle>,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }

    /// One human-readable line describing how the run ended
    pub fn summary_line(&self) -> String {
        let target = match &self.handle {
            Some(handle) => handle.to_string(),
            None => format!("template/{}", self.template_name),
        };

        match &self.outcome {
            RunOutcome::Completed(0) => format!("{} succeeded (exit code 0)", target),
            RunOutcome::Completed(code) => format!("{} failed (exit code {})", target, code),
            RunOutcome::TimedOut => format!(
                "{} timed out before reaching a terminal state (exit code {})",
                target, EXIT_TIMED_OUT
            ),
            RunOutcome::CreationFailed(cause) => format!(
                "{} could not be created: {} (exit code {})",
                target, cause, EXIT_AGENT_FAILURE
            ),
            RunOutcome::PollError(cause) => format!(
                "{} could not be observed: {} (exit code {})",
                target, cause, EXIT_AGENT_FAILURE
            ),
            RunOutcome::Cancelled => format!(
                "{} was left running, agent interrupted (exit code {})",
                target, EXIT_CANCELLED
            ),
        }
    }
}
