//! Controller configuration
//!
//! Defines the tunables of one job run: how often to poll, how long to wait,
//! how many consecutive transport failures to tolerate, and what to do with
//! the job once it is finished.

use std::collections::BTreeSet;
use std::time::Duration;

/// Default wait between two status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default number of consecutive failed polls before giving up
pub const DEFAULT_MAX_POLL_ERRORS: u32 = 5;

/// Default interval between "still waiting" progress lines
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(20);

/// Controller configuration
///
/// The state machine does not depend on any of these values; they only
/// shape how fast it moves and how patient it is.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Wait between two status polls
    pub poll_interval: Duration,

    /// Maximum time to wait for the job; `None` waits forever
    pub timeout: Option<Duration>,

    /// Consecutive transport failures after which the run ends with a poll error
    pub max_poll_errors: u32,

    /// Containers whose logs are printed; empty means all
    pub log_containers: BTreeSet<String>,

    /// Delete the job once the run has reached a terminal outcome
    pub delete_after_finished: bool,

    /// Interval between "still waiting" progress lines
    pub progress_interval: Duration,
}

impl ControllerConfig {
    /// Creates a configuration with defaults and the given timeout
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout,
            max_poll_errors: DEFAULT_MAX_POLL_ERRORS,
            log_containers: BTreeSet::new(),
            delete_after_finished: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_poll_errors(mut self, max_poll_errors: u32) -> Self {
        self.max_poll_errors = max_poll_errors;
        self
    }

    pub fn with_log_containers<I, S>(mut self, containers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.log_containers = containers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_delete_after_finished(mut self, delete: bool) -> Self {
        self.delete_after_finished = delete;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.max_poll_errors == 0 {
            anyhow::bail!("max_poll_errors must be greater than 0");
        }

        if self.progress_interval.is_zero() {
            anyhow::bail!("progress_interval must be greater than 0");
        }

        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new(None)
    }
}
