//! Deadlines and timeout parsing

use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Absolute instant after which the agent stops waiting for a job
///
/// Uses the tokio clock so that tests running with a paused clock see
/// deterministic expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    Unbounded,
    At(Instant),
}

impl Deadline {
    /// Deadline `timeout` after `start`, or unbounded if there is no timeout
    pub fn from_timeout(start: Instant, timeout: Option<Duration>) -> Self {
        match timeout.and_then(|t| start.checked_add(t)) {
            Some(at) => Deadline::At(at),
            None => Deadline::Unbounded,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        match self {
            Deadline::Unbounded => false,
            Deadline::At(at) => now >= *at,
        }
    }

    /// Time left until expiry, `None` when unbounded
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        match self {
            Deadline::Unbounded => None,
            Deadline::At(at) => Some(at.saturating_duration_since(now)),
        }
    }

    /// The earlier of `wake` and the deadline
    pub fn clamp(&self, wake: Instant) -> Instant {
        match self {
            Deadline::Unbounded => wake,
            Deadline::At(at) => wake.min(*at),
        }
    }
}

/// Errors raised while parsing a timeout string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeoutParseError {
    #[error("timeout cannot be empty")]
    Empty,

    #[error("invalid timeout '{0}': expected a number with optional unit s, m or h")]
    Invalid(String),
}

/// Parse a timeout such as `30s`, `15m`, `2h` or a bare number of seconds
pub fn parse_timeout(input: &str) -> Result<Duration, TimeoutParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(TimeoutParseError::Empty);
    }

    let (digits, multiplier) = match input.char_indices().last() {
        Some((idx, 's')) => (&input[..idx], 1),
        Some((idx, 'm')) => (&input[..idx], 60),
        Some((idx, 'h')) => (&input[..idx], 3600),
        _ => (input, 1),
    };

    let value: u64 = digits
        .parse()
        .map_err(|_| TimeoutParseError::Invalid(input.to_string()))?;

    value
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(|| TimeoutParseError::Invalid(input.to_string()))
}
