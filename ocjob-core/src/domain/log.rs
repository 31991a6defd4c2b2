//! Container log types

use serde::{Deserialize, Serialize};

/// Logs of one container, or the reason they could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerLog {
    pub pod: String,
    pub container: String,
    pub content: LogContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogContent {
    /// Log text as returned by the cluster (may be empty)
    Text(String),
    /// The fetch failed; carries the cause
    Unavailable(String),
}

impl ContainerLog {
    pub fn text(pod: impl Into<String>, container: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            pod: pod.into(),
            container: container.into(),
            content: LogContent::Text(text.into()),
        }
    }

    pub fn unavailable(
        pod: impl Into<String>,
        container: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            pod: pod.into(),
            container: container.into(),
            content: LogContent::Unavailable(reason.into()),
        }
    }
}
