//! Job domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Logical description of a job to create
///
/// Built once by the template renderer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Name of the template stored on the cluster
    pub template_name: String,
    /// Template parameter values, one per key
    pub parameters: BTreeMap<String, String>,
    /// Canonicalised job name replacing the one from the template
    pub name_override: Option<String>,
    /// Namespace (project) the job is created in
    pub namespace: String,
}

/// Identifies a concrete job instance in the cluster
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle {
    pub namespace: String,
    pub name: String,
}

impl JobHandle {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job/{}/{}", self.namespace, self.name)
    }
}
