//! Template rendering
//!
//! Turns a template name plus `key=value` overrides into a `JobSpec`.
//! The template itself lives on the cluster and is only resolved when the
//! job is created, so nothing here touches the network.

use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

use crate::domain::job::JobSpec;

/// Maximum length of a cluster object name (DNS label)
pub const MAX_NAME_LEN: usize = 63;

/// Errors raised while rendering a job spec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A parameter was not of the form `key=value`
    #[error("malformed job parameter '{0}': expected key=value")]
    MalformedParameter(String),

    /// The template name was empty
    #[error("template name cannot be empty")]
    EmptyTemplateName,
}

/// Render a job spec from CLI input
///
/// # Arguments
/// * `template_name` - Name of the template on the cluster
/// * `params` - Raw `key=value` strings; later keys overwrite earlier ones
/// * `name_override` - Optional job name replacing the template's
/// * `namespace` - Target namespace
///
/// # Errors
/// Returns `RenderError::MalformedParameter` for any parameter without `=`
/// or with an empty key.
pub fn render<S: AsRef<str>>(
    template_name: &str,
    params: &[S],
    name_override: Option<&str>,
    namespace: &str,
) -> Result<JobSpec, RenderError> {
    let template_name = template_name.trim();
    if template_name.is_empty() {
        return Err(RenderError::EmptyTemplateName);
    }

    let mut parameters = BTreeMap::new();
    for raw in params {
        let (key, value) = parse_parameter(raw.as_ref())?;
        parameters.insert(key.to_string(), value.to_string());
    }

    if template_name.chars().any(char::is_uppercase) {
        warn!("template name '{}' should be lowercase", template_name);
    }

    let name_override = name_override.map(|name| {
        if name.chars().any(char::is_uppercase) {
            warn!("job name '{}' should be lowercase", name);
        }
        canonical_name(name)
    });

    Ok(JobSpec {
        template_name: template_name.to_lowercase(),
        parameters,
        name_override,
        namespace: namespace.to_string(),
    })
}

/// Split a `key=value` string on its first `=`
pub fn parse_parameter(raw: &str) -> Result<(&str, &str), RenderError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(RenderError::MalformedParameter(raw.to_string())),
    }
}

/// Turn an arbitrary string into a valid cluster object name
///
/// Lowercases, maps `_`, ` `, `.` and `/` to `-` and truncates to 63 characters.
pub fn canonical_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '_' | ' ' | '.' | '/' => '-',
            other => other,
        })
        .take(MAX_NAME_LEN)
        .collect()
}
