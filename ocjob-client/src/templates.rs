//! Template-related API endpoints
//!
//! Templates are fetched and processed server-side; the agent only fills in
//! parameter values and picks the resulting Job object.

use ocjob_core::JobSpec;
use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::OpenShiftClient;
use crate::error::{ClientError, Result};

impl OpenShiftClient {
    // =============================================================================
    // Templates
    // =============================================================================

    /// Get a template from a namespace as raw JSON
    pub async fn get_template(&self, namespace: &str, name: &str) -> Result<Value> {
        let path = format!(
            "/apis/template.openshift.io/v1/namespaces/{}/templates/{}",
            namespace, name
        );
        let response = self.request(Method::GET, &path).send().await?;

        self.handle_response(response).await
    }

    /// Process a template server-side and return the processed template
    pub async fn process_template(&self, namespace: &str, template: &Value) -> Result<Value> {
        let path = format!(
            "/apis/template.openshift.io/v1/namespaces/{}/processedtemplates",
            namespace
        );
        let response = self
            .request(Method::POST, &path)
            .json(template)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Fetch, parameterise and process the template of `spec`, returning the
    /// single Job object it produces, ready to be created
    pub(crate) async fn render_job_object(&self, spec: &JobSpec) -> Result<Value> {
        let mut template = self
            .get_template(&spec.namespace, &spec.template_name)
            .await?;
        info!("Found template '{}' from server", spec.template_name);

        apply_parameters(&mut template, &spec.parameters)?;
        info!("Given template parameters are: {:?}", spec.parameters);

        let processed = self.process_template(&spec.namespace, &template).await?;
        debug!("Processed template: {}", processed);

        extract_job(processed, spec)
    }
}

/// Set parameter values on a template fetched from the cluster
///
/// Fails for parameters the template does not declare, the same way
/// `oc process` does.
pub(crate) fn apply_parameters(
    template: &mut Value,
    parameters: &BTreeMap<String, String>,
) -> Result<()> {
    if let Some(metadata) = template.get_mut("metadata").and_then(Value::as_object_mut) {
        metadata.insert("namespace".to_string(), Value::String(String::new()));
    }

    let declared = template
        .get_mut("parameters")
        .and_then(Value::as_array_mut);

    let mut unknown: Vec<&str> = parameters.keys().map(String::as_str).collect();

    if let Some(declared) = declared {
        for param in declared.iter_mut() {
            let Some(name) = param.get("name").and_then(Value::as_str).map(str::to_string)
            else {
                continue;
            };
            if let Some(value) = parameters.get(&name) {
                param["value"] = Value::String(value.clone());
                // an explicit value replaces any generator expression
                if let Some(obj) = param.as_object_mut() {
                    obj.remove("generate");
                    obj.remove("from");
                }
                unknown.retain(|k| *k != name);
            }
        }
    }

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(ClientError::InvalidRequest(format!(
            "unknown template parameter(s): {}",
            unknown.join(", ")
        )))
    }
}

/// Pick the Job object out of a processed template and apply the name override
pub(crate) fn extract_job(processed: Value, spec: &JobSpec) -> Result<Value> {
    let objects = match processed.get("objects").and_then(Value::as_array) {
        Some(objects) => objects.clone(),
        None => Vec::new(),
    };

    let mut jobs = Vec::new();
    for object in objects {
        let kind = object.get("kind").and_then(Value::as_str).unwrap_or_default();
        if kind == "Job" {
            jobs.push(object);
        } else {
            let name = object
                .pointer("/metadata/name")
                .and_then(Value::as_str)
                .unwrap_or("<unnamed>");
            warn!("Ignoring {}/{} from template: only Job objects are created", kind, name);
        }
    }

    let mut job = match jobs.len() {
        0 => {
            return Err(ClientError::InvalidRequest(format!(
                "template '{}' does not contain a Job object",
                spec.template_name
            )));
        }
        1 => jobs.remove(0),
        n => {
            return Err(ClientError::InvalidRequest(format!(
                "template '{}' contains {} Job objects, expected exactly one",
                spec.template_name, n
            )));
        }
    };

    let metadata = job
        .as_object_mut()
        .map(|obj| obj.entry("metadata").or_insert_with(|| Value::Object(Default::default())))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| ClientError::ParseError("Job object is not a JSON object".to_string()))?;

    metadata.insert("namespace".to_string(), Value::String(spec.namespace.clone()));
    if let Some(name) = &spec.name_override {
        metadata.insert("name".to_string(), Value::String(name.clone()));
    }

    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(name_override: Option<&str>) -> JobSpec {
        JobSpec {
            template_name: "harmonie".to_string(),
            parameters: BTreeMap::new(),
            name_override: name_override.map(str::to_string),
            namespace: "forecast".to_string(),
        }
    }

    #[test]
    fn test_apply_parameters() {
        let mut template = json!({
            "metadata": { "name": "harmonie", "namespace": "forecast" },
            "parameters": [
                { "name": "CYCLE", "value": "12" },
                { "name": "SUFFIX", "generate": "expression", "from": "[a-z]{5}" },
                { "name": "UNTOUCHED", "value": "x" }
            ]
        });
        let mut params = BTreeMap::new();
        params.insert("CYCLE".to_string(), "00".to_string());
        params.insert("SUFFIX".to_string(), "abc".to_string());

        apply_parameters(&mut template, &params).unwrap();

        assert_eq!(template["metadata"]["namespace"], "");
        assert_eq!(template["parameters"][0]["value"], "00");
        assert_eq!(template["parameters"][1]["value"], "abc");
        assert!(template["parameters"][1].get("generate").is_none());
        assert_eq!(template["parameters"][2]["value"], "x");
    }

    #[test]
    fn test_apply_unknown_parameter() {
        let mut template = json!({ "parameters": [ { "name": "CYCLE" } ] });
        let mut params = BTreeMap::new();
        params.insert("MEMBER".to_string(), "1".to_string());

        let err = apply_parameters(&mut template, &params).unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(msg) if msg.contains("MEMBER")));
    }

    #[test]
    fn test_extract_job_applies_override() {
        let processed = json!({
            "objects": [
                { "kind": "ConfigMap", "metadata": { "name": "cfg" } },
                { "kind": "Job", "apiVersion": "batch/v1", "metadata": { "name": "from-template" } }
            ]
        });
        let job = extract_job(processed, &spec(Some("my-run"))).unwrap();
        assert_eq!(job["metadata"]["name"], "my-run");
        assert_eq!(job["metadata"]["namespace"], "forecast");
    }

    #[test]
    fn test_extract_job_requires_exactly_one_job() {
        let none = json!({ "objects": [] });
        assert!(matches!(
            extract_job(none, &spec(None)),
            Err(ClientError::InvalidRequest(_))
        ));

        let two = json!({
            "objects": [
                { "kind": "Job", "metadata": { "name": "a" } },
                { "kind": "Job", "metadata": { "name": "b" } }
            ]
        });
        assert!(matches!(
            extract_job(two, &spec(None)),
            Err(ClientError::InvalidRequest(_))
        ));
    }
}
