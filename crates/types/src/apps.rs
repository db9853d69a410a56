use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An application from the platform catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub id: String,
    pub system_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Display name of the person who integrated the app, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrator_username: Option<String>,
}

/// Body of `GET /apps`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppListResponse {
    #[serde(default)]
    pub apps: Vec<App>,
}

/// A single input accepted by an app.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type", default)]
    pub parameter_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl Parameter {
    /// Human-facing name of the parameter.
    ///
    /// Falls back to the label and then the identifier when the catalog leaves
    /// the name empty.
    pub fn display_name(&self) -> &str {
        [self.name.as_str(), self.label.as_str()]
            .into_iter()
            .find(|candidate| !candidate.trim().is_empty())
            .unwrap_or(self.id.as_str())
    }
}

/// A named group of parameters as presented by the launch form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterGroup {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// Body of `GET /apps/{system_id}/{app_id}/parameters`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppParameters {
    /// Job type tag that decides whether a launch waits for a URL.
    #[serde(default)]
    pub overall_job_type: String,
    #[serde(default)]
    pub groups: Vec<ParameterGroup>,
}

impl AppParameters {
    /// Iterates every parameter across all groups, in catalog order.
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.groups.iter().flat_map(|group| group.parameters.iter())
    }

    /// Whether launching this app produces an interactive session with a URL.
    pub fn is_interactive(&self) -> bool {
        is_interactive_job_type(&self.overall_job_type)
    }
}

/// Returns true for the job types that expose a reachable URL once running.
pub fn is_interactive_job_type(job_type: &str) -> bool {
    let job_type = job_type.trim();
    job_type.eq_ignore_ascii_case("interactive") || job_type.eq_ignore_ascii_case("vice")
}

/// Parameter id to value mapping sent as the submission `config`.
pub type LaunchConfig = IndexMap<String, Value>;

/// Body of `POST /app/launch/{system_id}/{app_id}`.
///
/// Optional fields are omitted from the JSON body so the server can fill them
/// in: it generates a name and output directory and resolves the email from
/// the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LaunchSubmission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub config: LaunchConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<IndexMap<String, Value>>,
}

/// Body returned by a successful launch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LaunchResponse {
    pub analysis_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn interactive_job_types_match_case_insensitively() {
        assert!(is_interactive_job_type("Interactive"));
        assert!(is_interactive_job_type("interactive"));
        assert!(is_interactive_job_type("VICE"));
        assert!(is_interactive_job_type("Vice"));
        assert!(!is_interactive_job_type("DE"));
        assert!(!is_interactive_job_type("OSG"));
        assert!(!is_interactive_job_type(""));
    }

    #[test]
    fn launch_submission_omits_unset_fields() {
        let mut config = LaunchConfig::new();
        config.insert("p1".to_string(), json!("value"));
        let submission = LaunchSubmission {
            name: Some("run-1".to_string()),
            config,
            ..Default::default()
        };

        let body = serde_json::to_value(&submission).unwrap();
        assert_eq!(body, json!({ "name": "run-1", "config": { "p1": "value" } }));
    }

    #[test]
    fn parameter_tree_decodes_type_tag_and_defaults() {
        let params: AppParameters = serde_json::from_value(json!({
            "overall_job_type": "Interactive",
            "groups": [{
                "id": "g1",
                "name": "inputs",
                "label": "Inputs",
                "parameters": [
                    { "id": "p1", "name": "Input file", "required": true, "type": "FileInput" },
                    { "id": "p2", "label": "Threads", "type": "Integer", "default_value": 4 }
                ]
            }]
        }))
        .unwrap();

        assert!(params.is_interactive());
        let collected: Vec<&Parameter> = params.parameters().collect();
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].parameter_type, "FileInput");
        assert_eq!(collected[1].default_value, Some(json!(4)));
        assert_eq!(collected[1].display_name(), "Threads");
    }
}
