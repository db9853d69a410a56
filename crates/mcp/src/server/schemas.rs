use formation_types::{LaunchConfig, Metadata};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::workflow::DEFAULT_MAX_WAIT_SECS;

fn default_system_id() -> String {
    "de".to_string()
}

fn default_app_limit() -> u32 {
    formation_api::DEFAULT_APP_LIMIT
}

fn default_browse_limit() -> u32 {
    100
}

fn default_max_wait() -> u64 {
    DEFAULT_MAX_WAIT_SECS
}

fn default_status_filter() -> String {
    "Running".to_string()
}

fn default_true() -> bool {
    true
}

/// Parameters for app catalog search.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ListAppsRequest {
    #[schemars(description = "Optional filter on the app name.")]
    #[serde(default)]
    pub name: Option<String>,
    #[schemars(description = "Optional filter on the integrator's display name, for example 'Jane Doe'.")]
    #[serde(default)]
    pub integrator: Option<String>,
    #[schemars(description = "Optional filter on the app description.")]
    #[serde(default)]
    pub description: Option<String>,
    #[schemars(description = "Optional filter on job type: Interactive, DE, OSG or Tapis.")]
    #[serde(default)]
    pub job_type: Option<String>,
    #[schemars(description = "Maximum number of apps to return (default 10).")]
    #[serde(default = "default_app_limit")]
    pub limit: u32,
    #[schemars(description = "Number of apps to skip for pagination (default 0).")]
    #[serde(default)]
    pub offset: u32,
}

/// Identifies one app in the catalog.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GetAppParametersRequest {
    #[schemars(description = "Application id as returned by list_apps.")]
    pub app_id: String,
    #[schemars(description = "System the app belongs to (default 'de').")]
    #[serde(default = "default_system_id")]
    pub system_id: String,
}

/// Parameters for launching an app.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LaunchAppRequest {
    #[schemars(description = "Application id as returned by list_apps.")]
    pub app_id: String,
    #[schemars(description = "System the app belongs to (default 'de').")]
    #[serde(default = "default_system_id")]
    pub system_id: String,
    #[schemars(description = "Name for the analysis. The platform generates one when omitted.")]
    #[serde(default)]
    pub name: Option<String>,
    #[schemars(description = "Parameter values keyed by parameter id, as listed by get_app_parameters.")]
    #[serde(default)]
    pub config: LaunchConfig,
    #[schemars(description = "Seconds to wait for an interactive app's URL (default 300).")]
    #[serde(default = "default_max_wait")]
    pub max_wait: u64,
    #[schemars(description = "Launch in debug mode. Platform default applies when omitted.")]
    #[serde(default)]
    pub debug: Option<bool>,
    #[schemars(description = "Send a notification on completion. Platform default applies when omitted.")]
    #[serde(default)]
    pub notify: Option<bool>,
    #[schemars(description = "Data store directory for outputs. Platform default applies when omitted.")]
    #[serde(default)]
    pub output_dir: Option<String>,
}

/// Identifies one analysis.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AnalysisStatusRequest {
    #[schemars(description = "Analysis id returned by launch_app_and_wait or list_running_analyses.")]
    pub analysis_id: String,
}

/// Status filter for analysis listings.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ListAnalysesRequest {
    #[schemars(description = "Status to filter on (default 'Running'). Common values: Running, Completed, Failed, Submitted, Canceled.")]
    #[serde(default = "default_status_filter")]
    pub status: String,
}

/// Parameters for stopping an analysis.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StopAnalysisRequest {
    #[schemars(description = "Analysis id to stop.")]
    pub analysis_id: String,
    #[schemars(description = "Save outputs before stopping (default true).")]
    #[serde(default = "default_true")]
    pub save_outputs: bool,
}

/// A URL to show to the user.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OpenInBrowserRequest {
    #[schemars(description = "URL to open in the default browser.")]
    pub url: String,
}

/// Parameters for reading from the data store.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BrowseDataRequest {
    #[schemars(description = "Data store path of a directory to list or a file to read.")]
    pub path: String,
    #[schemars(description = "Number of entries to skip (default 0).")]
    #[serde(default)]
    pub offset: u32,
    #[schemars(description = "Maximum number of entries to return (default 100).")]
    #[serde(default = "default_browse_limit")]
    pub limit: u32,
    #[schemars(description = "Include the path's metadata in the result (default false).")]
    #[serde(default)]
    pub include_metadata: bool,
}

/// Parameters for directory creation.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreateDirectoryRequest {
    #[schemars(description = "Data store path of the new directory.")]
    pub path: String,
    #[schemars(description = "Optional attributes to attach to the directory.")]
    #[serde(default)]
    pub metadata: IndexMap<String, Value>,
}

/// Parameters for file upload.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UploadFileRequest {
    #[schemars(description = "Destination path of the file in the data store.")]
    pub path: String,
    #[schemars(description = "File content.")]
    pub content: String,
    #[schemars(description = "Optional attributes to attach to the file.")]
    #[serde(default)]
    pub metadata: IndexMap<String, Value>,
}

/// Parameters for metadata updates.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SetMetadataRequest {
    #[schemars(description = "Data store path to update.")]
    pub path: String,
    #[schemars(description = "Attributes to set.")]
    pub metadata: IndexMap<String, Value>,
    #[schemars(description = "Replace all existing attributes instead of merging (default false).")]
    #[serde(default)]
    pub replace: bool,
}

/// Parameters for deletion.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeleteDataRequest {
    #[schemars(description = "Data store path to delete.")]
    pub path: String,
    #[schemars(description = "Delete directories with their contents (default false).")]
    #[serde(default)]
    pub recurse: bool,
    #[schemars(description = "Report what would be deleted without deleting (default false).")]
    #[serde(default)]
    pub dry_run: bool,
}

/// Flatten tool-supplied attribute values to the strings carried in headers.
///
/// Strings pass through unquoted; any other JSON value uses its compact JSON
/// text.
pub fn metadata_from_arguments(arguments: &IndexMap<String, Value>) -> Metadata {
    arguments
        .iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect()
}
