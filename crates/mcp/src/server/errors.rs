//! Structured tool error helpers.

use chrono::Utc;
use formation_api::FormationError;
use rmcp::model::ErrorData;
use serde_json::{Value, json};

use crate::workflow::{BrowserError, WorkflowError};

fn build_error_data(
    error_code: &str,
    category: &str,
    message: &str,
    context: Value,
    retryable: bool,
    suggested_action: &str,
    violations: Option<Vec<Value>>,
) -> Value {
    let mut payload = json!({
        "error_code": error_code,
        "category": category,
        "message": message,
        "context": context,
        "retryable": retryable,
        "suggested_action": suggested_action,
        "correlation_id": format!("formation-{}", Utc::now().timestamp_millis()),
    });
    if let Some(violations) = violations {
        payload["violations"] = Value::Array(violations);
    }
    payload
}

fn internal(error_code: &str, category: &str, message: String, context: Value, retryable: bool, suggested_action: &str) -> ErrorData {
    let data = build_error_data(error_code, category, &message, context, retryable, suggested_action, None);
    ErrorData::internal_error(message, Some(data))
}

pub fn invalid_params_error(error_code: &str, message: impl Into<String>, context: Value, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::invalid_params(
        message.clone(),
        Some(build_error_data(
            error_code,
            "validation",
            &message,
            context,
            false,
            suggested_action,
            None,
        )),
    )
}

/// Launch refused because required parameters have no value in the config.
pub fn missing_parameters_error(app_id: &str, missing: &[String]) -> ErrorData {
    let message = format!("Missing required parameters: {}", missing.join(", "));
    let violations = missing
        .iter()
        .map(|name| json!({ "parameter": name, "reason": "required parameter has no value in config" }))
        .collect();
    ErrorData::invalid_params(
        message.clone(),
        Some(build_error_data(
            "LAUNCH_PARAMETERS_MISSING",
            "validation",
            &message,
            json!({ "app_id": app_id }),
            false,
            "Call get_app_parameters and supply every required parameter id in config.",
            Some(violations),
        )),
    )
}

/// Translate an API client failure for the named tool.
pub fn api_error(tool: &str, error: &FormationError) -> ErrorData {
    let message = error.to_string();
    match error {
        FormationError::Configuration { .. } | FormationError::InvalidUrl(_) => internal(
            "FORMATION_CONFIGURATION_INVALID",
            "configuration",
            message,
            json!({ "tool": tool }),
            false,
            "Check the base URL and credentials the server was started with.",
        ),
        FormationError::Authentication { status, .. } => internal(
            "FORMATION_AUTHENTICATION_FAILED",
            "authentication",
            message,
            json!({ "tool": tool, "status": status }),
            false,
            "Verify the configured username and password or token.",
        ),
        FormationError::Api { status: 404, .. } => ErrorData::resource_not_found(
            message.clone(),
            Some(build_error_data(
                "FORMATION_RESOURCE_NOT_FOUND",
                "not_found",
                &message,
                json!({ "tool": tool, "status": 404 }),
                false,
                "Check the id or path and try again.",
                None,
            )),
        ),
        FormationError::Api { status, .. } => internal(
            "FORMATION_API_ERROR",
            "remote_api",
            message,
            json!({ "tool": tool, "status": status }),
            error.is_retryable(),
            if error.is_retryable() {
                "Retry the call after a short delay."
            } else {
                "Adjust the request arguments before retrying."
            },
        ),
        FormationError::Transport(_) => internal(
            "FORMATION_TRANSPORT_FAILED",
            "transport",
            message,
            json!({ "tool": tool }),
            true,
            "Check network connectivity to the platform and retry.",
        ),
        FormationError::Decode { what, .. } => internal(
            "FORMATION_RESPONSE_UNREADABLE",
            "remote_api",
            message,
            json!({ "tool": tool, "response": what }),
            false,
            "The platform returned an unexpected response; report it if it persists.",
        ),
        FormationError::InvalidPath { path } => invalid_params_error(
            "FORMATION_PATH_INVALID",
            message,
            json!({ "tool": tool, "path": path }),
            "Pass the full data store path without '.' or '..' segments.",
        ),
        FormationError::InvalidMetadata { key } => invalid_params_error(
            "FORMATION_METADATA_INVALID",
            message,
            json!({ "tool": tool, "key": key }),
            "Use metadata keys and values that are valid HTTP header text.",
        ),
    }
}

/// Translate a launch-and-wait failure.
pub fn workflow_error(error: &WorkflowError) -> ErrorData {
    let message = error.to_string();
    match error {
        WorkflowError::Api(api) => api_error("launch_app_and_wait", api),
        WorkflowError::Failed { status, partial } => internal(
            "ANALYSIS_FAILED",
            "execution",
            message,
            json!({ "analysis_id": partial.analysis_id, "status": status }),
            false,
            "Inspect the analysis in the platform for details before relaunching.",
        ),
        WorkflowError::TimedOut { waited, partial } => internal(
            "ANALYSIS_READY_TIMEOUT",
            "timeout",
            message,
            json!({
                "analysis_id": partial.analysis_id,
                "waited_secs": waited.as_secs(),
                "last_status": partial.status,
            }),
            true,
            "The analysis may still start; check it with get_analysis_status.",
        ),
        WorkflowError::Cancelled { partial } => cancelled_error(
            "launch_app_and_wait",
            partial.as_ref().map(|partial| partial.analysis_id.as_str()),
        ),
    }
}

pub fn browser_error(url: &str, error: &BrowserError) -> ErrorData {
    internal(
        "BROWSER_OPEN_FAILED",
        "local_io",
        error.to_string(),
        json!({ "url": url }),
        false,
        "Open the URL manually.",
    )
}

pub fn cancelled_error(tool: &str, analysis_id: Option<&str>) -> ErrorData {
    let mut context = json!({ "tool": tool });
    if let Some(analysis_id) = analysis_id {
        context["analysis_id"] = json!(analysis_id);
    }
    internal(
        "REQUEST_CANCELLED",
        "cancelled",
        format!("{tool} cancelled by the caller"),
        context,
        false,
        "Repeat the call if the result is still needed.",
    )
}
