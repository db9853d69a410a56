//! Markdown text returned by the tools.

use std::fmt::Write;

use formation_types::{Analysis, AnalysisStatus, App, AppParameters, DirectoryContents, FileContent, Metadata};
use serde_json::Value;

use crate::workflow::LaunchResult;

pub fn render_apps(apps: &[App]) -> String {
    let mut out = format!("## Available Applications ({})\n\n", apps.len());
    for app in apps {
        let _ = writeln!(out, "### {}", app.name);
        let _ = writeln!(out, "- **ID**: `{}`", app.id);
        let _ = writeln!(out, "- **System**: `{}`", app.system_id);
        if let Some(integrator) = app.integrator_username.as_deref().filter(|name| !name.is_empty()) {
            let _ = writeln!(out, "- **Integrator**: {integrator}");
        }
        let _ = writeln!(out, "- **Description**: {}\n", app.description);
    }
    out
}

pub fn render_app_parameters(parameters: &AppParameters) -> String {
    let mut out = String::from("## App Parameters\n\n");
    let _ = writeln!(out, "**Job Type**: {}\n", parameters.overall_job_type);
    for group in &parameters.groups {
        let heading = if group.label.is_empty() { &group.name } else { &group.label };
        let _ = writeln!(out, "### {heading}\n");
        for parameter in &group.parameters {
            let label = if parameter.label.is_empty() {
                parameter.display_name()
            } else {
                parameter.label.as_str()
            };
            let required = if parameter.required { " (required)" } else { "" };
            let _ = writeln!(out, "- **{label}**{required}: {}", parameter.description);
            let _ = writeln!(out, "  - ID: `{}`", parameter.id);
            let _ = writeln!(out, "  - Type: `{}`", parameter.parameter_type);
            if let Some(default) = parameter.default_value.as_ref().filter(|value| !value.is_null()) {
                let _ = writeln!(out, "  - Default: `{}`", plain_value(default));
            }
        }
        out.push('\n');
    }
    out
}

pub fn render_launch(result: &LaunchResult) -> String {
    let mut out = String::new();
    if result.interactive {
        out.push_str("**Interactive App Launched Successfully**\n\n");
    } else {
        out.push_str("**Batch Job Launched Successfully**\n\n");
    }
    let _ = writeln!(out, "- **Analysis ID**: `{}`", result.analysis_id);
    let _ = writeln!(out, "- **Name**: {}", result.name);
    let _ = writeln!(out, "- **Status**: {}", result.status);
    if let Some(url) = &result.url {
        let _ = writeln!(out, "- **URL**: {url}");
    }
    if !result.interactive {
        out.push_str("\nThe batch job has been submitted and is running in the background.");
    }
    out
}

pub fn render_analysis_status(status: &AnalysisStatus) -> String {
    let mut out = String::from("## Analysis Status\n\n");
    let _ = writeln!(out, "- **Analysis ID**: `{}`", status.analysis_id);
    let _ = writeln!(out, "- **Status**: {}", status.status);
    if status.url_ready {
        out.push_str("- **URL Ready**: Yes\n");
        if let Some(url) = status.ready_url() {
            let _ = writeln!(out, "- **URL**: {url}");
        }
    } else {
        out.push_str("- **URL Ready**: No\n");
    }
    out
}

pub fn render_analyses(status: &str, analyses: &[Analysis]) -> String {
    if analyses.is_empty() {
        return format!("No {status} analyses found.");
    }
    let mut out = format!("## {status} Analyses ({})\n\n", analyses.len());
    for analysis in analyses {
        let _ = writeln!(out, "### Analysis `{}`", analysis.analysis_id);
        let _ = writeln!(out, "- **Analysis ID**: `{}`", analysis.analysis_id);
        let _ = writeln!(out, "- **App ID**: `{}`", analysis.app_id);
        let _ = writeln!(out, "- **System**: `{}`", analysis.system_id);
        let _ = writeln!(out, "- **Status**: {}\n", analysis.status);
    }
    out
}

pub fn render_stopped(analysis_id: &str, save_outputs: bool) -> String {
    let outputs = if save_outputs { "Saved" } else { "Not saved" };
    format!("**Analysis Stopped**\n\n- **Analysis ID**: `{analysis_id}`\n- **Outputs**: {outputs}")
}

pub fn render_opened(url: &str) -> String {
    format!("Opened {url} in browser")
}

pub fn render_directory(listing: &DirectoryContents) -> String {
    let mut out = format!("## Directory: {}\n\n", listing.path);
    render_metadata(&mut out, &listing.metadata);

    let (directories, files) = listing.partition();
    if directories.is_empty() && files.is_empty() {
        out.push_str("*Empty directory*\n");
        return out;
    }
    if !directories.is_empty() {
        out.push_str("### Directories\n\n");
        for entry in directories {
            let _ = writeln!(out, "- {}", entry.name);
        }
        out.push('\n');
    }
    if !files.is_empty() {
        out.push_str("### Files\n\n");
        for entry in files {
            let _ = writeln!(out, "- {}", entry.name);
        }
    }
    out
}

/// File bodies are rendered whole, never truncated. The fence is longer
/// than any backtick run in the body so the block cannot close early.
pub fn render_file(file: &FileContent) -> String {
    let text = file.text();
    let fence = "`".repeat(longest_backtick_run(&text).max(2) + 1);

    let mut out = format!("## File: {}\n\n", file.path);
    render_metadata(&mut out, &file.metadata);
    let _ = write!(out, "### Content\n\n{fence}\n{text}\n{fence}\n");
    out
}

fn longest_backtick_run(text: &str) -> usize {
    text.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}

pub fn render_created_directory(path: &str) -> String {
    format!("Created directory: {path}")
}

pub fn render_uploaded(path: &str, bytes: usize) -> String {
    format!("Uploaded file: {path} ({bytes} bytes)")
}

pub fn render_metadata_set(path: &str, replace: bool) -> String {
    let action = if replace { "replaced on" } else { "added to" };
    format!("Metadata {action}: {path}")
}

pub fn render_deleted(path: &str, dry_run: bool) -> String {
    if dry_run {
        format!("Dry run: would delete {path}")
    } else {
        format!("Deleted: {path}")
    }
}

fn render_metadata(out: &mut String, metadata: &Metadata) {
    if metadata.is_empty() {
        return;
    }
    out.push_str("### Metadata\n\n");
    for (key, value) in metadata {
        let _ = writeln!(out, "- **{key}**: {value}");
    }
    out.push('\n');
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
