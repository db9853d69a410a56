use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Snapshot returned by `GET /apps/analyses/{analysis_id}/status`.
///
/// Each poll yields a complete replacement snapshot; nothing is merged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AnalysisStatus {
    pub analysis_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub url_ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_check_details: Option<Value>,
}

impl AnalysisStatus {
    /// The interactive URL, only once the server reports it reachable.
    pub fn ready_url(&self) -> Option<&str> {
        if !self.url_ready {
            return None;
        }
        self.url.as_deref().filter(|url| !url.is_empty())
    }

    /// Whether the status is one the job never leaves successfully.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self.status.as_str(), "Failed" | "Canceled")
    }
}

/// One entry of `GET /apps/analyses/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Analysis {
    pub analysis_id: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub system_id: String,
    #[serde(default)]
    pub status: String,
}

/// Body of `GET /apps/analyses/`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalysisListResponse {
    #[serde(default)]
    pub analyses: Vec<Analysis>,
}

/// Operations accepted by `POST /apps/analyses/{analysis_id}/control`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisOperation {
    Exit,
    SaveAndExit,
    ExtendTime,
}

impl AnalysisOperation {
    /// Wire value sent in the `operation` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisOperation::Exit => "exit",
            AnalysisOperation::SaveAndExit => "save_and_exit",
            AnalysisOperation::ExtendTime => "extend_time",
        }
    }

    /// The stop operation matching the caller's choice about outputs.
    pub fn stop(save_outputs: bool) -> Self {
        if save_outputs {
            AnalysisOperation::SaveAndExit
        } else {
            AnalysisOperation::Exit
        }
    }
}

impl fmt::Display for AnalysisOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
