//! Error types for workflows.

use std::time::Duration;

use formation_api::FormationError;
use thiserror::Error;

use crate::workflow::launch::LaunchResult;

/// Ways a launch-and-wait can end without a usable result.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Api(#[from] FormationError),

    #[error("analysis {} failed with status: {status}", .partial.analysis_id)]
    Failed { status: String, partial: LaunchResult },

    #[error("timeout waiting for analysis {} to be ready after {}s (last status: {})", .partial.analysis_id, .waited.as_secs(), .partial.status)]
    TimedOut { waited: Duration, partial: LaunchResult },

    #[error("launch cancelled by the caller")]
    Cancelled { partial: Option<LaunchResult> },
}

impl WorkflowError {
    /// Whatever was known about the analysis when the workflow stopped.
    pub fn partial(&self) -> Option<&LaunchResult> {
        match self {
            Self::Failed { partial, .. } | Self::TimedOut { partial, .. } => Some(partial),
            Self::Cancelled { partial } => partial.as_ref(),
            Self::Api(_) => None,
        }
    }
}

/// Errors raised when handing a URL to the operating system.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("unsupported platform: {os}")]
    UnsupportedPlatform { os: &'static str },

    #[error("failed to run {command}: {source}")]
    Spawn {
        command: &'static str,
        #[source]
        source: std::io::Error,
    },
}
