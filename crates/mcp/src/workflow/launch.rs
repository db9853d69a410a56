//! Launch an app and, for interactive apps, wait until its URL is reachable.

use std::sync::Arc;
use std::time::Duration;

use formation_api::{FormationApi, FormationError};
use formation_types::{AnalysisOperation, AppParameters, LaunchConfig, LaunchSubmission};
use serde::Serialize;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::workflow::errors::WorkflowError;

/// Seconds a launch waits for an interactive URL unless told otherwise.
pub const DEFAULT_MAX_WAIT_SECS: u64 = 300;

/// Upper bound on the interval between status polls.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(3600);

/// Everything needed to launch one analysis.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub app_id: String,
    pub system_id: String,
    /// Left to the server when absent.
    pub name: Option<String>,
    pub config: LaunchConfig,
    pub max_wait: Duration,
    pub debug: Option<bool>,
    pub notify: Option<bool>,
    pub output_dir: Option<String>,
}

/// What is known about a launched analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchResult {
    pub analysis_id: String,
    pub name: String,
    pub status: String,
    /// Only set once the server reports the URL reachable.
    pub url: Option<String>,
    pub interactive: bool,
}

/// Successful ends of a launch-and-wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Required parameters were absent from the config; nothing was launched.
    ParamsMissing { missing: Vec<String> },
    /// A batch job was submitted. There is nothing to wait for.
    Launched(LaunchResult),
    /// An interactive job is up and its URL is reachable.
    Ready(LaunchResult),
}

/// Names of required parameters whose ids are absent from `config`, in
/// catalog order.
pub fn missing_required_parameters(parameters: &AppParameters, config: &LaunchConfig) -> Vec<String> {
    parameters
        .parameters()
        .filter(|parameter| parameter.required && !config.contains_key(&parameter.id))
        .map(|parameter| parameter.display_name().to_string())
        .collect()
}

/// Multi-step operations built on top of the API client.
pub struct Workflows {
    api: Arc<dyn FormationApi>,
    poll_interval: Duration,
}

impl Workflows {
    /// `poll_interval` is clamped to `1ms..=MAX_POLL_INTERVAL`.
    pub fn new(api: Arc<dyn FormationApi>, poll_interval: Duration) -> Self {
        let poll_interval = poll_interval.clamp(Duration::from_millis(1), MAX_POLL_INTERVAL);
        Self { api, poll_interval }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Launch an app and wait for it to become usable.
    ///
    /// Batch apps return right after submission. Interactive apps are polled
    /// every poll interval until their URL is ready, they fail, `max_wait`
    /// passes, or `cancel` fires. A poll that errors is logged and retried on
    /// the next tick.
    pub async fn launch_and_wait(&self, request: LaunchRequest, cancel: &CancellationToken) -> Result<LaunchOutcome, WorkflowError> {
        let parameters = cancel
            .run_until_cancelled(self.api.get_app_parameters(&request.system_id, &request.app_id))
            .await
            .ok_or(WorkflowError::Cancelled { partial: None })??;

        let missing = missing_required_parameters(&parameters, &request.config);
        if !missing.is_empty() {
            info!(app_id = %request.app_id, missing = ?missing, "launch skipped: required parameters missing");
            return Ok(LaunchOutcome::ParamsMissing { missing });
        }

        let interactive = parameters.is_interactive();
        let submission = LaunchSubmission {
            name: request.name.clone().filter(|name| !name.is_empty()),
            config: request.config.clone(),
            debug: request.debug,
            notify: request.notify,
            output_dir: request.output_dir.clone().filter(|dir| !dir.is_empty()),
            ..Default::default()
        };

        info!(app_id = %request.app_id, system_id = %request.system_id, interactive, "launching app");
        let launched = cancel
            .run_until_cancelled(self.api.launch_app(&request.system_id, &request.app_id, &submission))
            .await
            .ok_or(WorkflowError::Cancelled { partial: None })??;
        let launched_at = Instant::now();

        let result = LaunchResult {
            analysis_id: launched.analysis_id,
            name: launched.name,
            status: launched.status,
            url: None,
            interactive,
        };

        if !interactive {
            info!(analysis_id = %result.analysis_id, "batch job launched");
            return Ok(LaunchOutcome::Launched(result));
        }

        info!(
            analysis_id = %result.analysis_id,
            max_wait_secs = request.max_wait.as_secs(),
            "waiting for interactive app to be ready"
        );
        self.wait_until_ready(result, launched_at, request.max_wait, cancel)
            .await
            .map(LaunchOutcome::Ready)
    }

    async fn wait_until_ready(
        &self,
        mut current: LaunchResult,
        launched_at: Instant,
        max_wait: Duration,
        cancel: &CancellationToken,
    ) -> Result<LaunchResult, WorkflowError> {
        let analysis_id = current.analysis_id.clone();
        // A wait too long to represent never expires.
        let deadline = launched_at.checked_add(max_wait);
        let mut ticker = interval_at(launched_at + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WorkflowError::Cancelled { partial: Some(current) }),
                _ = ticker.tick() => {}
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(WorkflowError::TimedOut {
                    waited: launched_at.elapsed(),
                    partial: current,
                });
            }

            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WorkflowError::Cancelled { partial: Some(current) }),
                polled = self.api.get_analysis_status(&analysis_id) => polled,
            };

            let snapshot = match polled {
                Ok(snapshot) => snapshot,
                Err(error) => {
                    warn!(analysis_id = %analysis_id, error = %error, "failed to get analysis status");
                    continue;
                }
            };

            debug!(
                analysis_id = %current.analysis_id,
                status = %snapshot.status,
                url_ready = snapshot.url_ready,
                "analysis status"
            );
            current.status = snapshot.status.clone();
            current.url = snapshot.ready_url().map(str::to_owned);

            if let Some(url) = &current.url {
                info!(analysis_id = %current.analysis_id, url = %url, "interactive app ready");
                return Ok(current);
            }
            if snapshot.is_terminal_failure() {
                return Err(WorkflowError::Failed {
                    status: snapshot.status,
                    partial: current,
                });
            }
        }
    }

    /// Stop an analysis, saving its outputs first when asked.
    pub async fn stop_analysis(&self, analysis_id: &str, save_outputs: bool) -> Result<AnalysisOperation, FormationError> {
        let operation = AnalysisOperation::stop(save_outputs);
        info!(analysis_id, operation = %operation, "stopping analysis");
        self.api.control_analysis(analysis_id, operation, save_outputs).await?;
        Ok(operation)
    }
}
