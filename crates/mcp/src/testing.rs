//! In-memory doubles for the API client and the browser opener.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use formation_api::{AppQuery, FormationApi, FormationError, Result};
use formation_types::{
    Analysis, AnalysisOperation, AnalysisStatus, App, AppParameters, CreateDirectoryResponse, DataEntry, LaunchResponse,
    LaunchSubmission, Metadata, Parameter, ParameterGroup,
};

use crate::workflow::{BrowserError, BrowserOpener};

/// A scripted status poll: a snapshot or an API failure `(status, body)`.
pub(crate) type ScriptedStatus = std::result::Result<AnalysisStatus, (u16, String)>;

/// Answers every call from fixed data and records what was asked.
pub(crate) struct ScriptedApi {
    apps: Vec<App>,
    parameters: AppParameters,
    launch: LaunchResponse,
    statuses: Mutex<VecDeque<ScriptedStatus>>,
    analyses: Vec<Analysis>,
    entry: Option<DataEntry>,
    failure: Option<(u16, String)>,
    calls: Mutex<Vec<String>>,
    submissions: Mutex<Vec<LaunchSubmission>>,
    uploads: Mutex<Vec<(String, Vec<u8>, Metadata)>>,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self {
            apps: Vec::new(),
            parameters: batch_parameters(),
            launch: LaunchResponse {
                analysis_id: "analysis-1".into(),
                name: "run-1".into(),
                status: "Submitted".into(),
                url: None,
            },
            statuses: Mutex::new(VecDeque::new()),
            analyses: Vec::new(),
            entry: None,
            failure: None,
            calls: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_apps(mut self, apps: Vec<App>) -> Self {
        self.apps = apps;
        self
    }

    pub(crate) fn with_parameters(mut self, parameters: AppParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Polls consume the script in order; the last entry repeats forever.
    pub(crate) fn with_statuses(self, statuses: Vec<ScriptedStatus>) -> Self {
        *self.statuses.lock().expect("statuses lock") = statuses.into();
        self
    }

    pub(crate) fn with_analyses(mut self, analyses: Vec<Analysis>) -> Self {
        self.analyses = analyses;
        self
    }

    pub(crate) fn with_entry(mut self, entry: DataEntry) -> Self {
        self.entry = Some(entry);
        self
    }

    /// Every call fails with an API error carrying `status` and `body`.
    pub(crate) fn failing_with(mut self, status: u16, body: &str) -> Self {
        self.failure = Some((status, body.to_string()));
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Number of recorded calls to the named operation.
    pub(crate) fn count(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.split_whitespace().next() == Some(operation))
            .count()
    }

    pub(crate) fn submissions(&self) -> Vec<LaunchSubmission> {
        self.submissions.lock().expect("submissions lock").clone()
    }

    pub(crate) fn uploads(&self) -> Vec<(String, Vec<u8>, Metadata)> {
        self.uploads.lock().expect("uploads lock").clone()
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().expect("calls lock").push(call);
        match &self.failure {
            Some((status, body)) => Err(FormationError::Api {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl FormationApi for ScriptedApi {
    async fn authenticate(&self) -> Result<()> {
        self.record("authenticate".into())
    }

    async fn list_apps(&self, query: &AppQuery) -> Result<Vec<App>> {
        self.record(format!(
            "list_apps name={} limit={} offset={}",
            query.name.as_deref().unwrap_or_default(),
            query.limit,
            query.offset
        ))?;
        Ok(self.apps.clone())
    }

    async fn get_app_parameters(&self, system_id: &str, app_id: &str) -> Result<AppParameters> {
        self.record(format!("get_app_parameters {system_id}/{app_id}"))?;
        Ok(self.parameters.clone())
    }

    async fn launch_app(&self, system_id: &str, app_id: &str, submission: &LaunchSubmission) -> Result<LaunchResponse> {
        self.record(format!("launch_app {system_id}/{app_id}"))?;
        self.submissions.lock().expect("submissions lock").push(submission.clone());
        Ok(self.launch.clone())
    }

    async fn get_analysis_status(&self, analysis_id: &str) -> Result<AnalysisStatus> {
        self.record(format!("get_analysis_status {analysis_id}"))?;
        let mut statuses = self.statuses.lock().expect("statuses lock");
        let next = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        match next {
            Some(Ok(status)) => Ok(status),
            Some(Err((status, body))) => Err(FormationError::Api { status, body }),
            None => Ok(snapshot("Submitted", None)),
        }
    }

    async fn list_analyses(&self, status: Option<&str>) -> Result<Vec<Analysis>> {
        self.record(format!("list_analyses status={}", status.unwrap_or_default()))?;
        Ok(self.analyses.clone())
    }

    async fn control_analysis(&self, analysis_id: &str, operation: AnalysisOperation, save_outputs: bool) -> Result<()> {
        self.record(format!("control_analysis {analysis_id} {operation} save_outputs={save_outputs}"))
    }

    async fn browse_data(&self, path: &str, offset: u32, limit: u32, include_metadata: bool) -> Result<DataEntry> {
        self.record(format!("browse_data {path} offset={offset} limit={limit} include_metadata={include_metadata}"))?;
        self.entry.clone().ok_or_else(|| FormationError::Api {
            status: 404,
            body: format!("{path} not found"),
        })
    }

    async fn create_directory(&self, path: &str, metadata: &Metadata) -> Result<CreateDirectoryResponse> {
        self.record(format!("create_directory {path} metadata={}", metadata.len()))?;
        Ok(CreateDirectoryResponse {
            path: path.to_string(),
            kind: "collection".into(),
        })
    }

    async fn upload_file(&self, path: &str, content: Vec<u8>, metadata: &Metadata) -> Result<()> {
        self.record(format!("upload_file {path}"))?;
        self.uploads
            .lock()
            .expect("uploads lock")
            .push((path.to_string(), content, metadata.clone()));
        Ok(())
    }

    async fn set_metadata(&self, path: &str, metadata: &Metadata, replace: bool) -> Result<()> {
        let pairs: Vec<String> = metadata.iter().map(|(key, value)| format!("{key}={value}")).collect();
        self.record(format!("set_metadata {path} {} replace={replace}", pairs.join(",")))
    }

    async fn delete_data(&self, path: &str, recurse: bool, dry_run: bool) -> Result<()> {
        self.record(format!("delete_data {path} recurse={recurse} dry_run={dry_run}"))
    }
}

/// Records URLs instead of opening them.
#[derive(Default)]
pub(crate) struct RecordingBrowser {
    opened: Mutex<Vec<String>>,
    unsupported: bool,
}

impl RecordingBrowser {
    pub(crate) fn unsupported() -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            unsupported: true,
        }
    }

    pub(crate) fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("opened lock").clone()
    }
}

impl BrowserOpener for RecordingBrowser {
    fn open(&self, url: &str) -> std::result::Result<(), BrowserError> {
        if self.unsupported {
            return Err(BrowserError::UnsupportedPlatform { os: "plan9" });
        }
        self.opened.lock().expect("opened lock").push(url.to_string());
        Ok(())
    }
}

fn parameter_group(parameters: Vec<Parameter>) -> ParameterGroup {
    ParameterGroup {
        id: "group-1".into(),
        name: "inputs".into(),
        label: "Inputs".into(),
        parameters,
    }
}

/// A batch app with one optional parameter.
pub(crate) fn batch_parameters() -> AppParameters {
    AppParameters {
        overall_job_type: "DE".into(),
        groups: vec![parameter_group(vec![Parameter {
            id: "threads".into(),
            name: "Threads".into(),
            label: "Threads".into(),
            description: "Worker threads".into(),
            required: false,
            parameter_type: "Integer".into(),
            default_value: Some(serde_json::json!(4)),
        }])],
    }
}

/// An interactive app with no required parameters.
pub(crate) fn interactive_parameters() -> AppParameters {
    AppParameters {
        overall_job_type: "Interactive".into(),
        groups: vec![parameter_group(Vec::new())],
    }
}

fn snapshot(status: &str, url: Option<&str>) -> AnalysisStatus {
    AnalysisStatus {
        analysis_id: "analysis-1".into(),
        status: status.into(),
        url_ready: url.is_some(),
        url: url.map(str::to_owned),
        url_check_details: None,
    }
}

/// A poll that finds the analysis in `status` without a usable URL.
pub(crate) fn pending(status: &str) -> ScriptedStatus {
    Ok(snapshot(status, None))
}

/// A poll that finds the analysis running with `url` reachable.
pub(crate) fn ready(url: &str) -> ScriptedStatus {
    Ok(snapshot("Running", Some(url)))
}
