use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use formation_api::{AppQuery, FormationApi, FormationError};
use formation_types::DataEntry;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ErrorData, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo};
use rmcp::{RoleServer, ServerHandler, service::RequestContext, tool, tool_handler, tool_router};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::server::errors::{
    api_error, browser_error, cancelled_error, invalid_params_error, missing_parameters_error, workflow_error,
};
use crate::server::render;
use crate::server::schemas::{
    AnalysisStatusRequest, BrowseDataRequest, CreateDirectoryRequest, DeleteDataRequest, GetAppParametersRequest,
    LaunchAppRequest, ListAnalysesRequest, ListAppsRequest, OpenInBrowserRequest, SetMetadataRequest, StopAnalysisRequest,
    UploadFileRequest, metadata_from_arguments,
};
use crate::workflow::{BrowserOpener, LaunchOutcome, LaunchRequest, Workflows};

/// Shared services for MCP tool handlers.
pub struct McpToolServices {
    api: Arc<dyn FormationApi>,
    workflows: Workflows,
    browser: Arc<dyn BrowserOpener>,
}

impl McpToolServices {
    /// Create services around one API client, polling launches every
    /// `poll_interval`.
    pub fn new(api: Arc<dyn FormationApi>, poll_interval: Duration, browser: Arc<dyn BrowserOpener>) -> Self {
        let workflows = Workflows::new(Arc::clone(&api), poll_interval);
        Self { api, workflows, browser }
    }

    async fn list_apps(&self, request: ListAppsRequest, cancel: &CancellationToken) -> Result<String, ErrorData> {
        let query = AppQuery {
            name: non_empty(request.name),
            integrator: non_empty(request.integrator),
            description: non_empty(request.description),
            job_type: non_empty(request.job_type),
            limit: request.limit,
            offset: request.offset,
        };
        let apps = call("list_apps", cancel, self.api.list_apps(&query)).await?;
        Ok(render::render_apps(&apps))
    }

    async fn get_app_parameters(&self, request: GetAppParametersRequest, cancel: &CancellationToken) -> Result<String, ErrorData> {
        let parameters = call(
            "get_app_parameters",
            cancel,
            self.api.get_app_parameters(&request.system_id, &request.app_id),
        )
        .await?;
        Ok(render::render_app_parameters(&parameters))
    }

    async fn launch_app_and_wait(&self, request: LaunchAppRequest, cancel: &CancellationToken) -> Result<String, ErrorData> {
        let app_id = request.app_id.clone();
        let launch = LaunchRequest {
            app_id: request.app_id,
            system_id: request.system_id,
            name: request.name,
            config: request.config,
            max_wait: Duration::from_secs(request.max_wait),
            debug: request.debug,
            notify: request.notify,
            output_dir: request.output_dir,
        };

        match self.workflows.launch_and_wait(launch, cancel).await {
            Ok(LaunchOutcome::ParamsMissing { missing }) => Err(missing_parameters_error(&app_id, &missing)),
            Ok(LaunchOutcome::Launched(result) | LaunchOutcome::Ready(result)) => Ok(render::render_launch(&result)),
            Err(error) => {
                warn!(app_id = %app_id, error = %error, "launch_app_and_wait failed");
                Err(workflow_error(&error))
            }
        }
    }

    async fn get_analysis_status(&self, request: AnalysisStatusRequest, cancel: &CancellationToken) -> Result<String, ErrorData> {
        let status = call(
            "get_analysis_status",
            cancel,
            self.api.get_analysis_status(&request.analysis_id),
        )
        .await?;
        Ok(render::render_analysis_status(&status))
    }

    async fn list_running_analyses(&self, request: ListAnalysesRequest, cancel: &CancellationToken) -> Result<String, ErrorData> {
        let filter = Some(request.status.trim()).filter(|status| !status.is_empty());
        let analyses = call("list_running_analyses", cancel, self.api.list_analyses(filter)).await?;
        Ok(render::render_analyses(filter.unwrap_or("All"), &analyses))
    }

    async fn stop_analysis(&self, request: StopAnalysisRequest, cancel: &CancellationToken) -> Result<String, ErrorData> {
        call(
            "stop_analysis",
            cancel,
            self.workflows.stop_analysis(&request.analysis_id, request.save_outputs),
        )
        .await?;
        Ok(render::render_stopped(&request.analysis_id, request.save_outputs))
    }

    fn open_in_browser(&self, request: OpenInBrowserRequest) -> Result<String, ErrorData> {
        let url = request.url.trim();
        if url.is_empty() {
            return Err(invalid_params_error(
                "BROWSER_URL_MISSING",
                "url must not be empty",
                json!({ "tool": "open_in_browser" }),
                "Pass the URL returned by launch_app_and_wait.",
            ));
        }
        self.browser.open(url).map_err(|error| {
            warn!(url, error = %error, "open_in_browser failed");
            browser_error(url, &error)
        })?;
        Ok(render::render_opened(url))
    }

    async fn browse_data(&self, request: BrowseDataRequest, cancel: &CancellationToken) -> Result<String, ErrorData> {
        let entry = call(
            "browse_data",
            cancel,
            self.api
                .browse_data(&request.path, request.offset, request.limit, request.include_metadata),
        )
        .await?;
        Ok(match entry {
            DataEntry::Directory(listing) => render::render_directory(&listing),
            DataEntry::File(file) => render::render_file(&file),
        })
    }

    async fn create_directory(&self, request: CreateDirectoryRequest, cancel: &CancellationToken) -> Result<String, ErrorData> {
        let metadata = metadata_from_arguments(&request.metadata);
        let created = call(
            "create_directory",
            cancel,
            self.api.create_directory(&request.path, &metadata),
        )
        .await?;
        let path = if created.path.is_empty() { request.path } else { created.path };
        Ok(render::render_created_directory(&path))
    }

    async fn upload_file(&self, request: UploadFileRequest, cancel: &CancellationToken) -> Result<String, ErrorData> {
        let metadata = metadata_from_arguments(&request.metadata);
        let content = request.content.into_bytes();
        let size = content.len();
        call(
            "upload_file",
            cancel,
            self.api.upload_file(&request.path, content, &metadata),
        )
        .await?;
        Ok(render::render_uploaded(&request.path, size))
    }

    async fn set_metadata(&self, request: SetMetadataRequest, cancel: &CancellationToken) -> Result<String, ErrorData> {
        let metadata = metadata_from_arguments(&request.metadata);
        call(
            "set_metadata",
            cancel,
            self.api.set_metadata(&request.path, &metadata, request.replace),
        )
        .await?;
        Ok(render::render_metadata_set(&request.path, request.replace))
    }

    async fn delete_data(&self, request: DeleteDataRequest, cancel: &CancellationToken) -> Result<String, ErrorData> {
        call(
            "delete_data",
            cancel,
            self.api.delete_data(&request.path, request.recurse, request.dry_run),
        )
        .await?;
        Ok(render::render_deleted(&request.path, request.dry_run))
    }
}

/// Run one API call for `tool`, abandoning it if the caller cancels.
async fn call<T>(
    tool: &'static str,
    cancel: &CancellationToken,
    future: impl Future<Output = Result<T, FormationError>>,
) -> Result<T, ErrorData> {
    match cancel.run_until_cancelled(future).await {
        Some(Ok(value)) => Ok(value),
        Some(Err(error)) => {
            warn!(tool, error = %error, "tool call failed");
            Err(api_error(tool, &error))
        }
        None => Err(cancelled_error(tool, None)),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn text_result(text: Result<String, ErrorData>) -> Result<CallToolResult, ErrorData> {
    text.map(|text| CallToolResult::success(vec![Content::text(text)]))
}

#[derive(Clone)]
pub struct FormationMcpCore {
    tool_router: ToolRouter<Self>,
    services: Arc<McpToolServices>,
}

#[tool_router]
impl FormationMcpCore {
    pub fn new(services: Arc<McpToolServices>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            services,
        }
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "Search the app catalog. Optional filters: name, integrator, description, job_type (Interactive, DE, OSG, Tapis). Use limit and offset to page (default 10 apps). Returns each app's id and system_id for get_app_parameters and launch_app_and_wait."
    )]
    async fn list_apps(&self, param: Parameters<ListAppsRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        info!(tool = "list_apps", "tool called");
        text_result(self.services.list_apps(param.0, &context.ct).await)
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "Describe the parameters an app accepts, grouped as in the catalog, with required markers, types and defaults. Use the parameter ids as keys in launch_app_and_wait's config."
    )]
    async fn get_app_parameters(
        &self,
        param: Parameters<GetAppParametersRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        info!(tool = "get_app_parameters", app_id = %param.0.app_id, "tool called");
        text_result(self.services.get_app_parameters(param.0, &context.ct).await)
    }

    #[tool(
        description = "Launch an app. Batch apps return once submitted. Interactive apps are polled until their URL is reachable, they fail, or max_wait seconds pass (default 300). Fails without launching when a required parameter is missing from config."
    )]
    async fn launch_app_and_wait(
        &self,
        param: Parameters<LaunchAppRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        info!(tool = "launch_app_and_wait", app_id = %param.0.app_id, "tool called");
        text_result(self.services.launch_app_and_wait(param.0, &context.ct).await)
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "Report an analysis's status and whether its URL is ready."
    )]
    async fn get_analysis_status(
        &self,
        param: Parameters<AnalysisStatusRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        info!(tool = "get_analysis_status", analysis_id = %param.0.analysis_id, "tool called");
        text_result(self.services.get_analysis_status(param.0, &context.ct).await)
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "List your analyses with a given status (default Running)."
    )]
    async fn list_running_analyses(
        &self,
        param: Parameters<ListAnalysesRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        info!(tool = "list_running_analyses", status = %param.0.status, "tool called");
        text_result(self.services.list_running_analyses(param.0, &context.ct).await)
    }

    #[tool(
        annotations(destructive_hint = true),
        description = "Stop a running analysis. Outputs are saved first unless save_outputs is false."
    )]
    async fn stop_analysis(&self, param: Parameters<StopAnalysisRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        info!(tool = "stop_analysis", analysis_id = %param.0.analysis_id, "tool called");
        text_result(self.services.stop_analysis(param.0, &context.ct).await)
    }

    #[tool(description = "Open a URL, such as an interactive app's address, in the user's default browser.")]
    async fn open_in_browser(&self, param: Parameters<OpenInBrowserRequest>) -> Result<CallToolResult, ErrorData> {
        info!(tool = "open_in_browser", "tool called");
        text_result(self.services.open_in_browser(param.0))
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "List a data store directory (directories first, then files) or read a file's content. Use offset and limit to page directories (default 100 entries). Set include_metadata to show the path's attributes."
    )]
    async fn browse_data(&self, param: Parameters<BrowseDataRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        info!(tool = "browse_data", path = %param.0.path, "tool called");
        text_result(self.services.browse_data(param.0, &context.ct).await)
    }

    #[tool(description = "Create a directory in the data store, optionally with metadata attributes.")]
    async fn create_directory(
        &self,
        param: Parameters<CreateDirectoryRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        info!(tool = "create_directory", path = %param.0.path, "tool called");
        text_result(self.services.create_directory(param.0, &context.ct).await)
    }

    #[tool(description = "Upload text content as a file in the data store, optionally with metadata attributes.")]
    async fn upload_file(&self, param: Parameters<UploadFileRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        info!(tool = "upload_file", path = %param.0.path, bytes = param.0.content.len(), "tool called");
        text_result(self.services.upload_file(param.0, &context.ct).await)
    }

    #[tool(description = "Add metadata attributes to a file or directory, or replace all of them when replace is true.")]
    async fn set_metadata(&self, param: Parameters<SetMetadataRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        info!(tool = "set_metadata", path = %param.0.path, replace = param.0.replace, "tool called");
        text_result(self.services.set_metadata(param.0, &context.ct).await)
    }

    #[tool(
        annotations(destructive_hint = true),
        description = "Delete a file or directory. Directories need recurse=true. Use dry_run=true to check what would be deleted."
    )]
    async fn delete_data(&self, param: Parameters<DeleteDataRequest>, context: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        info!(tool = "delete_data", path = %param.0.path, dry_run = param.0.dry_run, "tool called");
        text_result(self.services.delete_data(param.0, &context.ct).await)
    }
}

#[tool_handler]
impl ServerHandler for FormationMcpCore {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: "formation-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Formation MCP".to_string()),
                ..Default::default()
            },
            instructions: Some(
                "Formation platform tools.\nAPPS:\n1) list_apps to find an app id and system_id.\n2) get_app_parameters to learn required parameter ids.\n3) launch_app_and_wait with config keyed by parameter id.\n4) open_in_browser with the returned URL for interactive apps.\nANALYSES:\n- get_analysis_status, list_running_analyses, stop_analysis.\nDATA STORE:\n- browse_data to list directories or read files.\n- create_directory, upload_file, set_metadata, delete_data (dry_run first).".to_string(),
            ),
        }
    }
}
