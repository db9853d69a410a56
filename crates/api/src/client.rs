//! HTTP client for the Formation REST API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use formation_types::{
    Analysis, AnalysisListResponse, AnalysisOperation, AnalysisStatus, App, AppListResponse, AppParameters,
    CreateDirectoryResponse, DataEntry, DirectoryContents, FileContent, LaunchResponse, LaunchSubmission, LoginResponse, Metadata,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::auth::{Credentials, TokenState};
use crate::errors::{FormationError, Result};
use crate::metadata::{decode_metadata_headers, encode_metadata_headers};

/// Default page size for app searches.
pub const DEFAULT_APP_LIMIT: u32 = 10;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Filters for `GET /apps`.
///
/// Empty filters are not sent. `limit` and `offset` are always sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppQuery {
    pub name: Option<String>,
    pub integrator: Option<String>,
    pub description: Option<String>,
    pub job_type: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for AppQuery {
    fn default() -> Self {
        Self {
            name: None,
            integrator: None,
            description: None,
            job_type: None,
            limit: DEFAULT_APP_LIMIT,
            offset: 0,
        }
    }
}

impl AppQuery {
    fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let filters = [
            ("name", &self.name),
            ("integrator", &self.integrator),
            ("description", &self.description),
            ("job_type", &self.job_type),
        ];
        let mut pairs: Vec<(&'static str, String)> = filters
            .into_iter()
            .filter_map(|(key, value)| value.as_deref().filter(|value| !value.is_empty()).map(|value| (key, value.to_string())))
            .collect();
        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("offset", self.offset.to_string()));
        pairs
    }
}

/// Typed operations against the Formation platform.
///
/// Callers cancel an operation by dropping its future; no work continues in
/// the background afterwards.
#[async_trait]
pub trait FormationApi: Send + Sync {
    /// Log in with the configured credentials and store the issued token.
    async fn authenticate(&self) -> Result<()>;

    async fn list_apps(&self, query: &AppQuery) -> Result<Vec<App>>;

    async fn get_app_parameters(&self, system_id: &str, app_id: &str) -> Result<AppParameters>;

    async fn launch_app(&self, system_id: &str, app_id: &str, submission: &LaunchSubmission) -> Result<LaunchResponse>;

    async fn get_analysis_status(&self, analysis_id: &str) -> Result<AnalysisStatus>;

    /// `status` of `None` leaves the filter to the server default.
    async fn list_analyses(&self, status: Option<&str>) -> Result<Vec<Analysis>>;

    async fn control_analysis(&self, analysis_id: &str, operation: AnalysisOperation, save_outputs: bool) -> Result<()>;

    /// Read a directory listing or a file; zero `offset` or `limit` is not sent.
    async fn browse_data(&self, path: &str, offset: u32, limit: u32, include_metadata: bool) -> Result<DataEntry>;

    async fn create_directory(&self, path: &str, metadata: &Metadata) -> Result<CreateDirectoryResponse>;

    async fn upload_file(&self, path: &str, content: Vec<u8>, metadata: &Metadata) -> Result<()>;

    async fn set_metadata(&self, path: &str, metadata: &Metadata, replace: bool) -> Result<()>;

    async fn delete_data(&self, path: &str, recurse: bool, dry_run: bool) -> Result<()>;
}

/// Authenticated client for one Formation base URL.
///
/// The client holds at most one bearer token. Checking and refreshing it
/// happens under a single lock, so concurrent callers that find the token
/// stale wait for one login instead of each starting their own.
pub struct FormationClient {
    http: Client,
    base_url: Url,
    credentials: Option<Credentials>,
    token: Mutex<TokenState>,
}

impl std::fmt::Debug for FormationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormationClient")
            .field("base_url", &self.base_url.as_str())
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl FormationClient {
    /// Build a client for `base_url`.
    ///
    /// Either a static token or credentials must be present. When both are,
    /// the credentials take over as soon as the token needs checking.
    pub fn new(base_url: &str, token: Option<String>, credentials: Option<Credentials>) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        let token = TokenState::with_static_token(token);
        if token.token().is_none() && credentials.is_none() {
            return Err(FormationError::configuration(
                "either a token or a username and password must be provided",
            ));
        }

        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url,
            credentials,
            token: Mutex::new(token),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Return a usable bearer token, logging in first when the held token is
    /// stale and credentials are available.
    ///
    /// A stale token with no credentials is returned as-is; the platform
    /// rejects it with 401 if it has really expired.
    pub async fn ensure_token(&self) -> Result<String> {
        let mut state = self.token.lock().await;
        if !state.is_fresh() && self.credentials.is_some() {
            self.login(&mut state).await?;
        }
        state
            .token()
            .map(str::to_owned)
            .ok_or_else(|| FormationError::configuration("no token or credentials available"))
    }

    async fn login(&self, state: &mut TokenState) -> Result<()> {
        let Some(credentials) = &self.credentials else {
            return Err(FormationError::configuration("username and password are required to log in"));
        };

        let url = self.endpoint(&["login"])?;
        let started = Instant::now();
        let response = self
            .http
            .post(url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await?;
        let status = response.status();
        info!(
            username = %credentials.username,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "login"
        );

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(FormationError::Authentication {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let login: LoginResponse =
            serde_json::from_slice(&bytes).map_err(|source| FormationError::Decode { what: "login response", source })?;
        state.replace(login.access_token, Duration::from_secs(login.expires_in));
        Ok(())
    }

    /// Resolve API path segments against the base URL, percent-encoding each.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FormationError::configuration("base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Data store paths always live under the `data` root, whatever the
    /// caller's leading slashes. Dot segments are refused; URL resolution
    /// would otherwise collapse them into a different path.
    fn data_endpoint(&self, path: &str) -> Result<Url> {
        let trimmed = path.trim_start_matches('/');
        if trimmed.split('/').any(|segment| matches!(segment, "." | "..")) {
            return Err(FormationError::InvalidPath { path: path.to_string() });
        }
        let mut segments = vec!["data"];
        segments.extend(trimmed.split('/'));
        self.endpoint(&segments)
    }

    /// Attach the bearer token, send, and convert statuses >= 400 into errors.
    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let token = self.ensure_token().await?;
        let request = builder.bearer_auth(token).build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let started = Instant::now();
        let response = self.http.execute(request).await?;
        let status = response.status();
        debug!(
            %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "api_call"
        );

        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(FormationError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &'static str) -> Result<T> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| FormationError::Decode { what, source })
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url)
    }
}

#[async_trait]
impl FormationApi for FormationClient {
    async fn authenticate(&self) -> Result<()> {
        let mut state = self.token.lock().await;
        self.login(&mut state).await
    }

    async fn list_apps(&self, query: &AppQuery) -> Result<Vec<App>> {
        let url = self.endpoint(&["apps"])?;
        let builder = self.request(Method::GET, url).query(&query.to_pairs());
        let response: AppListResponse = self.send_json(builder, "app list").await?;
        Ok(response.apps)
    }

    async fn get_app_parameters(&self, system_id: &str, app_id: &str) -> Result<AppParameters> {
        let url = self.endpoint(&["apps", system_id, app_id, "parameters"])?;
        self.send_json(self.request(Method::GET, url), "app parameters").await
    }

    async fn launch_app(&self, system_id: &str, app_id: &str, submission: &LaunchSubmission) -> Result<LaunchResponse> {
        let url = self.endpoint(&["app", "launch", system_id, app_id])?;
        self.send_json(self.request(Method::POST, url).json(submission), "launch response")
            .await
    }

    async fn get_analysis_status(&self, analysis_id: &str) -> Result<AnalysisStatus> {
        let url = self.endpoint(&["apps", "analyses", analysis_id, "status"])?;
        self.send_json(self.request(Method::GET, url), "analysis status").await
    }

    async fn list_analyses(&self, status: Option<&str>) -> Result<Vec<Analysis>> {
        // Trailing empty segment keeps the collection slash: /apps/analyses/
        let url = self.endpoint(&["apps", "analyses", ""])?;
        let mut builder = self.request(Method::GET, url);
        if let Some(status) = status.filter(|status| !status.is_empty()) {
            builder = builder.query(&[("status", status)]);
        }
        let response: AnalysisListResponse = self.send_json(builder, "analysis list").await?;
        Ok(response.analyses)
    }

    async fn control_analysis(&self, analysis_id: &str, operation: AnalysisOperation, save_outputs: bool) -> Result<()> {
        let url = self.endpoint(&["apps", "analyses", analysis_id, "control"])?;
        let builder = self
            .request(Method::POST, url)
            .query(&[("operation", operation.as_str()), ("save_outputs", if save_outputs { "true" } else { "false" })]);
        self.send(builder).await?;
        Ok(())
    }

    async fn browse_data(&self, path: &str, offset: u32, limit: u32, include_metadata: bool) -> Result<DataEntry> {
        let url = self.data_endpoint(path)?;
        let mut query: Vec<(&str, String)> = Vec::new();
        if offset > 0 {
            query.push(("offset", offset.to_string()));
        }
        if limit > 0 {
            query.push(("limit", limit.to_string()));
        }
        if include_metadata {
            query.push(("include_metadata", "true".to_string()));
        }

        let response = self.send(self.request(Method::GET, url).query(&query)).await?;
        let is_listing = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|content_type| content_type.contains("application/json"));
        let metadata = if include_metadata {
            decode_metadata_headers(response.headers())
        } else {
            Metadata::new()
        };
        let bytes = response.bytes().await?;

        if is_listing {
            let mut listing: DirectoryContents =
                serde_json::from_slice(&bytes).map_err(|source| FormationError::Decode { what: "directory listing", source })?;
            listing.metadata = metadata;
            return Ok(DataEntry::Directory(listing));
        }

        Ok(DataEntry::File(FileContent {
            path: path.to_string(),
            content: bytes.to_vec(),
            metadata,
        }))
    }

    async fn create_directory(&self, path: &str, metadata: &Metadata) -> Result<CreateDirectoryResponse> {
        let url = self.data_endpoint(path)?;
        let builder = self
            .request(Method::PUT, url)
            .query(&[("resource_type", "directory")])
            .headers(encode_metadata_headers(metadata)?);
        self.send_json(builder, "create directory response").await
    }

    async fn upload_file(&self, path: &str, content: Vec<u8>, metadata: &Metadata) -> Result<()> {
        let url = self.data_endpoint(path)?;
        let builder = self
            .request(Method::PUT, url)
            .headers(encode_metadata_headers(metadata)?)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(content);
        self.send(builder).await?;
        Ok(())
    }

    async fn set_metadata(&self, path: &str, metadata: &Metadata, replace: bool) -> Result<()> {
        let url = self.data_endpoint(path)?;
        let mut builder = self.request(Method::PUT, url).headers(encode_metadata_headers(metadata)?);
        if replace {
            builder = builder.query(&[("replace_metadata", "true")]);
        }
        self.send(builder).await?;
        Ok(())
    }

    async fn delete_data(&self, path: &str, recurse: bool, dry_run: bool) -> Result<()> {
        let url = self.data_endpoint(path)?;
        let flags = [("recurse", recurse), ("dry_run", dry_run)];
        let query: Vec<(&str, &str)> = flags
            .into_iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(key, _)| (key, "true"))
            .collect();
        self.send(self.request(Method::DELETE, url).query(&query)).await?;
        Ok(())
    }
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    let parsed = Url::parse(base_url.trim())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
        return Err(FormationError::configuration(format!(
            "base URL must be an http or https URL; got '{base_url}'"
        )));
    }
    Ok(parsed)
}
