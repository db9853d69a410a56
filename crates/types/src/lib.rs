//! Shared request and response shapes for the Formation platform API.
//!
//! Every type here is a transient value scoped to a single tool invocation;
//! nothing is cached or persisted. Field names follow the wire format of the
//! Formation REST API so the structs can be decoded directly from response
//! bodies.

mod analysis;
mod apps;
mod data;

pub use analysis::{Analysis, AnalysisListResponse, AnalysisOperation, AnalysisStatus};
pub use apps::{
    App, AppListResponse, AppParameters, LaunchConfig, LaunchResponse, LaunchSubmission, Parameter, ParameterGroup, is_interactive_job_type,
};
pub use data::{CreateDirectoryResponse, DataEntry, DirectoryContents, DirectoryEntry, EntryKind, FileContent, Metadata};

/// Token payload returned by `POST /login`.
///
/// The platform fronts a Keycloak realm, so the body carries more fields than
/// the client needs; only the access token and its lifetime are used.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub access_token: String,
    /// Token lifetime in seconds, relative to the moment it was issued.
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}
