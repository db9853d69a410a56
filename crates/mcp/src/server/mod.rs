//! The MCP tool server: request schemas, handlers, markdown rendering and
//! structured errors.

mod core;
mod errors;
mod render;
mod schemas;

pub use core::{FormationMcpCore, McpToolServices};
pub use schemas::metadata_from_arguments;
