//! Model Context Protocol server for the Formation platform.
//!
//! Exposes app discovery, launching, analysis control and data store
//! operations as MCP tools, backed by [`formation_api::FormationClient`].

pub mod config;
pub mod logging;
pub mod server;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, ConfigLayer, FormationConfig, LogLevel, load_config};
pub use logging::{LogFormat, init_logging};
pub use server::{FormationMcpCore, McpToolServices};
pub use workflow::{SystemBrowserOpener, Workflows};
