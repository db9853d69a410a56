use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use formation_api::FormationClient;
use formation_mcp::{
    ConfigLayer, FormationConfig, FormationMcpCore, LogFormat, McpToolServices, SystemBrowserOpener, init_logging, load_config,
};
use rmcp::ServiceExt;
use tracing::info;

/// Serve Formation platform tools to an MCP client over stdio.
#[derive(Debug, Parser)]
#[command(name = "formation-mcp", version, about)]
struct Args {
    /// YAML config file (default: ~/.formation-mcp.yaml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Platform API base URL
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Bearer token to use instead of logging in
    #[arg(long)]
    token: Option<String>,

    #[arg(long)]
    username: Option<String>,

    #[arg(long)]
    password: Option<String>,

    /// debug, info, warn or error
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Seconds between status polls while waiting for an app
    #[arg(long, value_name = "SECONDS")]
    poll_interval: Option<u64>,
}

impl Args {
    fn flag_layer(&self) -> ConfigLayer {
        ConfigLayer {
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            log_level: self.log_level.clone(),
            log_json: self.log_json.then_some(true),
            poll_interval: self.poll_interval,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(args.flag_layer(), args.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Configuration error: {error}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.log_level, LogFormat::from_json_flag(config.log_json));

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: FormationConfig) -> Result<()> {
    let client = FormationClient::new(config.base_url.as_str(), config.token.clone(), config.credentials.clone())
        .context("failed to create API client")?;
    let services = McpToolServices::new(Arc::new(client), config.poll_interval, Arc::new(SystemBrowserOpener));
    let core = FormationMcpCore::new(Arc::new(services));

    info!(
        base_url = %config.base_url,
        poll_interval_secs = config.poll_interval.as_secs(),
        version = env!("CARGO_PKG_VERSION"),
        "starting formation-mcp on stdio"
    );
    let running = core
        .serve(rmcp::transport::stdio())
        .await
        .context("failed to start MCP server")?;
    running.waiting().await.context("MCP server stopped unexpectedly")?;
    info!("client disconnected, shutting down");
    Ok(())
}
