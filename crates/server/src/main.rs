//! `powerpoint-mcp`: PowerPoint tools for MCP clients over stdio.

use anyhow::{Context, Result};
use clap::Parser;
use ppt_mcp_server::{
    select_adapter, BackendPreference, HostOs, McpServer, ServerConfig, StdioTransport,
    SystemBackends, ToolRouter,
};

/// Serve PowerPoint editing tools over the Model Context Protocol (stdio).
#[derive(Parser, Debug)]
#[command(name = "powerpoint-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend to use: auto, live (running PowerPoint) or pptx (file format)
    #[arg(long, value_enum, env = "PPT_MCP_BACKEND", default_value = "auto")]
    backend: BackendPreference,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Log filter in env_logger syntax, overrides --verbose
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries protocol messages only.
    let default_filter = if args.verbose { "debug" } else { "warn" };
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    if let Some(filter) = &args.log_level {
        logger.parse_filters(filter);
    }
    logger.target(env_logger::Target::Stderr).init();

    let config = ServerConfig::new(args.backend);
    log::debug!("Backend preference: {}", config.backend);

    let adapter = select_adapter(HostOs::current(), config.backend, &SystemBackends);
    log::info!("Selected {}", adapter.kind());

    let mut server = McpServer::new(StdioTransport::stdio(), ToolRouter::new(adapter, config));
    server.run().context("MCP stdio transport failed")?;

    Ok(())
}
