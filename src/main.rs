/// MCP Server Entry Point
///
/// Reads server settings from the environment, loads tool configuration,
/// builds the tool registry, and starts the selected transport(s).
///
/// Environment Variables:
/// - SERVER_NAME: Name of the server (default: "savings-mcp-server")
/// - SERVER_VERSION: Version string (default: crate version)
/// - MCP_TRANSPORT_MODE: "stdio", "http", or "both" (default: "both")
/// - HOST: Bind address for HTTP mode (default: "0.0.0.0")
/// - PORT: Port number for HTTP mode (default: 3000)
/// - WORKER_THREADS: HTTP worker count (default: CPU count, max 16)
/// - MCP_CONFIG: YAML config file (default: "kmcp.yaml")
/// - EXCHANGE_API_BASE_URL / EXCHANGE_API_PORT: currency-exchange API location
/// - RUST_LOG / LOG_FORMAT: log filter and format ("text" or "json")

use std::sync::Arc;
use tracing::{error, info};

use savings_mcp_server::core::error::ServerError;
use savings_mcp_server::core::server::{self, AppState, McpServer};
use savings_mcp_server::core::shutdown::ShutdownCoordinator;
use savings_mcp_server::core::utils::{self, ServerSettings, TransportMode};
use savings_mcp_server::tools;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    utils::init_logging();

    let settings = ServerSettings::from_env()?;
    let config = utils::load_config(&settings.config_path)?;
    let registry = tools::build_registry(&config, |key| std::env::var(key).ok())?;

    let shutdown = ShutdownCoordinator::new();
    let server = Arc::new(McpServer::new(
        AppState {
            server_name: settings.name.clone(),
            server_version: settings.version.clone(),
        },
        registry,
        shutdown.subscribe(),
    ));

    let signals = shutdown.clone();
    tokio::spawn(async move { signals.wait_for_shutdown_signal().await });

    let workers = settings.worker_count();
    match settings.transport {
        TransportMode::Stdio => server::run_server_stdio(server).await?,
        TransportMode::Http => {
            server::run_server_http(server, settings.host, settings.port, workers).await?
        }
        TransportMode::Both => {
            // STDIO in the background so MCP Inspector and HTTP clients can
            // both connect
            let stdio_server = server.clone();
            let stdio_handle = tokio::spawn(async move {
                if let Err(e) = server::run_server_stdio(stdio_server).await {
                    error!("STDIO server error: {}", e);
                }
            });

            let http_result = server::run_server_http(server, settings.host, settings.port, workers).await;

            // HTTP stopped, take in-flight tool calls and STDIO down with it
            shutdown.initiate_shutdown();
            stdio_handle.abort();
            http_result?
        }
    }

    info!("MCP server stopped");
    Ok(())
}
