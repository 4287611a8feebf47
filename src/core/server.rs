/// MCP Server Implementation
///
/// This module contains the core MCP server implementation including:
/// - JSON-RPC 2.0 request/response structures
/// - The dispatcher shared by both transports
/// - HTTP server setup with Actix Web
/// - STDIO server implementation for line-based communication

use actix_web::{
    App, HttpResponse, HttpServer,
    middleware::{Compress, DefaultHeaders, Logger},
    web,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, error, info, warn};

use crate::core::error::ToolError;
use crate::core::registry::{CancelSignal, ToolRegistry, cancelled};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

/// Server metadata reported in MCP initialize responses.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server name reported to clients
    pub server_name: String,
    /// Server version reported to clients
    pub server_version: String,
}

/// JSON-RPC 2.0 request structure for MCP protocol.
///
/// `id` is `None` for notifications, which never get a response.
#[derive(Deserialize, Debug)]
pub struct MCPRequest {
    /// JSON-RPC version (should be "2.0")
    #[allow(dead_code)]
    jsonrpc: String,
    /// Request ID, absent for notifications
    id: Option<Value>,
    /// Method name (e.g., "initialize", "tools/list", "tools/call")
    method: String,
    /// Method parameters (optional)
    params: Option<Value>,
}

/// JSON-RPC 2.0 response structure for MCP protocol.
#[derive(Serialize, Debug)]
pub struct MCPResponse {
    /// JSON-RPC version (always "2.0")
    jsonrpc: &'static str,
    /// Request ID matching the original request, `null` if it was unreadable
    id: Option<Value>,
    /// Success result (mutually exclusive with error)
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    /// Error information (mutually exclusive with result)
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<MCPError>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Serialize, Debug)]
pub struct MCPError {
    /// Error code (JSON-RPC standard codes)
    code: i32,
    /// Human-readable error message
    message: String,
    /// Additional error data (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl MCPResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(MCPError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// MCP `tools/call` parameters.
#[derive(Deserialize, Debug)]
struct ToolCallParams {
    /// Name of the tool to call
    name: String,
    /// Tool arguments, an empty object when omitted
    #[serde(default)]
    arguments: Option<Value>,
}

/// Protocol dispatcher shared by the HTTP and STDIO transports.
pub struct McpServer {
    state: AppState,
    registry: Arc<ToolRegistry>,
    shutdown: CancelSignal,
    requests_total: AtomicU64,
}

impl McpServer {
    /// Create a dispatcher.
    ///
    /// # Arguments
    /// * `state` - Server metadata for `initialize`
    /// * `registry` - Tools served through `tools/list` and `tools/call`
    /// * `shutdown` - Signal handed to every tool call so it can stop early
    pub fn new(state: AppState, registry: Arc<ToolRegistry>, shutdown: CancelSignal) -> Self {
        Self {
            state,
            registry,
            shutdown,
            requests_total: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Number of JSON-RPC messages handled since start.
    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    /// Handle one JSON-RPC message. Returns `None` for notifications.
    pub async fn handle(&self, req: MCPRequest) -> Option<MCPResponse> {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        let Some(id) = req.id else {
            debug!(method = %req.method, "Notification received");
            return None;
        };
        let id = Some(id);

        let response = match req.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "ping" => MCPResponse::success(id, json!({})),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, req.params).await,
            _ => MCPResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", req.method)),
        };
        Some(response)
    }

    /// Parse and handle one raw JSON-RPC message.
    ///
    /// Returns `None` for notifications. A message that is not a valid
    /// request gets a parse error carrying whatever `id` could be recovered
    /// from it, `null` otherwise.
    pub async fn handle_raw(&self, raw: &[u8]) -> Option<MCPResponse> {
        match serde_json::from_slice::<MCPRequest>(raw) {
            Ok(req) => self.handle(req).await,
            Err(e) => {
                warn!(error = %e, "Parse error");
                let id = serde_json::from_slice::<Value>(raw)
                    .ok()
                    .and_then(|partial| partial.get("id").cloned());
                Some(MCPResponse::error(id, PARSE_ERROR, format!("Parse error: {}", e)))
            }
        }
    }

    /// Handle one line of STDIO input, returning the serialized response.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let response = self.handle_raw(line.as_bytes()).await?;

        match serde_json::to_string(&response) {
            Ok(json) => Some(json),
            Err(e) => {
                error!(error = %e, "Error serializing response");
                None
            }
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> MCPResponse {
        MCPResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": self.state.server_name,
                    "version": self.state.server_version
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Option<Value>) -> MCPResponse {
        MCPResponse::success(id, json!({ "tools": self.registry.definitions() }))
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> MCPResponse {
        let params: ToolCallParams = match params.map(serde_json::from_value::<ToolCallParams>) {
            Some(Ok(p)) => p,
            Some(Err(e)) => return MCPResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e)),
            None => return MCPResponse::error(id, INVALID_PARAMS, "Invalid params"),
        };
        let arguments = params.arguments.unwrap_or_else(|| json!({}));

        match self.registry.call(&params.name, arguments, self.shutdown.clone()).await {
            Ok(result) => MCPResponse::success(id, tool_content(render_text(result), false)),
            Err(ToolError::NotFound(name)) => {
                MCPResponse::error(id, METHOD_NOT_FOUND, format!("Unknown tool: {}", name))
            }
            Err(e) => MCPResponse::success(id, tool_content(format!("Error: {}", e), true)),
        }
    }
}

/// Text shown to the client for a tool result. Strings are passed through
/// unquoted, anything else is serialized as JSON.
fn render_text(result: Value) -> String {
    match result {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn tool_content(text: String, is_error: bool) -> Value {
    json!({
        "content": [
            {
                "type": "text",
                "text": text
            }
        ],
        "isError": is_error
    })
}

/// Health check endpoint handler.
async fn health(server: web::Data<McpServer>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": server.state().server_name
    }))
}

/// Metrics endpoint handler.
async fn metrics_handler(server: web::Data<McpServer>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "requests_total": server.requests_total(),
        "status": "ok"
    }))
}

/// MCP JSON-RPC request handler. Notifications are acknowledged with 202.
///
/// The body is parsed by the dispatcher rather than an extractor so malformed
/// JSON gets a JSON-RPC parse error, as on STDIO.
async fn mcp_handler(server: web::Data<McpServer>, body: web::Bytes) -> HttpResponse {
    match server.handle_raw(&body).await {
        Some(response) => HttpResponse::Ok().json(response),
        None => HttpResponse::Accepted().finish(),
    }
}

/// Register the HTTP routes on an Actix app.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics_handler))
        .route("/mcp", web::post().to(mcp_handler))
        .route("/", web::post().to(mcp_handler))
        .route("/", web::get().to(health));
}

/// Run the MCP server in HTTP mode.
///
/// The server is configured with:
/// - Max connections: 10,000 concurrent connections
/// - Connection rate limit: 1,000 connections per second
/// - Keep-alive and request timeout: 30 seconds
/// - Shutdown timeout: 10 seconds
///
/// # Arguments
/// * `server` - Dispatcher shared with the STDIO transport
/// * `host` - Bind address
/// * `port` - Bind port
/// * `workers` - Number of Actix worker threads
pub async fn run_server_http(
    server: Arc<McpServer>,
    host: String,
    port: u16,
    workers: usize,
) -> std::io::Result<()> {
    let bind_addr = format!("{}:{}", host, port);
    let server = web::Data::from(server);

    info!(
        name = %server.state().server_name,
        version = %server.state().server_version,
        bind = %bind_addr,
        workers,
        "MCP server starting (HTTP mode)"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(server.clone())
            // Enable compression for JSON responses (gzip/brotli)
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            // %r = request line, %s = status, %Dms = duration in milliseconds
            .wrap(Logger::new("%r %s %Dms"))
            .configure(configure_routes)
    })
    .workers(workers)
    .max_connections(10000)
    .max_connection_rate(1000)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}

/// Run the MCP server in STDIO mode.
///
/// Reads JSON-RPC requests line by line from stdin and writes one response
/// line per request to stdout. Logging goes to stderr. Stops at end of input
/// or when shutdown is signalled.
pub async fn run_server_stdio(server: Arc<McpServer>) -> std::io::Result<()> {
    info!(
        name = %server.state().server_name,
        version = %server.state().server_version,
        "MCP server starting (STDIO mode)"
    );

    let mut stdin = BufReader::with_capacity(8192, tokio::io::stdin()).lines();
    let mut stdout = BufWriter::with_capacity(8192, tokio::io::stdout());

    loop {
        let line = tokio::select! {
            _ = cancelled(server.shutdown.clone()) => {
                info!("STDIO transport shutting down");
                break;
            }
            line = stdin.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
        };

        if line.trim().is_empty() {
            continue;
        }

        let Some(response) = server.handle_line(&line).await else {
            continue;
        };

        stdout.write_all(response.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        // Flush after each response so clients are not left waiting
        stdout.flush().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ToolResult;
    use crate::core::registry::{MCPTool, Tool};
    use actix_web::test;
    use async_trait::async_trait;
    use tokio::sync::watch;

    struct Greeter;

    #[async_trait]
    impl Tool for Greeter {
        fn definition(&self) -> MCPTool {
            MCPTool {
                name: "greet".to_string(),
                description: "Greets".to_string(),
                input_schema: json!({ "type": "object", "properties": {} }),
            }
        }

        async fn call(&self, args: Value, _cancel: CancelSignal) -> ToolResult<Value> {
            match args.get("who").and_then(Value::as_str) {
                Some(who) => Ok(Value::String(format!("hi {who}"))),
                None => Err(ToolError::InvalidArguments("who".to_string())),
            }
        }
    }

    fn server() -> (McpServer, watch::Sender<bool>) {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Greeter));
        let (tx, rx) = watch::channel(false);
        let state = AppState {
            server_name: "test-server".to_string(),
            server_version: "9.9.9".to_string(),
        };
        (McpServer::new(state, Arc::new(registry), rx), tx)
    }

    async fn roundtrip(server: &McpServer, request: Value) -> Value {
        let line = server.handle_line(&request.to_string()).await.expect("response");
        serde_json::from_str(&line).unwrap()
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let (server, _tx) = server();
        let resp = roundtrip(&server, json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"})).await;
        assert_eq!(resp["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(resp["result"]["serverInfo"]["name"], "test-server");
        assert_eq!(resp["result"]["serverInfo"]["version"], "9.9.9");
    }

    #[tokio::test]
    async fn tools_list_uses_camel_case_schema() {
        let (server, _tx) = server();
        let resp = roundtrip(&server, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
        let tools = resp["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "greet");
        assert!(tools[0].get("inputSchema").is_some());
    }

    #[tokio::test]
    async fn tools_call_returns_plain_text() {
        let (server, _tx) = server();
        let resp = roundtrip(
            &server,
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
                   "params": {"name": "greet", "arguments": {"who": "there"}}}),
        )
        .await;
        assert_eq!(resp["result"]["content"][0]["text"], "hi there");
        assert_eq!(resp["result"]["isError"], false);
    }

    #[tokio::test]
    async fn tool_failure_is_an_error_result() {
        let (server, _tx) = server();
        let resp = roundtrip(
            &server,
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {"name": "greet"}}),
        )
        .await;
        assert_eq!(resp["result"]["isError"], true);
        assert_eq!(resp["result"]["content"][0]["text"], "Error: Invalid arguments: who");
    }

    #[tokio::test]
    async fn unknown_tool_method_and_params() {
        let (server, _tx) = server();

        let resp = roundtrip(
            &server,
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": {"name": "nope"}}),
        )
        .await;
        assert_eq!(resp["error"]["code"], METHOD_NOT_FOUND);

        let resp = roundtrip(&server, json!({"jsonrpc": "2.0", "id": 6, "method": "resources/list"})).await;
        assert_eq!(resp["error"]["code"], METHOD_NOT_FOUND);

        let resp = roundtrip(&server, json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call"})).await;
        assert_eq!(resp["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let (server, _tx) = server();
        let line = json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string();
        assert!(server.handle_line(&line).await.is_none());
        assert_eq!(server.requests_total(), 1);
    }

    #[tokio::test]
    async fn parse_errors_echo_recoverable_id() {
        let (server, _tx) = server();

        let resp: Value =
            serde_json::from_str(&server.handle_line(r#"{"id": 8, "method": 5}"#).await.unwrap()).unwrap();
        assert_eq!(resp["id"], 8);
        assert_eq!(resp["error"]["code"], PARSE_ERROR);

        let resp: Value =
            serde_json::from_str(&server.handle_line("not json at all").await.unwrap()).unwrap();
        assert_eq!(resp["id"], Value::Null);
        assert_eq!(resp["error"]["code"], PARSE_ERROR);
    }

    #[actix_rt::test]
    async fn http_routes_dispatch_and_report_metrics() {
        let (server, _tx) = server();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(server))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/mcp")
            .set_json(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}))
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["result"], json!({}));

        let req = test::TestRequest::post()
            .uri("/")
            .set_json(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::ACCEPTED);

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let metrics: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(metrics["requests_total"], 2);

        let req = test::TestRequest::get().uri("/health").to_request();
        let health: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(health["service"], "test-server");
    }

    #[actix_rt::test]
    async fn http_malformed_body_is_a_parse_error() {
        let (server, _tx) = server();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(server))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/mcp")
            .insert_header(("content-type", "application/json"))
            .set_payload(r#"{"jsonrpc": "2.0", "id": 11, "method": "#)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["id"], Value::Null);
        assert_eq!(body["error"]["code"], PARSE_ERROR);

        let req = test::TestRequest::post()
            .uri("/mcp")
            .set_payload(r#"{"jsonrpc": "2.0", "id": 12, "method": 7}"#)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["id"], 12);
        assert_eq!(body["error"]["code"], PARSE_ERROR);
    }
}
