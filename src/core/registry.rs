/// Tool Registry
///
/// Tools implement the [`Tool`] trait and are registered into a
/// [`ToolRegistry`] built once at startup. The registry is then handed to the
/// transports, which use it for `tools/list` and `tools/call`.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::core::error::{ToolError, ToolResult};

/// Cancellation signal handed to every tool call. Flips to `true` when the
/// server shuts down.
pub type CancelSignal = watch::Receiver<bool>;

/// Resolve once `signal` reports cancellation.
///
/// If the sending side is gone without ever cancelling, this never resolves.
pub async fn cancelled(mut signal: CancelSignal) {
    let sender_gone = signal.wait_for(|cancelled| *cancelled).await.is_err();
    if sender_gone {
        std::future::pending::<()>().await;
    }
}

/// MCP tool definition structure.
///
/// Serialized as-is in `tools/list` responses.
#[derive(Serialize, Debug, Clone)]
pub struct MCPTool {
    /// Unique tool identifier (e.g., "echo")
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema defining the tool's input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// A callable MCP tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Metadata advertised through `tools/list`.
    fn definition(&self) -> MCPTool;

    /// Execute the tool with the client-supplied JSON arguments.
    async fn call(&self, arguments: Value, cancel: CancelSignal) -> ToolResult<Value>;
}

/// Registry of available MCP tools.
///
/// Keeps definitions in registration order for discovery and a map from
/// tool name to implementation for execution.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<MCPTool>,
    handlers: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A later registration under the same name replaces
    /// the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let definition = tool.definition();
        let name = definition.name.clone();
        info!(tool = %name, "Registering tool");

        if self.handlers.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "Tool was already registered, replacing it");
            self.tools.retain(|t| t.name != name);
        }
        self.tools.push(definition);
    }

    /// All tool definitions, in registration order.
    pub fn definitions(&self) -> &[MCPTool] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.handlers.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Call a tool by name.
    #[tracing::instrument(skip(self, arguments, cancel), fields(tool.name = %name))]
    pub async fn call(&self, name: &str, arguments: Value, cancel: CancelSignal) -> ToolResult<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        debug!("Invoking tool");
        let started = std::time::Instant::now();
        let result = tool.call(arguments, cancel).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => info!(elapsed_ms, "Tool call succeeded"),
            Err(e) => warn!(elapsed_ms, error = %e, "Tool call failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Constant(&'static str, &'static str);

    #[async_trait]
    impl Tool for Constant {
        fn definition(&self) -> MCPTool {
            MCPTool {
                name: self.0.to_string(),
                description: "constant".to_string(),
                input_schema: json!({ "type": "object", "properties": {} }),
            }
        }

        async fn call(&self, _arguments: Value, _cancel: CancelSignal) -> ToolResult<Value> {
            Ok(Value::String(self.1.to_string()))
        }
    }

    #[tokio::test]
    async fn calls_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Constant("a", "first")));
        let (_tx, rx) = watch::channel(false);

        let result = registry.call("a", json!({}), rx).await.unwrap();
        assert_eq!(result, json!("first"));
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let registry = ToolRegistry::new();
        let (_tx, rx) = watch::channel(false);

        let err = registry.call("missing", json!({}), rx).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(name) if name == "missing"));
    }

    #[test]
    fn re_registration_replaces_definition() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Constant("a", "first")));
        registry.register(Arc::new(Constant("b", "other")));
        registry.register(Arc::new(Constant("a", "second")));

        let names: Vec<_> = registry.definitions().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn definition_serializes_input_schema_in_camel_case() {
        let value = serde_json::to_value(Constant("a", "x").definition()).unwrap();
        assert!(value.get("inputSchema").is_some());
        assert!(value.get("input_schema").is_none());
    }

    #[tokio::test]
    async fn cancelled_resolves_after_signal() {
        let (tx, rx) = watch::channel(false);
        let waiter = tokio::spawn(cancelled(rx));
        tx.send(true).unwrap();
        waiter.await.unwrap();
    }
}
