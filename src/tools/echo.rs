/// Echo Tool Implementation
///
/// Replies with `hello {message}`.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::core::error::{ToolError, ToolResult};
use crate::core::registry::{CancelSignal, MCPTool, Tool, ToolRegistry};

pub const NAME: &str = "echo";

pub struct EchoTool;

/// Register the echo tool with the tool registry.
///
/// # Arguments
/// * `registry` - The tool registry to register with
pub fn register(registry: &mut ToolRegistry) {
    registry.register(Arc::new(EchoTool));
}

/// Echo the message back to the client.
///
/// # Arguments
/// * `message` - The message to echo
///
/// # Returns
/// The message prefixed with `hello `
pub fn echo(message: &str) -> String {
    format!("hello {message}")
}

#[async_trait]
impl Tool for EchoTool {
    fn definition(&self) -> MCPTool {
        MCPTool {
            name: NAME.to_string(),
            description: "Echoes the message back to the client.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "The message to echo"
                    }
                },
                "required": ["message"]
            }),
        }
    }

    async fn call(&self, args: Value, _cancel: CancelSignal) -> ToolResult<Value> {
        let message = args
            .get("message")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArguments("Missing required parameter: message".to_string()))?;

        Ok(Value::String(echo(message)))
    }
}
