use crate::about;
use crate::error::ToolError;
use crate::mcp_server::{ServerInfo, ToolOutput, ToolServer, unknown_tool};
use crate::tool_args::{args_object, required_str};
use serde_json::{Value, json};

/// Minimal server for checking client wiring.
#[derive(Debug, Default)]
pub struct EchoServer;

impl ToolServer for EchoServer {
    fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: "echo_mcp",
            title: "Echo MCP",
            version: about::BIO_MCP_DISPLAY_VERSION,
        }
    }

    fn tool_list(&self) -> Value {
        json!([{
            "name": "echo",
            "title": "Echo",
            "description": "Echo back the input message.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "message": { "type": "string", "description": "Message to echo back" }
                },
                "required": ["message"]
            }
        }])
    }

    fn call_tool(&self, name: &str, arguments: &Value) -> Result<ToolOutput, ToolError> {
        match name {
            "echo" => {
                let args = args_object(arguments)?;
                let message = required_str(&args, "message")?;
                Ok(ToolOutput::text(format!("Echo: {message}")))
            }
            other => Err(unknown_tool(other)),
        }
    }
}
