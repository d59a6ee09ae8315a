//! MCP tool implementations.
//!
//! Each tool translates one MCP invocation into exactly one broker
//! command (plus, for screenshots, the local file shuffle). Tools are
//! registered in the [`ToolRegistry`] and dispatched by name.

mod execute;
mod persist;
mod registry;
mod scene;
mod screenshot;
mod status;

pub use registry::ToolRegistry;

use crate::client::BrokerClient;
use crate::config::GatewayConfig;
use crate::protocol::ToolDefinition;
use anyhow::Result;
use serde_json::Value;

/// Shared state handed to each tool execution.
pub struct ToolContext<'a> {
    pub client: &'a BrokerClient,
    pub config: &'a GatewayConfig,
}

/// What a tool hands back to the MCP layer.
pub enum ToolOutput {
    /// Structured JSON, rendered as a text content block.
    Json(Value),
    /// An image attachment (base64 data + MIME type).
    Image { data: String, mime_type: String },
}

/// Trait for MCP tools.
///
/// Execution is synchronous; each call owns its one-shot broker
/// connection, so tools are trivially `Send + Sync`.
pub trait McpTool: Send + Sync {
    /// Tool name (e.g., "execute_code")
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool
    fn execute(&self, args: Value, cx: &ToolContext<'_>) -> Result<ToolOutput>;

    /// Get the tool definition for tools/list
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Decode tool arguments, mapping shape mismatches to a caller-readable
/// error before anything hits the wire.
pub(crate) fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| anyhow::anyhow!("invalid tool arguments: {e}"))
}
