//! Tool Registry - Tool Discovery and Dispatch
//!
//! Maintains the list of available tools and dispatches calls by name.

use super::{
    execute, persist, scene, screenshot, status, McpTool, ToolContext, ToolOutput,
};
use crate::protocol::ToolDefinition;
use anyhow::{anyhow, Result};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Registry of available MCP tools
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn McpTool>>,
}

impl ToolRegistry {
    /// Create a new tool registry with all tools registered
    pub fn new() -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
        };

        registry.register(Box::new(scene::SceneInfoTool));
        registry.register(Box::new(scene::ObjectInfoTool));
        registry.register(Box::new(execute::ExecuteCodeTool));
        registry.register(Box::new(screenshot::ViewportScreenshotTool));
        registry.register(Box::new(persist::PutPersistDataTool));
        registry.register(Box::new(persist::GetPersistDataTool));
        registry.register(Box::new(persist::RemovePersistDataTool));
        registry.register(Box::new(status::CheckConnectionStatusTool));

        debug!(count = registry.tools.len(), "tool registry ready");

        registry
    }

    /// Register a tool
    fn register(&mut self, tool: Box<dyn McpTool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        let mut tools: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.definition()).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Call a tool by name
    pub fn call_tool(
        &self,
        name: &str,
        args: Value,
        cx: &ToolContext<'_>,
    ) -> Result<ToolOutput> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| anyhow!("Unknown tool: {}", name))?;

        tool.execute(args, cx)
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_core_tools() {
        let registry = ToolRegistry::new();

        assert!(registry.has_tool("get_scene_info"));
        assert!(registry.has_tool("get_object_info"));
        assert!(registry.has_tool("execute_code"));
        assert!(registry.has_tool("get_viewport_screenshot"));
        assert!(registry.has_tool("put_persist_data"));
        assert!(registry.has_tool("get_persist_data"));
        assert!(registry.has_tool("remove_persist_data"));
        assert!(registry.has_tool("check_connection_status"));
    }

    #[test]
    fn test_list_tools_is_sorted_and_schematized() {
        let registry = ToolRegistry::new();
        let tools = registry.list_tools();

        assert!(!tools.is_empty());
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);

        for tool in &tools {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
        }
    }
}
