//! Scene inspection tools (passthrough to the broker).

use super::{parse_args, McpTool, ToolContext, ToolOutput};
use anyhow::Result;
use bld_remote_protocol::commands;
use serde::Deserialize;
use serde_json::{json, Value};

// ============================================================================
// get_scene_info
// ============================================================================

pub struct SceneInfoTool;

impl McpTool for SceneInfoTool {
    fn name(&self) -> &'static str {
        "get_scene_info"
    }

    fn description(&self) -> &'static str {
        "List scene objects with their transforms and visibility"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    fn execute(&self, _args: Value, cx: &ToolContext<'_>) -> Result<ToolOutput> {
        let result = cx.client.call(commands::GET_SCENE_INFO, json!({}))?;
        Ok(ToolOutput::Json(result))
    }
}

// ============================================================================
// get_object_info
// ============================================================================

pub struct ObjectInfoTool;

#[derive(Debug, Deserialize)]
struct ObjectInfoArgs {
    object_name: String,
}

impl McpTool for ObjectInfoTool {
    fn name(&self) -> &'static str {
        "get_object_info"
    }

    fn description(&self) -> &'static str {
        "Detailed dump for one named object (transform, geometry counts, bounds)"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "object_name": {
                    "type": "string",
                    "description": "Name of the object to inspect"
                }
            },
            "required": ["object_name"]
        })
    }

    fn execute(&self, args: Value, cx: &ToolContext<'_>) -> Result<ToolOutput> {
        let args: ObjectInfoArgs = parse_args(args)?;
        let result = cx.client.call(
            commands::GET_OBJECT_INFO,
            json!({"name": args.object_name}),
        )?;
        Ok(ToolOutput::Json(result))
    }
}
