//! Persistence-store tools (passthrough to the broker's inline handlers).

use super::{parse_args, McpTool, ToolContext, ToolOutput};
use anyhow::Result;
use bld_remote_protocol::commands;
use serde::Deserialize;
use serde_json::{json, Value};

// ============================================================================
// put_persist_data
// ============================================================================

pub struct PutPersistDataTool;

#[derive(Debug, Deserialize)]
struct PutArgs {
    key: String,
    data: Value,
}

impl McpTool for PutPersistDataTool {
    fn name(&self) -> &'static str {
        "put_persist_data"
    }

    fn description(&self) -> &'static str {
        "Store a JSON value in the host's in-process persistence store"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "key": { "type": "string" },
                "data": {
                    "description": "Any JSON-serializable value"
                }
            },
            "required": ["key", "data"]
        })
    }

    fn execute(&self, args: Value, cx: &ToolContext<'_>) -> Result<ToolOutput> {
        let args: PutArgs = parse_args(args)?;
        let result = cx.client.call(
            commands::PUT_PERSIST_DATA,
            json!({"key": args.key, "data": args.data}),
        )?;
        Ok(ToolOutput::Json(result))
    }
}

// ============================================================================
// get_persist_data
// ============================================================================

pub struct GetPersistDataTool;

#[derive(Debug, Deserialize)]
struct GetArgs {
    key: String,
    #[serde(default)]
    default: Option<Value>,
}

impl McpTool for GetPersistDataTool {
    fn name(&self) -> &'static str {
        "get_persist_data"
    }

    fn description(&self) -> &'static str {
        "Retrieve a value from the persistence store, with an optional default"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "key": { "type": "string" },
                "default": {
                    "description": "Returned when the key is absent"
                }
            },
            "required": ["key"]
        })
    }

    fn execute(&self, args: Value, cx: &ToolContext<'_>) -> Result<ToolOutput> {
        let args: GetArgs = parse_args(args)?;
        let mut params = json!({"key": args.key});
        if let Some(default) = args.default {
            params["default"] = default;
        }
        let result = cx.client.call(commands::GET_PERSIST_DATA, params)?;
        Ok(ToolOutput::Json(result))
    }
}

// ============================================================================
// remove_persist_data
// ============================================================================

pub struct RemovePersistDataTool;

#[derive(Debug, Deserialize)]
struct RemoveArgs {
    key: String,
}

impl McpTool for RemovePersistDataTool {
    fn name(&self) -> &'static str {
        "remove_persist_data"
    }

    fn description(&self) -> &'static str {
        "Delete a key from the persistence store"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "key": { "type": "string" }
            },
            "required": ["key"]
        })
    }

    fn execute(&self, args: Value, cx: &ToolContext<'_>) -> Result<ToolOutput> {
        let args: RemoveArgs = parse_args(args)?;
        let result = cx
            .client
            .call(commands::REMOVE_PERSIST_DATA, json!({"key": args.key}))?;
        Ok(ToolOutput::Json(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_requires_both_fields() {
        assert!(parse_args::<PutArgs>(json!({"key": "k"})).is_err());
        assert!(parse_args::<PutArgs>(json!({"data": 1})).is_err());
        assert!(parse_args::<PutArgs>(json!({"key": "k", "data": null})).is_ok());
    }

    #[test]
    fn test_get_default_is_optional() {
        let args: GetArgs = parse_args(json!({"key": "k"})).unwrap();
        assert!(args.default.is_none());

        let args: GetArgs = parse_args(json!({"key": "k", "default": [1, 2]})).unwrap();
        assert_eq!(args.default, Some(json!([1, 2])));
    }
}
