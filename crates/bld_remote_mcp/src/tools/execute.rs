//! `execute_code` tool: run Python source on the host.

use super::{parse_args, McpTool, ToolContext, ToolOutput};
use anyhow::Result;
use bld_remote_protocol::{commands, encoding};
use serde::Deserialize;
use serde_json::{json, Value};

pub struct ExecuteCodeTool;

#[derive(Debug, Deserialize)]
struct ExecuteCodeArgs {
    code: String,

    /// `code` is already base64-encoded.
    #[serde(default)]
    code_is_base64: bool,

    /// Ask the broker to base64-encode the stdout echo.
    #[serde(default)]
    return_as_base64: bool,
}

impl McpTool for ExecuteCodeTool {
    fn name(&self) -> &'static str {
        "execute_code"
    }

    fn description(&self) -> &'static str {
        "Execute Python source in the host's persistent namespace; returns captured stdout/stderr"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "Python source to execute"
                },
                "code_is_base64": {
                    "type": "boolean",
                    "description": "Set when `code` is base64-encoded",
                    "default": false
                },
                "return_as_base64": {
                    "type": "boolean",
                    "description": "Base64-encode the stdout echo in the result",
                    "default": false
                }
            },
            "required": ["code"]
        })
    }

    fn execute(&self, args: Value, cx: &ToolContext<'_>) -> Result<ToolOutput> {
        let args: ExecuteCodeArgs = parse_args(args)?;

        // Sources carrying control bytes would need fragile JSON escaping;
        // flip them to base64 transparently.
        let (code, code_is_base64) =
            if !args.code_is_base64 && encoding::needs_base64(&args.code) {
                (encoding::encode(args.code.as_bytes()), true)
            } else {
                (args.code, args.code_is_base64)
            };

        let result = cx.client.call_with_timeout(
            commands::EXECUTE_CODE,
            json!({
                "code": code,
                "code_is_base64": code_is_base64,
                "return_as_base64": args.return_as_base64,
            }),
            cx.config.execute_timeout,
        )?;
        Ok(ToolOutput::Json(result))
    }
}
