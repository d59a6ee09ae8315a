//! `get_viewport_screenshot` tool.
//!
//! The gateway names a temp file, the broker renders into it, and the
//! gateway reads the bytes back, attaches them as an MCP image block, and
//! deletes the file. Clients never see a path - only image content.

use super::{parse_args, McpTool, ToolContext, ToolOutput};
use anyhow::{bail, Context, Result};
use bld_remote_protocol::{commands, encoding};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::warn;
use uuid::Uuid;

pub struct ViewportScreenshotTool;

#[derive(Debug, Deserialize)]
struct ScreenshotArgs {
    /// Longest-side constraint; the broker clamps the ceiling.
    max_size: Option<u32>,

    /// "png" (default) or "jpg".
    format: Option<String>,
}

impl McpTool for ViewportScreenshotTool {
    fn name(&self) -> &'static str {
        "get_viewport_screenshot"
    }

    fn description(&self) -> &'static str {
        "Capture the active viewport and return it as an image attachment"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "max_size": {
                    "type": "integer",
                    "description": "Longest-side pixel constraint (default 800, max 4096)",
                    "minimum": 1
                },
                "format": {
                    "type": "string",
                    "enum": ["png", "jpg"],
                    "default": "png"
                }
            }
        })
    }

    fn execute(&self, args: Value, cx: &ToolContext<'_>) -> Result<ToolOutput> {
        let args: ScreenshotArgs = parse_args(args)?;

        let format = args.format.unwrap_or_else(|| "png".to_string());
        let mime_type = match format.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            other => bail!("unsupported format: {other} (expected png or jpg)"),
        };

        let filepath = temp_capture_path(&format);
        let mut params = json!({
            "filepath": filepath.to_string_lossy(),
            "format": format,
        });
        if let Some(max_size) = args.max_size {
            params["max_size"] = json!(max_size);
        }

        let result = cx.client.call_with_timeout(
            commands::GET_VIEWPORT_SCREENSHOT,
            params,
            cx.config.screenshot_timeout,
        );
        let bytes = result.is_ok().then(|| std::fs::read(&filepath));

        // The broker may have written the file even on a late failure, so
        // cleanup runs on both paths.
        if let Err(e) = std::fs::remove_file(&filepath) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("failed to remove capture file {}: {e}", filepath.display());
            }
        }

        result?;
        let bytes = bytes
            .expect("read attempted on success")
            .with_context(|| format!("capture file missing: {}", filepath.display()))?;

        Ok(ToolOutput::Image {
            data: encoding::encode(&bytes),
            mime_type: mime_type.to_string(),
        })
    }
}

fn temp_capture_path(extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "bld_remote_gateway_shot_{}.{extension}",
        Uuid::new_v4().simple()
    ))
}
