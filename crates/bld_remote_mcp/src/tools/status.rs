//! `check_connection_status`: synthetic probe against the broker.

use super::{McpTool, ToolContext, ToolOutput};
use anyhow::Result;
use serde_json::{json, Value};

pub struct CheckConnectionStatusTool;

impl McpTool for CheckConnectionStatusTool {
    fn name(&self) -> &'static str {
        "check_connection_status"
    }

    fn description(&self) -> &'static str {
        "Probe the bridge endpoint inside the 3D application and report reachability"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    fn execute(&self, _args: Value, cx: &ToolContext<'_>) -> Result<ToolOutput> {
        // Reachability is the answer here, so probe failures are data,
        // not tool errors.
        let report = match cx.client.probe() {
            Ok(latency) => json!({
                "connected": true,
                "host": cx.client.host(),
                "port": cx.client.port(),
                "latency_ms": latency.as_secs_f64() * 1000.0,
            }),
            Err(e) => json!({
                "connected": false,
                "host": cx.client.host(),
                "port": cx.client.port(),
                "error": e.to_string(),
            }),
        };
        Ok(ToolOutput::Json(report))
    }
}
