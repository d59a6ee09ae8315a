//! MCP Server Implementation
//!
//! JSON-RPC 2.0 server over stdio for the Model Context Protocol.
//!
//! The server runs in a single process, reading JSON-RPC requests from
//! stdin and writing responses to stdout. Every tool call translates into
//! one synchronous broker request; there is no async runtime and no
//! per-call state beyond the one-shot TCP connection.
//!
//! Frames without an `id` are JSON-RPC notifications and never produce a
//! response frame, though their side effects (e.g. the initialized
//! handshake) still run.

use crate::client::BrokerClient;
use crate::config::GatewayConfig;
use crate::protocol::{
    methods, ContentBlock, ErrorCode, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ServerCapabilities, ServerInfo, ToolCallParams,
    ToolCallResult, ToolsCapability, ToolsListResult, JSONRPC_VERSION, MCP_PROTOCOL_VERSION,
};
use crate::tools::{ToolContext, ToolOutput, ToolRegistry};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::io::{BufRead, Write};
use tracing::{debug, error, info};

/// MCP Server fronting the command broker.
pub struct McpServer {
    config: GatewayConfig,
    client: BrokerClient,
    tools: ToolRegistry,
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(config: GatewayConfig) -> Self {
        let client = BrokerClient::from_config(&config);
        Self {
            config,
            client,
            tools: ToolRegistry::new(),
            initialized: false,
        }
    }

    /// Run the server against stdin/stdout (blocking).
    pub fn run(&mut self) -> Result<()> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        let locked_out = stdout.lock();
        self.serve(stdin.lock(), locked_out)
    }

    /// Serve newline-delimited JSON-RPC from `reader` to `writer`.
    ///
    /// Split out from [`run`] so tests can drive the full protocol without
    /// owning the process's standard streams.
    pub fn serve<R: BufRead, W: Write>(&mut self, reader: R, mut writer: W) -> Result<()> {
        let broker = format!("{}:{}", self.config.broker_host, self.config.broker_port);
        info!(broker = %broker, "gateway serving on stdio");

        for line in reader.lines() {
            let line = line.context("stdin read failed")?;
            let frame = line.trim();
            if frame.is_empty() {
                continue;
            }
            debug!(frame = %frame, "frame received");

            let response = match serde_json::from_str::<JsonRpcRequest>(frame) {
                Ok(request) => self.handle_request(request),
                Err(e) => Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::new(
                        ErrorCode::ParseError,
                        format!("request frame is not valid JSON-RPC: {e}"),
                    ),
                )),
            };

            if let Some(response) = response {
                emit_frame(&mut writer, &response)?;
            }
        }

        info!("stdin closed, gateway exiting");
        Ok(())
    }

    /// Process one request. `None` means the frame was a notification and
    /// gets no response.
    pub fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let JsonRpcRequest {
            jsonrpc,
            id,
            method,
            params,
        } = request;

        if jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::new(
                    ErrorCode::InvalidRequest,
                    format!("unsupported JSON-RPC version: {jsonrpc}"),
                ),
            ));
        }

        let is_notification = id.is_none();

        let outcome = match method.as_str() {
            methods::INITIALIZE => self.on_initialize(params),
            // The initialized handshake carries no payload worth acting on.
            methods::INITIALIZED => Ok(Value::Null),
            methods::TOOLS_LIST => self.on_tools_list(),
            methods::TOOLS_CALL => self.on_tools_call(params),
            methods::PING => Ok(Value::Object(Default::default())),
            other => Err(JsonRpcError::new(
                ErrorCode::MethodNotFound,
                format!("no such method: {other}"),
            )),
        };

        if is_notification {
            return None;
        }

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::error(id, e),
        })
    }

    fn on_initialize(&mut self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = decode_params(params)?;

        info!(
            client = %params.client_info.name,
            client_version = %params.client_info.version,
            protocol = %params.protocol_version,
            "client initialized"
        );
        self.initialized = true;

        encode_result(
            "initialize result",
            InitializeResult {
                protocol_version: MCP_PROTOCOL_VERSION.to_string(),
                capabilities: ServerCapabilities {
                    tools: Some(ToolsCapability {
                        list_changed: false,
                    }),
                    resources: None,
                    prompts: None,
                },
                server_info: ServerInfo {
                    name: self.config.server_name.clone(),
                    version: self.config.server_version.clone(),
                },
            },
        )
    }

    fn on_tools_list(&self) -> Result<Value, JsonRpcError> {
        encode_result(
            "tool list",
            ToolsListResult {
                tools: self.tools.list_tools(),
            },
        )
    }

    fn on_tools_call(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        if !self.initialized {
            return Err(JsonRpcError::new(
                ErrorCode::ServerError(-32002),
                "initialize must come first",
            ));
        }

        let params: ToolCallParams = decode_params(params)?;
        info!(tool = %params.name, "dispatching tool call");

        let cx = ToolContext {
            client: &self.client,
            config: &self.config,
        };
        let tool_result = match self.tools.call_tool(&params.name, params.arguments, &cx) {
            Ok(ToolOutput::Json(value)) => {
                let text = serde_json::to_string(&value)
                    .unwrap_or_else(|e| format!("{{\"error\": \"unencodable result: {e}\"}}"));
                ToolCallResult {
                    content: vec![ContentBlock::text(text)],
                    is_error: false,
                }
            }
            Ok(ToolOutput::Image { data, mime_type }) => ToolCallResult {
                content: vec![ContentBlock::image(data, mime_type)],
                is_error: false,
            },
            Err(e) => {
                error!(tool = %params.name, "tool failed: {e:#}");
                ToolCallResult {
                    content: vec![ContentBlock::text(format!("Error: {e}"))],
                    is_error: true,
                }
            }
        };

        encode_result("tool result", tool_result)
    }
}

/// Decode a request's `params` into the handler's argument type.
fn decode_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    let params = params
        .ok_or_else(|| JsonRpcError::new(ErrorCode::InvalidParams, "missing params"))?;
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::new(ErrorCode::InvalidParams, format!("malformed params: {e}")))
}

/// Encode a handler's result payload, downgrading encoder failures to a
/// JSON-RPC internal error instead of panicking mid-stream.
fn encode_result<T: Serialize>(what: &str, value: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| {
        JsonRpcError::new(
            ErrorCode::InternalError,
            format!("could not encode {what}: {e}"),
        )
    })
}

/// One response frame per line, flushed immediately so the client never
/// waits on a buffered reply.
fn emit_frame<W: Write>(writer: &mut W, response: &JsonRpcResponse) -> Result<()> {
    let frame = serde_json::to_string(response).context("response frame failed to encode")?;
    debug!(frame = %frame, "writing response");
    writer.write_all(frame.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush().context("stdout flush failed")
}
