use anyhow::{Context, Result};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

pub mod protocol;

use crate::backend::{BackendResult, TranscriptBackend};
use crate::tools::{self, ToolError};
use protocol::{
    CallToolParams, CallToolResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS,
    INVALID_REQUEST, JSONRPC_VERSION, METHOD_NOT_FOUND, PARSE_ERROR,
};

/// Protocol revision offered when the client does not ask for one
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP server speaking newline-delimited JSON-RPC.
///
/// `make_backend` is called once per tool call; the backend lives only for that call.
pub struct McpServer<F> {
    name: String,
    version: String,
    make_backend: F,
}

impl<F, B> McpServer<F>
where
    F: Fn() -> BackendResult<B>,
    B: TranscriptBackend,
{
    pub fn new(name: impl Into<String>, make_backend: F) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            make_backend,
        }
    }

    /// Serve on the process's stdin and stdout until stdin closes
    pub async fn serve_stdio(&self) -> Result<()> {
        tracing::info!("MCP server '{}' listening on stdio", self.name);
        self.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
    }

    /// Process one message per line from `reader`, writing responses to `writer`
    pub async fn run<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .await
                .context("Failed to read from input")?;
            if read == 0 {
                break;
            }

            while matches!(buf.last(), Some(b'\n' | b'\r')) {
                buf.pop();
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_line(line).await,
                Err(e) => {
                    tracing::warn!("Message is not valid UTF-8: {}", e);
                    Some(JsonRpcResponse::failure(
                        Value::Null,
                        JsonRpcError::new(PARSE_ERROR, format!("Parse error: {}", e)),
                    ))
                }
            };

            if let Some(response) = response {
                let mut out = serde_json::to_string(&response)
                    .context("Failed to serialize response")?;
                out.push('\n');
                writer
                    .write_all(out.as_bytes())
                    .await
                    .context("Failed to write response")?;
                writer.flush().await.context("Failed to flush output")?;
            }
        }

        tracing::info!("Input closed, shutting down");
        Ok(())
    }

    /// Handle a raw line; notifications produce no response
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Unparsable message: {}", e);
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::new(PARSE_ERROR, format!("Parse error: {}", e)),
                ));
            }
        };

        let request = match JsonRpcRequest::from_value(value) {
            Ok(request) => request,
            Err((id, error)) => {
                tracing::warn!("Invalid request: {}", error.message);
                return Some(JsonRpcResponse::failure(id, error));
            }
        };

        self.handle_request(request).await
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!("Notification: {}", request.method);
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(INVALID_REQUEST, "Unsupported jsonrpc version"),
            ));
        }

        tracing::debug!("Request {}: {}", id, request.method);

        Some(match self.dispatch(&request.method, request.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => {
                tracing::warn!("Request {} failed: {}", request.method, error.message);
                JsonRpcResponse::failure(id, error)
            }
        })
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => Ok(self.initialize(&params)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tools::tool_definitions() })),
            "tools/call" => self.call_tool(params).await,
            other => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            )),
        }
    }

    fn initialize(&self, params: &Value) -> Value {
        let protocol_version = params["protocolVersion"]
            .as_str()
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);

        json!({
            "protocolVersion": protocol_version,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": self.name,
                "version": self.version,
            }
        })
    }

    async fn call_tool(&self, params: Value) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("Invalid tools/call params: {}", e)))?;

        let output = tools::call_tool(&self.make_backend, &params.name, params.arguments)
            .await
            .map_err(|e: ToolError| JsonRpcError::new(INVALID_PARAMS, e.to_string()))?;

        serde_json::to_value(CallToolResult::text(output.text, output.is_error))
            .map_err(|e| JsonRpcError::new(protocol::INTERNAL_ERROR, e.to_string()))
    }
}
