//! JSON-RPC 2.0 message types used by the MCP stdio transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// Incoming request or notification. Notifications carry no `id` member;
/// an explicit `"id": null` is still a request.
#[derive(Debug, Clone)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    /// Build a request from an already parsed message.
    ///
    /// On failure returns the id to answer with (null when none is known)
    /// together with an `INVALID_REQUEST` error.
    pub fn from_value(value: Value) -> Result<Self, (Value, JsonRpcError)> {
        let Value::Object(mut object) = value else {
            return Err((
                Value::Null,
                JsonRpcError::new(INVALID_REQUEST, "Invalid request: expected a JSON object"),
            ));
        };

        let id = object.remove("id");
        let method = match object.remove("method") {
            Some(Value::String(method)) => method,
            _ => {
                return Err((
                    id.unwrap_or(Value::Null),
                    JsonRpcError::new(INVALID_REQUEST, "Invalid request: missing method"),
                ))
            }
        };

        let jsonrpc = match object.remove("jsonrpc") {
            Some(Value::String(version)) => version,
            _ => String::new(),
        };

        Ok(Self {
            jsonrpc,
            id,
            method,
            params: object.remove("params").unwrap_or(Value::Null),
        })
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Arguments of a `tools/call` request
#[derive(Debug, Clone, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Text block returned from a tool call
#[derive(Debug, Clone, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub content_type: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallToolResult {
    pub content: Vec<TextContent>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl CallToolResult {
    pub fn text(text: String, is_error: bool) -> Self {
        Self {
            content: vec![TextContent {
                content_type: "text",
                text,
            }],
            is_error,
        }
    }
}
