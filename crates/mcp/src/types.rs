//! JSON-RPC 2.0 and tool protocol types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use glia_runtime::error::GliaError;

/// Protocol revision announced during `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC version string
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    /// Body was not valid JSON
    pub const PARSE_ERROR: Self = Self(-32700);
    /// Not a valid request object
    pub const INVALID_REQUEST: Self = Self(-32600);
    /// Unknown method
    pub const METHOD_NOT_FOUND: Self = Self(-32601);
    /// Bad parameters
    pub const INVALID_PARAMS: Self = Self(-32602);
    /// Server side failure
    pub const INTERNAL_ERROR: Self = Self(-32603);
}

/// Incoming request or notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Must be "2.0"
    pub jsonrpc: String,
    /// Method name
    pub method: String,
    /// Parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Absent for notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl JsonRpcRequest {
    /// Notifications carry no id and get no response
    pub const fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Outgoing response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Result on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Echo of the request id
    pub id: Value,
}

/// Error member of a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Message
    pub message: String,
    /// Extra detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Successful response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id: id.unwrap_or(Value::Null),
        }
    }

    /// Error response
    pub fn error(id: Option<Value>, code: ErrorCode, message: &str) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(JsonRpcError {
                code: code.0,
                message: message.to_string(),
                data: None,
            }),
            id: id.unwrap_or(Value::Null),
        }
    }
}

/// Server name and version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Name
    pub name: String,
    /// Version
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "glia-functions".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Result of `initialize`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResponse {
    /// Negotiated protocol revision
    pub protocol_version: String,
    /// Supported features
    pub capabilities: Value,
    /// Who we are
    pub server_info: ServerInfo,
    /// Usage hints for the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// A tool as listed by `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolMetadata {
    /// Tool name
    pub name: String,
    /// What it does
    pub description: String,
    /// JSON schema of the arguments
    pub input_schema: Value,
}

/// Result of `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsResponse {
    /// Available tools
    pub tools: Vec<ToolMetadata>,
}

/// Parameters of `tools/call`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolRequest {
    /// Tool name
    pub name: String,
    /// Tool arguments
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// One content block of a tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Plain text
    Text {
        /// The text
        text: String,
    },
}

/// Result of `tools/call`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    /// Content blocks
    pub content: Vec<ToolContent>,
    /// Machine readable result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    /// Set when the tool failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolResponse {
    /// Successful result carrying a JSON value
    pub fn json(value: Value) -> Self {
        let text = match &value {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        };
        Self {
            content: vec![ToolContent::Text { text }],
            structured_content: value.is_object().then_some(value),
            is_error: None,
        }
    }

    /// Failed result with a message for the model
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            structured_content: None,
            is_error: Some(true),
        }
    }
}

/// Errors raised by tool handlers
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool with that name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments did not match the schema
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The operation itself failed
    #[error(transparent)]
    Glia(#[from] GliaError),
}

/// Errors of the stdio transport
#[derive(Debug, Error)]
pub enum McpError {
    /// Reading or writing the stream failed
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// A response could not be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
