//! Request dispatch and the stdio transport

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::types::{
    CallToolRequest, ErrorCode, InitializeResponse, JSONRPC_VERSION, JsonRpcRequest,
    JsonRpcResponse, ListToolsResponse, McpError, PROTOCOL_VERSION, ServerInfo, ToolError,
    ToolMetadata, ToolResponse,
};

/// Something that can list and run tools
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Tools offered to clients
    fn list_tools(&self) -> Vec<ToolMetadata>;

    /// Run one tool
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, ToolError>;
}

/// JSON-RPC front end over a [`ToolHandler`]
pub struct McpServer {
    handler: Arc<dyn ToolHandler>,
    info: ServerInfo,
}

impl McpServer {
    /// New server
    pub fn new(handler: Arc<dyn ToolHandler>) -> Self {
        Self {
            handler,
            info: ServerInfo::default(),
        }
    }

    /// Answer one request; notifications yield `None`
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                request.id,
                ErrorCode::INVALID_REQUEST,
                "Unsupported JSON-RPC version",
            ));
        }
        if request.is_notification() {
            tracing::debug!("Notification {}", request.method);
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_list_tools(request),
            "tools/call" => self.handle_call_tool(request).await,
            _ => JsonRpcResponse::error(
                request.id,
                ErrorCode::METHOD_NOT_FOUND,
                &format!("Method '{}' not found", request.method),
            ),
        };
        Some(response)
    }

    /// Parse and answer one line of input
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => Some(JsonRpcResponse::error(
                None,
                ErrorCode::PARSE_ERROR,
                &format!("Invalid JSON-RPC request: {e}"),
            )),
        }
    }

    fn handle_initialize(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let protocol_version = request
            .params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION)
            .to_string();

        let response = InitializeResponse {
            protocol_version,
            capabilities: json!({ "tools": { "listChanged": false } }),
            server_info: self.info.clone(),
            instructions: Some(
                "Manage Glia Functions: create, update, deploy and inspect functions and \
                 use the key-value store. Every tool accepts an optional 'environment' \
                 argument; function-scoped tools default to the selected function."
                    .to_string(),
            ),
        };
        match serde_json::to_value(response) {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(e) => JsonRpcResponse::error(
                request.id,
                ErrorCode::INTERNAL_ERROR,
                &format!("Failed to serialize response: {e}"),
            ),
        }
    }

    fn handle_list_tools(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let response = ListToolsResponse {
            tools: self.handler.list_tools(),
        };
        match serde_json::to_value(response) {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(e) => JsonRpcResponse::error(
                request.id,
                ErrorCode::INTERNAL_ERROR,
                &format!("Failed to serialize response: {e}"),
            ),
        }
    }

    async fn handle_call_tool(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let params: CallToolRequest = match request.params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    request.id,
                    ErrorCode::INVALID_PARAMS,
                    &format!("Invalid params: {e}"),
                );
            }
            None => {
                return JsonRpcResponse::error(
                    request.id,
                    ErrorCode::INVALID_PARAMS,
                    "Invalid params: missing required parameters",
                );
            }
        };

        let arguments = params.arguments.unwrap_or_else(|| json!({}));
        tracing::info!("Calling tool {}", params.name);

        let tool_response = match self.handler.call_tool(&params.name, arguments).await {
            Ok(value) => ToolResponse::json(value),
            Err(ToolError::UnknownTool(name)) => {
                return JsonRpcResponse::error(
                    request.id,
                    ErrorCode::INVALID_PARAMS,
                    &format!("Unknown tool: {name}"),
                );
            }
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", params.name, e);
                ToolResponse::failure(e.to_string())
            }
        };

        match serde_json::to_value(tool_response) {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(e) => JsonRpcResponse::error(
                request.id,
                ErrorCode::INTERNAL_ERROR,
                &format!("Internal error: {e}"),
            ),
        }
    }

    /// Serve newline-delimited JSON-RPC until end of input or cancellation
    pub async fn serve<R, W>(
        &self,
        reader: R,
        mut writer: W,
        cancel: &CancellationToken,
    ) -> Result<(), McpError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        loop {
            let line = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                line = lines.next_line() => line?,
            };
            let Some(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(&line).await {
                let mut encoded = serde_json::to_vec(&response)?;
                encoded.push(b'\n');
                writer.write_all(&encoded).await?;
                writer.flush().await?;
            }
        }
        tracing::info!("Tool server stopped");
        Ok(())
    }
}

/// Serve on the process stdin and stdout
pub async fn serve_stdio(
    handler: Arc<dyn ToolHandler>,
    cancel: &CancellationToken,
) -> Result<(), McpError> {
    let server = McpServer::new(handler);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    server.serve(stdin, tokio::io::stdout(), cancel).await
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
