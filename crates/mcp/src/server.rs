// MCP server: JSON-RPC dispatch onto the tool registry, plus the stdio transport

use crate::protocol::{
    negotiate_protocol_version, CallToolParams, CallToolResult, InitializeParams,
    InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult,
    ServerCapabilities, ServerInfo, ToolsCapability, JSONRPC_VERSION,
};
use crate::tools::ToolRegistry;
use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

/// Upper bound on a single newline-delimited message
const MAX_MESSAGE_BYTES: usize = 8 * 1024 * 1024;

const INSTRUCTIONS: &str = "Ethereum developer tools: ABI encoding and decoding, function selectors, \
keccak256 hashing, burner wallets, ENS resolution and namehashes.";

pub struct McpServer {
    registry: Arc<ToolRegistry>,
    info: ServerInfo,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            info: ServerInfo {
                name: "ethereum".to_string(),
                title: Some("Ethereum Developer Tools".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run over stdin/stdout until stdin closes
    pub async fn run_stdio(&self) -> Result<()> {
        tracing::info!("MCP server listening on stdio");
        let mut stdout = tokio::io::stdout();
        self.serve(tokio::io::stdin(), &mut stdout).await
    }

    /// Serve newline-delimited JSON-RPC messages from `reader`, writing
    /// responses to `writer`
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_MESSAGE_BYTES));
        let mut sink = FramedWrite::new(writer, LinesCodec::new());

        while let Some(line) = lines.next().await {
            let response = match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_message(&line).await,
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    tracing::warn!("Dropping message larger than {} bytes", MAX_MESSAGE_BYTES);
                    Some(JsonRpcResponse::error(
                        Value::Null,
                        JsonRpcError::parse_error("message too large"),
                    ))
                }
                Err(LinesCodecError::Io(e)) => return Err(e).context("Failed to read message"),
            };

            if let Some(response) = response {
                let encoded =
                    serde_json::to_string(&response).context("Failed to encode response")?;
                sink.send(encoded).await.context("Failed to write response")?;
            }
        }

        tracing::info!("Input closed, shutting down");
        Ok(())
    }

    /// Handle one raw JSON-RPC message; `None` for notifications
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Unparseable message: {}", e);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request(format!("Invalid Request: {}", e)),
            )),
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request(format!(
                    "Unsupported jsonrpc version: {}",
                    request.jsonrpc
                )),
            ));
        }

        tracing::debug!(method = %request.method, "Handling request");

        let outcome = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => self.list_tools(),
            "tools/call" => self.call_tool(request.params).await,
            method => Err(JsonRpcError::method_not_found(method)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => tracing::info!("Client initialized"),
            "notifications/cancelled" => tracing::debug!("Client cancelled a request"),
            method => tracing::debug!("Ignoring notification {}", method),
        }
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = parse_params(params)?;
        let protocol_version = negotiate_protocol_version(&params.protocol_version);

        tracing::info!(
            client = %params.client_info.name,
            client_version = %params.client_info.version,
            protocol_version,
            "Initializing session"
        );

        to_result(&InitializeResult {
            protocol_version: protocol_version.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: self.info.clone(),
            instructions: Some(INSTRUCTIONS.to_string()),
        })
    }

    fn list_tools(&self) -> Result<Value, JsonRpcError> {
        to_result(&ListToolsResult {
            tools: self.registry.list_schemas(),
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = parse_params(params)?;
        let tool = self
            .registry
            .get(&params.name)
            .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)))?;

        let arguments = params
            .arguments
            .unwrap_or_else(|| Value::Object(Default::default()));

        let started = Instant::now();
        let result = match tool.execute(arguments).await {
            Ok(result) => result,
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::warn!(tool = %params.name, error = %message, "Tool call failed");
                CallToolResult::error(message)
            }
        };

        tracing::info!(
            tool = %params.name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            is_error = result.failed(),
            "Tool call finished"
        );

        to_result(&result)
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))
}

fn to_result(value: &impl serde::Serialize) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::CallToolResult;
    use crate::tools::{json_schema_object, Keccak256HashTool, Tool};
    use serde_json::json;

    struct FailingTool;

    #[async_trait::async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &'static str {
            "always-fails"
        }

        fn description(&self) -> String {
            "Fails".to_string()
        }

        fn input_schema(&self) -> Value {
            json_schema_object(json!({}), vec![])
        }

        async fn execute(&self, _arguments: Value) -> Result<CallToolResult> {
            Err(anyhow::anyhow!("inner cause")).context("outer context")
        }
    }

    fn server() -> McpServer {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Keccak256HashTool));
        registry.register(Arc::new(FailingTool));
        McpServer::new(registry)
    }

    async fn call(server: &McpServer, message: Value) -> JsonRpcResponse {
        server
            .handle_message(&message.to_string())
            .await
            .expect("expected a response")
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = call(
            &server(),
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2025-03-26",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "1.0"}
                }
            }),
        )
        .await;

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(result["serverInfo"]["name"], "ethereum");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
    }

    #[tokio::test]
    async fn test_initialize_without_params_is_invalid() {
        let response = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}),
        )
        .await;
        assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tools_list() {
        let response = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": "a", "method": "tools/list"}),
        )
        .await;

        assert_eq!(response.id, json!("a"));
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "always-fails");
        assert_eq!(tools[1]["name"], "keccak256-hash");
        assert!(tools[1]["inputSchema"]["properties"]["value"].is_object());
    }

    #[tokio::test]
    async fn test_tools_call_success() {
        let response = call(
            &server(),
            json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "tools/call",
                "params": {"name": "keccak256-hash", "arguments": {"value": "hello"}}
            }),
        )
        .await;

        let result = response.result.unwrap();
        assert_eq!(
            result["content"][0]["text"],
            "0x1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8"
        );
        assert!(result.get("isError").is_none());
    }

    #[tokio::test]
    async fn test_tools_call_failure_becomes_error_result() {
        let response = call(
            &server(),
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {"name": "always-fails", "arguments": {}}
            }),
        )
        .await;

        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "outer context: inner cause");
    }

    #[tokio::test]
    async fn test_tools_call_bad_arguments_becomes_error_result() {
        let response = call(
            &server(),
            json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": {"name": "keccak256-hash"}
            }),
        )
        .await;

        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("Invalid arguments for keccak256-hash"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_protocol_error() {
        let response = call(
            &server(),
            json!({
                "jsonrpc": "2.0",
                "id": 5,
                "method": "tools/call",
                "params": {"name": "nope", "arguments": {}}
            }),
        )
        .await;

        let error = response.error.unwrap();
        assert_eq!(error.code, JsonRpcError::INVALID_PARAMS);
        assert_eq!(error.message, "Unknown tool: nope");
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 6, "method": "resources/list"}),
        )
        .await;
        assert_eq!(response.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ping() {
        let response = call(&server(), json!({"jsonrpc": "2.0", "id": 7, "method": "ping"})).await;
        assert_eq!(response.result.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_null_id_is_answered() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#)
            .await
            .expect("null id is a request, not a notification");
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.result.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_parse_error() {
        let response = server().handle_message("{not json").await.unwrap();
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.error.unwrap().code, JsonRpcError::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_invalid_request_keeps_id() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":9}"#)
            .await
            .unwrap();
        assert_eq!(response.id, json!(9));
        assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version() {
        let response = call(&server(), json!({"jsonrpc": "1.0", "id": 1, "method": "ping"})).await;
        assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_serve_line_delimited() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"keccak256-hash","arguments":{"value":""}}}"#,
            "\n",
        );
        let mut output = Vec::new();

        server().serve(input.as_bytes(), &mut output).await.unwrap();

        let output = String::from_utf8(output).unwrap();
        let responses: Vec<Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(
            responses[1]["result"]["content"][0]["text"],
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }
}
