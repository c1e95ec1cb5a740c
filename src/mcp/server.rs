//! MCP server over stdio.
//!
//! One JSON-RPC 2.0 request per line on stdin, one response per line on
//! stdout. Requests without an `id` are notifications and get no response.

use super::dispatch::McpMethod;
use crate::mcp::{PromptRegistry, ResourceHandler, ToolContext, ToolRegistry};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::{BufRead, Read, Write};
use std::time::Instant;
use tracing::info_span;

/// Maximum accepted request line, in bytes.
const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024;

/// Protocol version.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name.
const SERVER_NAME: &str = "netbox-mcp";

/// MCP server.
pub struct McpServer {
    tools: ToolRegistry,
    resources: ResourceHandler,
    prompts: PromptRegistry,
}

impl McpServer {
    /// Creates a server from its three registries.
    #[must_use]
    pub const fn new(tools: ToolRegistry, resources: ResourceHandler, prompts: PromptRegistry) -> Self {
        Self {
            tools,
            resources,
            prompts,
        }
    }

    /// Creates a server whose tools and resources share `context`.
    #[must_use]
    pub fn from_context(context: ToolContext) -> Self {
        let resources = ResourceHandler::new(context.cache.clone());
        Self::new(ToolRegistry::new(context), resources, PromptRegistry::new())
    }

    /// Returns the tool registry.
    #[must_use]
    pub const fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Serves process stdin/stdout until stdin closes.
    ///
    /// # Errors
    ///
    /// Returns an error if stdin cannot be read or stdout cannot be written.
    pub fn run_stdio(&self) -> Result<()> {
        let stdin = std::io::stdin();
        self.serve(stdin.lock(), std::io::stdout())
    }

    /// Serves requests from `reader`, writing responses to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing fails.
    pub fn serve<R: BufRead, W: Write>(&self, mut reader: R, mut writer: W) -> Result<()> {
        tracing::info!(server = SERVER_NAME, "MCP server listening on stdio");

        let read_error = |e: std::io::Error| Error::OperationFailed {
            operation: "read_stdin".to_string(),
            cause: e.to_string(),
        };
        // Room for a full-size request plus its line ending.
        let limit = (MAX_REQUEST_BODY_SIZE + 2) as u64;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = (&mut reader)
                .take(limit)
                .read_until(b'\n', &mut buf)
                .map_err(read_error)?;
            if read == 0 {
                break;
            }

            let response = if read as u64 == limit && buf.last() != Some(&b'\n') {
                let skipped = skip_line(&mut reader).map_err(read_error)?;
                Some(too_large(read + skipped))
            } else {
                match std::str::from_utf8(&buf) {
                    Ok(line) if line.trim().is_empty() => continue,
                    Ok(line) => self.handle_request(line.trim_end_matches(['\r', '\n'])),
                    Err(e) => {
                        tracing::warn!(error = %e, "Request is not valid UTF-8");
                        Some(format_error(None, -32700, &format!("Parse error: {e}")))
                    },
                }
            };
            let Some(response) = response else {
                continue;
            };

            writeln!(writer, "{response}").map_err(|e| Error::OperationFailed {
                operation: "write_stdout".to_string(),
                cause: e.to_string(),
            })?;
            writer.flush().map_err(|e| Error::OperationFailed {
                operation: "flush_stdout".to_string(),
                cause: e.to_string(),
            })?;
        }

        tracing::info!("stdin closed, MCP server stopping");
        Ok(())
    }

    /// Handles one JSON-RPC request line.
    ///
    /// Returns `None` for notifications.
    pub fn handle_request(&self, request: &str) -> Option<String> {
        if request.len() > MAX_REQUEST_BODY_SIZE {
            return Some(too_large(request.len()));
        }

        let start = Instant::now();
        let span = info_span!(
            "mcp.request",
            rpc.method = tracing::field::Empty,
            rpc.id = tracing::field::Empty,
            status = tracing::field::Empty
        );
        let _guard = span.enter();

        let parsed: std::result::Result<JsonRpcRequest, _> = serde_json::from_str(request);
        let mut method_label = "parse_error".to_string();
        let mut status_label = "error";

        let response = match parsed {
            Ok(req) => {
                method_label.clone_from(&req.method);
                span.record("rpc.method", method_label.as_str());
                if let Some(id) = &req.id {
                    span.record("rpc.id", id.to_string().as_str());
                }
                tracing::debug!(method = %method_label, "Processing MCP request");

                let result = self.dispatch_method(&req.method, req.params);
                status_label = if result.is_ok() { "success" } else { "error" };
                span.record("status", status_label);

                match req.id {
                    Some(id) => Some(format_response(Some(id), result)),
                    None => {
                        if let Err((code, message)) = result {
                            tracing::debug!(code, error = %message, "Notification failed");
                        }
                        None
                    },
                }
            },
            Err(e) => {
                span.record("status", "parse_error");
                Some(format_error(None, -32700, &format!("Parse error: {e}")))
            },
        };

        metrics::counter!(
            "mcp_requests_total",
            "method" => method_label.clone(),
            "status" => status_label
        )
        .increment(1);
        metrics::histogram!("mcp_request_duration_ms", "method" => method_label)
            .record(start.elapsed().as_secs_f64() * 1000.0);

        response
    }

    fn dispatch_method(&self, method: &str, params: Option<Value>) -> DispatchResult {
        match McpMethod::from(method) {
            McpMethod::Initialize => Ok(handle_initialize()),
            McpMethod::Initialized | McpMethod::Ping => Ok(json!({})),
            McpMethod::ListTools => Ok(self.handle_list_tools()),
            McpMethod::CallTool => self.handle_call_tool(params),
            McpMethod::ListResources => Ok(self.handle_list_resources()),
            McpMethod::ReadResource => self.handle_read_resource(params),
            McpMethod::ListPrompts => Ok(self.handle_list_prompts()),
            McpMethod::GetPrompt => self.handle_get_prompt(params),
            McpMethod::Unknown(name) => Err((-32601, format!("Method not found: {name}"))),
        }
    }

    fn handle_list_tools(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .list_tools()
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect();

        json!({ "tools": tools })
    }

    fn handle_call_tool(&self, params: Option<Value>) -> DispatchResult {
        let params = params.ok_or((-32602, "Missing params".to_string()))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or((-32602, "Missing tool name".to_string()))?;

        let span = info_span!("mcp.tool.call", tool.name = name);
        let _guard = span.enter();
        let start = Instant::now();

        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
        let (result, status_label) = match self.tools.execute(name, arguments) {
            Ok(result) => {
                let status_label = if result.is_error { "error" } else { "success" };
                (
                    json!({ "content": result.content, "isError": result.is_error }),
                    status_label,
                )
            },
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool call rejected");
                (
                    json!({
                        "content": [{ "type": "text", "text": e.to_string() }],
                        "isError": true
                    }),
                    "error",
                )
            },
        };

        let tool_name = name.to_string();
        metrics::counter!(
            "mcp_tool_calls_total",
            "tool" => tool_name.clone(),
            "status" => status_label
        )
        .increment(1);
        if status_label == "error" {
            metrics::counter!("mcp_tool_errors_total", "tool" => tool_name.clone()).increment(1);
        }
        metrics::histogram!("mcp_tool_duration_ms", "tool" => tool_name)
            .record(start.elapsed().as_secs_f64() * 1000.0);

        Ok(result)
    }

    fn handle_list_resources(&self) -> Value {
        let resources: Vec<Value> = self
            .resources
            .list_resources()
            .iter()
            .map(|r| {
                json!({
                    "uri": r.uri,
                    "name": r.name,
                    "description": r.description,
                    "mimeType": r.mime_type
                })
            })
            .collect();

        json!({ "resources": resources })
    }

    fn handle_read_resource(&self, params: Option<Value>) -> DispatchResult {
        let params = params.ok_or((-32602, "Missing params".to_string()))?;
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or((-32602, "Missing resource URI".to_string()))?;

        let span = info_span!("mcp.resource.read", resource.uri = uri);
        let _guard = span.enter();

        match self.resources.get_resource(uri) {
            Ok(content) => Ok(json!({
                "contents": [{
                    "uri": content.uri,
                    "mimeType": content.mime_type,
                    "text": content.text
                }]
            })),
            Err(e) => {
                tracing::warn!(error = %e, "Resource read failed");
                Err((-32603, e.to_string()))
            },
        }
    }

    fn handle_list_prompts(&self) -> Value {
        let prompts: Vec<Value> = self
            .prompts
            .list_prompts()
            .iter()
            .map(|p| {
                json!({
                    "name": p.name,
                    "description": p.description,
                    "arguments": p.arguments.iter().map(|a| {
                        json!({
                            "name": a.name,
                            "description": a.description,
                            "required": a.required
                        })
                    }).collect::<Vec<Value>>()
                })
            })
            .collect();

        json!({ "prompts": prompts })
    }

    fn handle_get_prompt(&self, params: Option<Value>) -> DispatchResult {
        let params = params.ok_or((-32602, "Missing params".to_string()))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or((-32602, "Missing prompt name".to_string()))?;
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        let messages = self
            .prompts
            .get_prompt_messages(name, &arguments)
            .ok_or_else(|| (-32602, format!("Unknown prompt: {name}")))?;
        let messages: Vec<Value> = messages
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content }))
            .collect();

        Ok(json!({ "messages": messages }))
    }
}

fn handle_initialize() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {},
            "resources": {},
            "prompts": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn format_response(id: Option<Value>, result: DispatchResult) -> String {
    match result {
        Ok(value) => {
            let response = JsonRpcResponse {
                jsonrpc: "2.0",
                id,
                result: Some(value),
                error: None,
            };
            serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
        },
        Err((code, message)) => format_error(id, code, &message),
    }
}

fn too_large(size: usize) -> String {
    tracing::warn!(
        request_size = size,
        max_size = MAX_REQUEST_BODY_SIZE,
        "Request exceeds maximum size limit"
    );
    format_error(
        None,
        -32600,
        &format!("Request too large: {size} bytes (max: {MAX_REQUEST_BODY_SIZE} bytes)"),
    )
}

/// Discards the rest of the current line, returning how many bytes it held.
fn skip_line<R: BufRead>(reader: &mut R) -> std::io::Result<usize> {
    let mut skipped = 0;
    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Ok(skipped);
        }
        if let Some(end) = available.iter().position(|&b| b == b'\n') {
            reader.consume(end + 1);
            return Ok(skipped + end + 1);
        }
        let len = available.len();
        reader.consume(len);
        skipped += len;
    }
}

fn format_error(id: Option<Value>, code: i32, message: &str) -> String {
    let response = JsonRpcResponse {
        jsonrpc: "2.0",
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.to_string(),
        }),
    };
    serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
}

/// Result type for method dispatch: a result value or `(code, message)`.
type DispatchResult = std::result::Result<Value, (i32, String)>;

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[serde(rename = "jsonrpc")]
    _jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResourceCache;
    use crate::config::TraceSettings;
    use crate::inventory::{InMemoryInventory, Inventory};

    fn server() -> McpServer {
        let inventory = InMemoryInventory::new();
        inventory.add_device("x", "server");
        inventory.add_device("y", "switch");
        inventory.connect_interfaces(1, ("x", "eth0"), ("y", "eth0"));
        McpServer::from_context(ToolContext {
            inventory: Inventory::new(inventory),
            trace: TraceSettings::default(),
            cache: ResourceCache::new("does-not-exist"),
        })
    }

    fn call(server: &McpServer, request: &str) -> Value {
        let response = server.handle_request(request).unwrap();
        serde_json::from_str(&response).unwrap()
    }

    #[test]
    fn test_handle_initialize() {
        let response = call(
            &server(),
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        );
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], SERVER_NAME);
    }

    #[test]
    fn test_notification_gets_no_response() {
        let server = server();
        assert!(
            server
                .handle_request(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .is_none()
        );
        assert!(
            server
                .handle_request(r#"{"jsonrpc":"2.0","method":"notifications/cancelled"}"#)
                .is_none()
        );
    }

    #[test]
    fn test_handle_list_tools() {
        let response = call(&server(), r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#);
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 16);
        assert!(tools.iter().any(|t| t["name"] == "trace_devices_connection"));
        assert!(tools[0]["inputSchema"].is_object());
    }

    #[test]
    fn test_handle_call_tool() {
        let response = call(
            &server(),
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"trace_devices_connection","arguments":{"source_device":"x","target_device":"y"}}}"#,
        );
        assert_eq!(response["result"]["isError"], false);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();
        assert_eq!(payload["total_hops"], 1);
    }

    #[test]
    fn test_call_unknown_tool_is_tool_error() {
        let response = call(
            &server(),
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"reboot","arguments":{}}}"#,
        );
        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
    }

    #[test]
    fn test_handle_read_missing_resource() {
        let response = call(
            &server(),
            r#"{"jsonrpc":"2.0","id":4,"method":"resources/read","params":{"uri":"netbox://sites"}}"#,
        );
        let text = response["result"]["contents"][0]["text"].as_str().unwrap();
        let document: Value = serde_json::from_str(text).unwrap();
        assert_eq!(document["data"], serde_json::json!([]));
    }

    #[test]
    fn test_handle_read_unknown_resource() {
        let response = call(
            &server(),
            r#"{"jsonrpc":"2.0","id":5,"method":"resources/read","params":{"uri":"netbox://racks"}}"#,
        );
        assert_eq!(response["error"]["code"], -32603);
    }

    #[test]
    fn test_handle_get_prompt() {
        let response = call(
            &server(),
            r#"{"jsonrpc":"2.0","id":6,"method":"prompts/get","params":{"name":"TraceNetworkPath","arguments":{"source_device":"x","destination_device":"y"}}}"#,
        );
        assert_eq!(response["result"]["messages"][0]["role"], "user");

        let unknown = call(
            &server(),
            r#"{"jsonrpc":"2.0","id":7,"method":"prompts/get","params":{"name":"Nope"}}"#,
        );
        assert_eq!(unknown["error"]["code"], -32602);
    }

    #[test]
    fn test_error_codes() {
        let server = server();
        let unknown = call(&server, r#"{"jsonrpc":"2.0","id":1,"method":"unknown/method"}"#);
        assert_eq!(unknown["error"]["code"], -32601);

        let parse = call(&server, "not valid json");
        assert_eq!(parse["error"]["code"], -32700);

        let missing = call(&server, r#"{"jsonrpc":"2.0","id":1,"method":"tools/call"}"#);
        assert_eq!(missing["error"]["code"], -32602);

        let oversized = "x".repeat(MAX_REQUEST_BODY_SIZE + 1);
        assert_eq!(call(&server, &oversized)["error"]["code"], -32600);
    }

    #[test]
    fn test_serve_writes_one_line_per_request() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"prompts/list"}"#,
            "\n",
        );
        let mut output = Vec::new();
        server().serve(input.as_bytes(), &mut output).unwrap();

        let lines: Vec<&str> = std::str::from_utf8(&output).unwrap().lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(r#""id":1"#));
        assert!(lines[1].contains("TraceNetworkPath"));
    }

    #[test]
    fn test_serve_survives_bad_lines() {
        let mut input = b"\xff\xfe not utf-8\n".to_vec();
        input.extend("y".repeat(MAX_REQUEST_BODY_SIZE + 10).as_bytes());
        input.push(b'\n');
        input.extend(br#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#);
        input.push(b'\n');

        let mut output = Vec::new();
        server().serve(input.as_slice(), &mut output).unwrap();

        let responses: Vec<Value> = std::str::from_utf8(&output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[1]["error"]["code"], -32600);
        assert_eq!(responses[2]["id"], 3);
        assert_eq!(responses[2]["result"], json!({}));
    }
}
