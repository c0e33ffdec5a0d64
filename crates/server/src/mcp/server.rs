//! MCP server lifecycle.
//!
//! 1. **Initialisation**: `initialize` request, then the `initialized`
//!    notification.
//! 2. **Operation**: `tools/list` and `tools/call`, answered one at a time.
//! 3. **Shutdown**: end of input.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

use crate::mcp::protocol::{
    parse_message, IncomingMessage, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestId, MCP_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS,
};
use crate::mcp::transport::Transport;
use crate::tools::{self, ToolRouter};

/// Server state in the MCP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialize request.
    AwaitingInit,
    /// Initialize answered, waiting for the initialized notification.
    Initialising,
    /// Ready for normal operation.
    Running,
    /// Input closed.
    ShuttingDown,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServerCapabilities {
    pub tools: ToolCapabilities,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// The PowerPoint MCP server.
pub struct McpServer<R, W> {
    state: ServerState,
    transport: Transport<R, W>,
    tools: ToolRouter,
    protocol_version: Option<String>,
}

impl<R: BufRead, W: Write> McpServer<R, W> {
    pub fn new(transport: Transport<R, W>, tools: ToolRouter) -> Self {
        Self {
            state: ServerState::AwaitingInit,
            transport,
            tools,
            protocol_version: None,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Negotiated protocol version, once initialised.
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    pub fn into_transport(self) -> Transport<R, W> {
        self.transport
    }

    /// Serve requests until the input closes.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub fn run(&mut self) -> io::Result<()> {
        log::info!("MCP server listening on stdio");
        while let Some(line) = self.transport.read_line()? {
            if line.trim().is_empty() {
                continue;
            }
            self.handle_line(&line)?;
        }
        log::info!("Input closed, shutting down");
        self.state = ServerState::ShuttingDown;
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> io::Result<()> {
        log::trace!("<- {}", line);
        match parse_message(line) {
            Ok(IncomingMessage::Request(req)) => self.handle_request(req),
            Ok(IncomingMessage::Notification(notif)) => {
                self.handle_notification(&notif);
                Ok(())
            }
            Err(error) => self.transport.write_error(&error),
        }
    }

    fn handle_request(&mut self, req: JsonRpcRequest) -> io::Result<()> {
        let response = match req.method.as_str() {
            "initialize" => self.handle_initialize(&req),
            "tools/list" => self.handle_tools_list(&req),
            "tools/call" => self.handle_tools_call(&req),
            "ping" => Ok(JsonRpcResponse::success(req.id.clone(), json!({}))),
            _ => Err(JsonRpcError::method_not_found(req.id.clone(), &req.method)),
        };

        match response {
            Ok(resp) => self.transport.write_response(&resp),
            Err(error) => self.transport.write_error(&error),
        }
    }

    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        match notif.method.as_str() {
            "notifications/initialized" if self.state == ServerState::Initialising => {
                log::info!("Client initialised");
                self.state = ServerState::Running;
            }
            method => log::debug!("Ignoring notification {}", method),
        }
    }

    fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        if self.state != ServerState::AwaitingInit {
            return Err(JsonRpcError::invalid_request(
                Some(req.id.clone()),
                "Server already initialised",
            ));
        }

        let params: InitializeParams = params(req, "initialize")?;
        if let Some(client) = &params.client_info {
            log::info!(
                "Initialising for {} {}",
                client.name,
                client.version.as_deref().unwrap_or("")
            );
        }

        let version = if SUPPORTED_PROTOCOL_VERSIONS.contains(&params.protocol_version.as_str()) {
            params.protocol_version
        } else {
            MCP_PROTOCOL_VERSION.to_string()
        };
        self.protocol_version = Some(version.clone());
        self.state = ServerState::Initialising;

        let config = self.tools.config();
        let server_info = ServerInfo {
            name: config.name.clone(),
            version: config.version.clone(),
        };
        let result = json!({
            "protocolVersion": version,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": server_info,
        });
        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    fn handle_tools_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;
        Ok(JsonRpcResponse::success(
            req.id.clone(),
            json!({ "tools": tools::definitions() }),
        ))
    }

    fn handle_tools_call(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;
        let params: ToolCallParams = params(req, "tool call")?;

        let result = self.tools.call(&params.name, params.arguments);
        let value = serde_json::to_value(&result).map_err(|e| {
            log::error!("Failed to serialise tool call result: {}", e);
            JsonRpcError::internal(req.id.clone(), "Internal error: failed to serialise result")
        })?;
        Ok(JsonRpcResponse::success(req.id.clone(), value))
    }

    fn require_running(&self, id: &RequestId) -> Result<(), JsonRpcError> {
        if self.state != ServerState::Running {
            return Err(JsonRpcError::invalid_request(
                Some(id.clone()),
                "Server not initialised",
            ));
        }
        Ok(())
    }
}

fn params<T: serde::de::DeserializeOwned>(
    req: &JsonRpcRequest,
    what: &str,
) -> Result<T, JsonRpcError> {
    let Some(params) = &req.params else {
        return Err(JsonRpcError::invalid_params(
            req.id.clone(),
            format!("Missing {what} params"),
        ));
    };
    serde_json::from_value(params.clone()).map_err(|e| {
        JsonRpcError::invalid_params(req.id.clone(), format!("Invalid {what} params: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use ppt_mcp_core::{UnavailableAdapter, UNAVAILABLE_MESSAGE};
    use ppt_mcp_pptx::PptxAdapter;
    use std::io::Cursor;

    const INITIALIZE: &str = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"1.0"}}}"#;
    const INITIALIZED: &str = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;

    fn run_session(router: ToolRouter, lines: &[String]) -> (ServerState, Vec<Value>) {
        let input = lines.join("\n") + "\n";
        let transport = Transport::new(Cursor::new(input.into_bytes()), Vec::new());
        let mut server = McpServer::new(transport, router);
        server.run().unwrap();
        let state = server.state();

        let (_, output) = server.into_transport().into_parts();
        let responses = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        (state, responses)
    }

    fn pptx_router() -> ToolRouter {
        ToolRouter::new(Box::new(PptxAdapter::new()), ServerConfig::default())
    }

    fn tool_call(id: i64, name: &str, arguments: Value) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments },
        })
        .to_string()
    }

    fn tool_payload(response: &Value) -> Value {
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_full_lifecycle() {
        let lines = vec![
            INITIALIZE.to_string(),
            INITIALIZED.to_string(),
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#.to_string(),
            tool_call(3, "create_presentation", json!({})),
            r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#.to_string(),
        ];
        let (state, responses) = run_session(pptx_router(), &lines);
        assert_eq!(state, ServerState::ShuttingDown);
        assert_eq!(responses.len(), 4);

        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(responses[0]["result"]["serverInfo"]["name"], "powerpoint-mcp");
        assert!(responses[0]["result"]["capabilities"]["tools"].is_object());

        let tools = responses[1]["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 14);
        assert!(tools.iter().any(|t| t["name"] == "add_text_box"));

        assert!(responses[2]["result"].get("isError").is_none());
        let created = tool_payload(&responses[2]);
        assert_eq!(created["name"], "New Presentation");
        assert_eq!(created["slide_count"], 0);

        assert_eq!(responses[3]["id"], "p");
        assert_eq!(responses[3]["result"], json!({}));
    }

    #[test]
    fn test_tools_require_initialisation() {
        let lines = vec![
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#.to_string(),
            INITIALIZE.to_string(),
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#.to_string(),
            INITIALIZE.to_string(),
        ];
        let (_, responses) = run_session(pptx_router(), &lines);
        assert_eq!(responses[0]["error"]["code"], -32600);
        assert_eq!(responses[0]["error"]["message"], "Server not initialised");
        assert!(responses[1]["result"].is_object());
        assert_eq!(responses[2]["error"]["code"], -32600);
        assert_eq!(responses[3]["error"]["message"], "Server already initialised");
    }

    #[test]
    fn test_protocol_errors() {
        let lines = vec![
            "not json".to_string(),
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#.to_string(),
            r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#.to_string(),
            String::new(),
        ];
        let (_, responses) = run_session(pptx_router(), &lines);
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[1]["error"]["code"], -32602);
        assert_eq!(responses[2]["error"]["code"], -32601);
    }

    #[test]
    fn test_unknown_protocol_version_gets_ours() {
        let init = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"1999-01-01"}}"#;
        let transport = Transport::new(Cursor::new(format!("{init}\n").into_bytes()), Vec::new());
        let mut server = McpServer::new(transport, pptx_router());
        server.run().unwrap();
        assert_eq!(server.protocol_version(), Some(MCP_PROTOCOL_VERSION));
    }

    #[test]
    fn test_degraded_session_reports_errors_as_results() {
        let router = ToolRouter::new(Box::new(UnavailableAdapter::new()), ServerConfig::default());
        let lines = vec![
            INITIALIZE.to_string(),
            INITIALIZED.to_string(),
            tool_call(2, "get_presentations", json!({})),
            tool_call(3, "get_slides", json!({ "presentation_id": "abc" })),
            tool_call(4, "get_platform_info", json!({})),
            tool_call(5, "no_such_tool", json!({})),
        ];
        let (_, responses) = run_session(router, &lines);
        assert_eq!(responses.len(), 5);

        for response in &responses[1..3] {
            assert_eq!(response["result"]["isError"], true);
            assert_eq!(tool_payload(response), json!({ "error": UNAVAILABLE_MESSAGE }));
        }

        let info = tool_payload(&responses[3]);
        assert_eq!(info["adapter_type"], "UnavailableAdapter");
        assert_eq!(info["adapter_available"], false);

        assert_eq!(responses[4]["result"]["isError"], true);
        assert_eq!(
            responses[4]["result"]["content"][0]["text"],
            "Unknown tool: no_such_tool"
        );
    }

    #[test]
    fn test_handles_are_scoped_to_one_server() {
        let lines = vec![
            INITIALIZE.to_string(),
            INITIALIZED.to_string(),
            tool_call(2, "create_presentation", json!({})),
        ];
        let (_, responses) = run_session(pptx_router(), &lines);
        let id = tool_payload(&responses[1])["id"].as_str().unwrap().to_string();

        let lines = vec![
            INITIALIZE.to_string(),
            INITIALIZED.to_string(),
            tool_call(2, "get_slides", json!({ "presentation_id": id })),
        ];
        let (_, responses) = run_session(pptx_router(), &lines);
        let payload = tool_payload(&responses[1]);
        assert_eq!(payload["error"], format!("Presentation ID not found: {id}"));
    }
}
