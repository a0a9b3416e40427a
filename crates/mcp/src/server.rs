use serde_json::json;
use sf_parking_core::{Config, Fetch, ParkingClient, QueryBuilder};

use crate::tools::{call_tool, list_tools};
use crate::transport::{
    JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, PARSE_ERROR,
};

const SERVER_NAME: &str = "sf-parking";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

/// The MCP server asks the upstream for geometry unless configured otherwise.
pub const DEFAULT_RETURN_GEOMETRY: bool = true;

pub struct McpServer {
    initialized: bool,
    builder: QueryBuilder,
    fetcher: Box<dyn Fetch>,
}

impl McpServer {
    pub fn new(builder: QueryBuilder, fetcher: Box<dyn Fetch>) -> Self {
        Self {
            initialized: false,
            builder,
            fetcher,
        }
    }

    pub fn from_config(config: &Config) -> sf_parking_core::Result<Self> {
        let client = ParkingClient::from_config(config)?;
        Ok(Self::new(
            config.query_builder(DEFAULT_RETURN_GEOMETRY),
            Box::new(client),
        ))
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn handle_request(&mut self, input: &str) -> Option<String> {
        let request: JsonRpcRequest = match serde_json::from_str(input) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, "unparseable request");
                let resp = JsonRpcResponse::error(None, PARSE_ERROR, "Parse error");
                return Some(encode(&resp));
            }
        };

        if request.jsonrpc != "2.0" {
            let resp = JsonRpcResponse::error(
                request.id,
                INVALID_REQUEST,
                "Invalid request: jsonrpc must be \"2.0\"",
            );
            return Some(encode(&resp));
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(&request),
            "initialized" | "notifications/initialized" => {
                self.initialized = true;
                tracing::info!("client initialized");
                return None;
            }
            "tools/list" => self.handle_tools_list(&request),
            "tools/call" => self.handle_tools_call(&request),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            _ => JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };

        Some(encode(&response))
    }

    fn handle_initialize(&mut self, request: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(
            request.id.clone(),
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": SERVER_VERSION
                }
            }),
        )
    }

    fn handle_tools_list(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let tools = list_tools();
        JsonRpcResponse::success(request.id.clone(), json!({ "tools": tools }))
    }

    fn handle_tools_call(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let params = match &request.params {
            Some(p) => p,
            None => {
                return JsonRpcResponse::error(request.id.clone(), INVALID_PARAMS, "Missing params")
            }
        };

        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        match call_tool(name, arguments, &self.builder, self.fetcher.as_ref()) {
            Ok(result) => JsonRpcResponse::success(request.id.clone(), result),
            Err(e) => JsonRpcResponse::error(request.id.clone(), INVALID_PARAMS, e.to_string()),
        }
    }
}

fn encode(response: &JsonRpcResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": { "code": INTERNAL_ERROR, "message": e.to_string() }
        })
        .to_string()
    })
}
