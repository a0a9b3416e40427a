pub mod parking;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sf_parking_core::{Fetch, ParkingError, QueryBuilder};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

pub fn list_tools() -> Vec<ToolDefinition> {
    parking::definitions()
}

/// Dispatch a `tools/call`.
///
/// Upstream failures become an `isError` tool result carrying `{"error": ..}`;
/// bad tool names and arguments are returned as `Err` for the caller to report.
pub fn call_tool(
    name: &str,
    arguments: Value,
    builder: &QueryBuilder,
    fetcher: &dyn Fetch,
) -> Result<Value, ParkingError> {
    match parking::call(name, arguments, builder, fetcher) {
        Ok(data) => Ok(text_result(&data, false)),
        Err(e) if e.is_client_error() => Err(e),
        Err(e) => {
            tracing::warn!(tool = name, error = %e, "tool call failed");
            Ok(text_result(&json!({ "error": e.to_string() }), true))
        }
    }
}

fn text_result(payload: &Value, is_error: bool) -> Value {
    let text = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
    let mut result = json!({
        "content": [{
            "type": "text",
            "text": text
        }]
    });
    if is_error {
        result["isError"] = json!(true);
    }
    result
}
