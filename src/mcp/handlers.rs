//! MCP (Model Context Protocol) route handlers
//!
//! JSON-RPC over POST /mcp. Tool discovery is generated from the
//! dispatcher registry; every `tools/call` answers with the uniform
//! response envelope, success or not, so callers only ever branch on
//! `success`. JSON-RPC errors are reserved for protocol problems.

use super::{helpers::*, models::*};
use crate::dispatch::{SharedDispatcher, TOOLS};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Creates routes for MCP-related operations
pub fn routes() -> Router<SharedDispatcher> {
    Router::new()
        .route("/", post(handle_mcp).get(handle_mcp_sse))
        .route("/mcp", post(handle_mcp).get(handle_mcp_sse)) // Standard endpoint
        .route("/mcp/", post(handle_mcp).get(handle_mcp_sse)) // Trailing slash safety
}

/// Handle SSE (Server-Sent Events) handshake for GET requests
async fn handle_mcp_sse() -> impl IntoResponse {
    (
        [("content-type", "text/event-stream")],
        "event: endpoint\ndata: /mcp\n\n",
    )
}

/// Endpoint: POST /mcp
async fn handle_mcp(
    State(dispatcher): State<SharedDispatcher>,
    body: Result<Json<JsonRpcRequest>, axum::extract::rejection::JsonRejection>,
) -> impl IntoResponse {
    let req = match body {
        Ok(Json(r)) => r,
        Err(e) => {
            warn!(error = %e.body_text(), "JSON parse error");
            return (
                StatusCode::BAD_REQUEST,
                Json(rpc_error(Value::Null, -32700, "Parse error")),
            )
                .into_response();
        }
    };

    let id = req.id.unwrap_or(Value::Null);
    let method_name = req.method.as_str();
    let params = req.params.unwrap_or(Value::Null);

    info!(method = method_name, ?id, "MCP call");

    let response_body = match method_name {
        "initialize" => rpc_success(id, handle_initialize()),
        "notifications/initialized" => rpc_success(id, json!({})),
        "tools/list" => rpc_success(id, handle_tools_list()),
        "tools/call" => {
            let tool_name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");
            let args = params.get("arguments").cloned().unwrap_or(Value::Null);
            let envelope = dispatcher.dispatch(tool_name, args);
            rpc_success(id, handle_envelope(envelope))
        }
        "ping" => rpc_success(id, json!({})),
        _ => {
            warn!(method = method_name, "unknown method");
            rpc_error(id, -32601, "Method not found")
        }
    };

    Json(response_body).into_response()
}

/// Handles `initialize` request (Handshake).
fn handle_initialize() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": true }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

/// Handles `tools/list`, generated from the dispatcher registry.
fn handle_tools_list() -> Value {
    let tools: Vec<Value> = TOOLS
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "inputSchema": input_schema(tool),
            })
        })
        .collect();
    json!({ "tools": tools })
}

/// Wraps an operation envelope as MCP tool output: a text rendering for
/// the model plus the envelope itself as structured content.
fn handle_envelope(envelope: crate::dispatch::Envelope) -> Value {
    let summary = match &envelope.error {
        None => format!("Operation {} succeeded.", envelope.operation),
        Some(error) => format!(
            "Operation {} failed ({}): {}",
            envelope.operation, error.kind, error.message
        ),
    };
    let is_error = !envelope.success;
    json!({
        "content": [{ "type": "text", "text": summary }],
        "structuredContent": envelope,
        "isError": is_error,
    })
}
